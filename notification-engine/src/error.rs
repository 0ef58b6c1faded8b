use campus_fcm_shared::FcmError;
use thiserror::Error;

/// Failures from the user/preference store collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Other(String),
}

/// Engine-level error type. Public entry points never let these escape into
/// feature code; they land in the returned report instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Fcm(#[from] FcmError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
