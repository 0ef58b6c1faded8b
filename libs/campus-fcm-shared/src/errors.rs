use thiserror::Error;

/// FCM Transport Error Types
#[derive(Error, Debug)]
pub enum FcmError {
    /// No service account and no legacy key were resolved. Surfaced only
    /// when a send is attempted, never at construction.
    #[error("no usable FCM transport is configured")]
    Unconfigured,

    #[error("invalid service account credential: {0}")]
    Credential(String),

    #[error("access token issuance failed: {0}")]
    Auth(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("provider rejected request ({status}): {body}")]
    Provider { status: u16, body: String },
}

impl From<reqwest::Error> for FcmError {
    fn from(err: reqwest::Error) -> Self {
        FcmError::Transport(err.to_string())
    }
}
