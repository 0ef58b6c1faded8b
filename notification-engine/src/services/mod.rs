pub mod dispatcher;
pub mod engine;
pub mod recipients;
pub mod reconciler;

pub use dispatcher::BatchDispatcher;
pub use engine::PushEngine;
pub use recipients::RecipientResolver;
pub use reconciler::{is_permanent_token_error, reconcile_chunk};
