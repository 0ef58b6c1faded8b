/// Campus FCM Shared Library
///
/// This library provides the Firebase Cloud Messaging (FCM) transport layer
/// for push notifications across the Campus platform.
///
/// It handles:
/// - Credential resolution (service account vs. legacy server key)
/// - OAuth2 access-token issuance from a Google service account
/// - Token caching with single-flight refresh
/// - Chunked delivery over the v1 and legacy HTTP APIs
/// - Topic broadcasts (legacy transport)
/// - Syntactic device-token validation

pub mod client;
pub mod credentials;
pub mod errors;
pub mod models;
pub mod token;
pub mod validation;

pub use client::{FcmClient, FcmEndpoints};
pub use credentials::{resolve_transport, CredentialConfig, Transport};
pub use errors::FcmError;
pub use models::{FcmNotification, ServiceAccountKey, TokenDelivery};
pub use token::AccessTokenIssuer;
pub use validation::{filter_plausible, is_plausible_token};
