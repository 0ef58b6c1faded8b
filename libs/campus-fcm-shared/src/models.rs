use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Firebase Service Account Key
///
/// Subset of the Google JSON key file. `token_uri` defaults to the public
/// OAuth2 endpoint so stub servers can be substituted in tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

pub(crate) fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// JWT Claims for the Google OAuth2 assertion
#[derive(Debug, Serialize)]
pub struct JwtClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Google OAuth2 Token Response
#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Notification payload shared by both transports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,
}

/// Legacy HTTP API request (multi-token)
#[derive(Debug, Serialize)]
pub struct LegacySendRequest {
    pub registration_ids: Vec<String>,
    pub notification: FcmNotification,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,
    pub priority: &'static str,
    pub content_available: bool,
}

/// Legacy topic broadcast request
#[derive(Debug, Serialize)]
pub struct LegacyTopicRequest {
    pub to: String,
    pub notification: FcmNotification,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,
    pub priority: &'static str,
}

/// Legacy HTTP API response, one `results` entry per registration id
#[derive(Debug, Deserialize)]
pub struct LegacySendResponse {
    #[serde(default)]
    pub success: i64,
    #[serde(default)]
    pub failure: i64,
    #[serde(default)]
    pub results: Vec<LegacyResult>,
}

#[derive(Debug, Deserialize)]
pub struct LegacyResult {
    pub message_id: Option<String>,
    pub error: Option<String>,
}

/// FCM v1 API request (single token per message)
#[derive(Debug, Serialize)]
pub struct V1SendRequest {
    pub message: V1Message,
}

#[derive(Debug, Serialize)]
pub struct V1Message {
    pub token: String,
    pub notification: FcmNotification,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,
    pub android: V1AndroidConfig,
}

#[derive(Debug, Serialize)]
pub struct V1AndroidConfig {
    pub priority: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct V1SendResponse {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct V1ErrorBody {
    pub error: Option<V1ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct V1ErrorDetail {
    pub code: Option<i64>,
    pub status: Option<String>,
    pub message: Option<String>,
}

/// Outcome of delivery to a single device token
///
/// `error` carries the provider error code when delivery failed; a `None`
/// error is a success regardless of whether the provider echoed an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDelivery {
    pub token: String,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl TokenDelivery {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}
