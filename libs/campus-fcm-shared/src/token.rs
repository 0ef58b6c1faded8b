use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::FcmError;
use crate::models::{GoogleTokenResponse, JwtClaims, ServiceAccountKey};

const OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL_SECS: i64 = 3600;
/// Refresh this long before the provider-reported expiry.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

/// Issues OAuth2 bearer tokens for the FCM v1 API from a service account.
///
/// The current token is cached and refreshed under one async mutex held
/// across the refresh, so concurrent batches share a single issuance
/// instead of each minting a redundant token.
pub struct AccessTokenIssuer {
    credentials: Arc<ServiceAccountKey>,
    http: reqwest::Client,
    cache: Mutex<Option<CachedToken>>,
}

impl AccessTokenIssuer {
    pub fn new(credentials: Arc<ServiceAccountKey>, http: reqwest::Client) -> Self {
        Self {
            credentials,
            http,
            cache: Mutex::new(None),
        }
    }

    /// Returns a bearer token valid for at least `REFRESH_MARGIN_SECS`.
    pub async fn bearer_token(&self) -> Result<String, FcmError> {
        let mut cache = self.cache.lock().await;
        let now = Utc::now().timestamp();

        if let Some(cached) = cache.as_ref() {
            if cached.expires_at - REFRESH_MARGIN_SECS > now {
                return Ok(cached.access_token.clone());
            }
        }

        let (access_token, expires_in) = self.issue().await?;
        *cache = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: now + expires_in,
        });
        debug!(expires_in, "issued fresh FCM access token");
        Ok(access_token)
    }

    /// One round trip to the token endpoint: signed JWT assertion in,
    /// access token out.
    async fn issue(&self) -> Result<(String, i64), FcmError> {
        let assertion = self.signed_assertion()?;
        let params = [("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())];

        let response = self
            .http
            .post(&self.credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| FcmError::Auth(format!("token endpoint unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FcmError::Auth(format!("token endpoint returned {status}: {body}")));
        }

        let parsed: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| FcmError::Auth(format!("malformed token response: {e}")))?;

        Ok((parsed.access_token, parsed.expires_in))
    }

    fn signed_assertion(&self) -> Result<String, FcmError> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: OAUTH_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| FcmError::Credential(format!("unusable RSA private key: {e}")))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| FcmError::Auth(format!("failed to sign assertion: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_with_garbage_pem() -> Arc<ServiceAccountKey> {
        Arc::new(ServiceAccountKey {
            project_id: "campus-test".to_string(),
            client_email: "push@campus-test.iam.gserviceaccount.com".to_string(),
            private_key: "not a pem".to_string(),
            private_key_id: None,
            client_id: None,
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
        })
    }

    #[tokio::test]
    async fn test_garbage_private_key_is_a_credential_error() {
        let issuer = AccessTokenIssuer::new(key_with_garbage_pem(), reqwest::Client::new());
        let result = issuer.bearer_token().await;
        assert!(matches!(result, Err(FcmError::Credential(_))));
    }
}
