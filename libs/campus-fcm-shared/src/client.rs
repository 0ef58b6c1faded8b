use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::credentials::Transport;
use crate::errors::FcmError;
use crate::models::*;
use crate::token::AccessTokenIssuer;

pub const DEFAULT_V1_BASE: &str = "https://fcm.googleapis.com/v1";
pub const DEFAULT_LEGACY_URL: &str = "https://fcm.googleapis.com/fcm/send";

/// Hard bound on tail latency for any single provider call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// The v1 schema takes one token per message, so a chunk fans out into this
/// many concurrent requests.
const V1_CHUNK_PARALLELISM: usize = 4;

/// Provider endpoints, overridable for stub servers in tests.
#[derive(Debug, Clone)]
pub struct FcmEndpoints {
    pub v1_base: String,
    pub legacy_url: String,
}

impl Default for FcmEndpoints {
    fn default() -> Self {
        Self {
            v1_base: DEFAULT_V1_BASE.to_string(),
            legacy_url: DEFAULT_LEGACY_URL.to_string(),
        }
    }
}

/// Firebase Cloud Messaging Client
///
/// Speaks the v1 API when a service account is configured and the legacy
/// HTTP API when only a server key is. The transport is picked once at
/// construction, never re-probed per send.
pub struct FcmClient {
    transport: Transport,
    endpoints: FcmEndpoints,
    http: reqwest::Client,
    issuer: Option<AccessTokenIssuer>,
}

impl FcmClient {
    pub fn new(transport: Transport) -> Result<Self, FcmError> {
        Self::with_endpoints(transport, FcmEndpoints::default())
    }

    pub fn with_endpoints(transport: Transport, endpoints: FcmEndpoints) -> Result<Self, FcmError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FcmError::Transport(e.to_string()))?;

        let issuer = match &transport {
            Transport::ServiceAccount(key) => {
                Some(AccessTokenIssuer::new(Arc::new(key.clone()), http.clone()))
            }
            _ => None,
        };

        Ok(Self {
            transport,
            endpoints,
            http,
            issuer,
        })
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Pre-flight for a batch: rejects an unconfigured transport and, on the
    /// v1 path, issues the batch's access token up front so an auth failure
    /// surfaces before any chunk is attempted.
    pub async fn ensure_ready(&self) -> Result<(), FcmError> {
        match &self.transport {
            Transport::Unconfigured => Err(FcmError::Unconfigured),
            Transport::LegacyKey(_) => Ok(()),
            Transport::ServiceAccount(_) => {
                let issuer = self.issuer.as_ref().ok_or(FcmError::Unconfigured)?;
                issuer.bearer_token().await.map(|_| ())
            }
        }
    }

    /// Delivers one chunk of tokens, returning a per-token outcome list.
    ///
    /// An `Err` here means the whole chunk failed before any per-token
    /// feedback existed (network, TLS, non-2xx on the legacy batch call).
    pub async fn send_chunk(
        &self,
        tokens: &[String],
        notification: &FcmNotification,
        data: &HashMap<String, String>,
    ) -> Result<Vec<TokenDelivery>, FcmError> {
        match &self.transport {
            Transport::ServiceAccount(key) => {
                self.send_chunk_v1(key, tokens, notification, data).await
            }
            Transport::LegacyKey(server_key) => {
                self.send_chunk_legacy(server_key, tokens, notification, data).await
            }
            Transport::Unconfigured => Err(FcmError::Unconfigured),
        }
    }

    /// Legacy transport: one POST carries the whole chunk and the response
    /// `results` array lines up with `registration_ids` by index.
    async fn send_chunk_legacy(
        &self,
        server_key: &str,
        tokens: &[String],
        notification: &FcmNotification,
        data: &HashMap<String, String>,
    ) -> Result<Vec<TokenDelivery>, FcmError> {
        let request = LegacySendRequest {
            registration_ids: tokens.to_vec(),
            notification: notification.clone(),
            data: data.clone(),
            priority: "high",
            content_available: true,
        };

        let response = self
            .http
            .post(&self.endpoints.legacy_url)
            .header("Authorization", format!("key={server_key}"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FcmError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: LegacySendResponse = response.json().await.map_err(|e| FcmError::Provider {
            status: status.as_u16(),
            body: format!("malformed response: {e}"),
        })?;

        debug!(
            success = parsed.success,
            failure = parsed.failure,
            "legacy batch delivered"
        );

        let mut deliveries = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            let delivery = match parsed.results.get(i) {
                Some(entry) => TokenDelivery {
                    token: token.clone(),
                    message_id: entry.message_id.clone(),
                    error: entry.error.clone(),
                },
                // A response shorter than the request carries no verdict for
                // the tail; count those as failed, never as invalid.
                None => TokenDelivery {
                    token: token.clone(),
                    message_id: None,
                    error: Some("MissingResult".to_string()),
                },
            };
            deliveries.push(delivery);
        }
        Ok(deliveries)
    }

    /// v1 transport: one request per token, bounded fan-out inside the chunk.
    async fn send_chunk_v1(
        &self,
        key: &ServiceAccountKey,
        tokens: &[String],
        notification: &FcmNotification,
        data: &HashMap<String, String>,
    ) -> Result<Vec<TokenDelivery>, FcmError> {
        let issuer = self.issuer.as_ref().ok_or(FcmError::Unconfigured)?;
        let bearer = issuer.bearer_token().await?;
        let url = format!(
            "{}/projects/{}/messages:send",
            self.endpoints.v1_base, key.project_id
        );

        let deliveries = stream::iter(tokens.iter().cloned())
            .map(|token| self.send_single_v1(&url, &bearer, token, notification, data))
            .buffer_unordered(V1_CHUNK_PARALLELISM)
            .collect::<Vec<_>>()
            .await;

        Ok(deliveries)
    }

    async fn send_single_v1(
        &self,
        url: &str,
        bearer: &str,
        token: String,
        notification: &FcmNotification,
        data: &HashMap<String, String>,
    ) -> TokenDelivery {
        let request = V1SendRequest {
            message: V1Message {
                token: token.clone(),
                notification: notification.clone(),
                data: data.clone(),
                android: V1AndroidConfig { priority: "high" },
            },
        };

        let result = self
            .http
            .post(url)
            .bearer_auth(bearer)
            .json(&request)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<V1SendResponse>().await {
                    Ok(body) => TokenDelivery {
                        token,
                        message_id: body.name,
                        error: None,
                    },
                    Err(e) => TokenDelivery {
                        token,
                        message_id: None,
                        error: Some(format!("MalformedResponse: {e}")),
                    },
                }
            }
            Ok(response) => {
                let status = response.status();
                let code = response
                    .json::<V1ErrorBody>()
                    .await
                    .ok()
                    .and_then(|b| b.error)
                    .and_then(|e| e.status)
                    .unwrap_or_else(|| status.as_u16().to_string());
                TokenDelivery {
                    token,
                    message_id: None,
                    error: Some(code),
                }
            }
            Err(e) => TokenDelivery {
                token,
                message_id: None,
                error: Some(format!("Transport: {e}")),
            },
        }
    }

    /// Topic broadcast over the legacy transport. No per-token feedback
    /// exists on this path, so there is nothing to reconcile.
    pub async fn send_to_topic(
        &self,
        topic: &str,
        notification: &FcmNotification,
        data: &HashMap<String, String>,
    ) -> Result<String, FcmError> {
        let server_key = match &self.transport {
            Transport::LegacyKey(key) => key,
            _ => return Err(FcmError::Unconfigured),
        };

        let request = LegacyTopicRequest {
            to: format!("/topics/{topic}"),
            notification: notification.clone(),
            data: data.clone(),
            priority: "high",
        };

        let response = self
            .http
            .post(&self.endpoints.legacy_url)
            .header("Authorization", format!("key={server_key}"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FcmError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        // The legacy topic response carries a numeric message_id.
        let body: serde_json::Value = response.json().await.map_err(|e| FcmError::Provider {
            status: status.as_u16(),
            body: format!("malformed response: {e}"),
        })?;

        Ok(body
            .get("message_id")
            .map(|id| id.to_string())
            .unwrap_or_default())
    }
}
