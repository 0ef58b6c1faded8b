use campus_fcm_shared::CredentialConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub fcm: FcmConfig,
    pub dispatch: DispatchConfig,
}

/// Credential inputs that come from app settings rather than the
/// environment. Environment variables still take precedence during
/// transport resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FcmConfig {
    /// Path to a service-account JSON file.
    pub credentials_file: Option<String>,
    pub server_key: Option<String>,
    pub vapid_key: Option<String>,
}

impl FcmConfig {
    pub fn credential_config(&self) -> CredentialConfig {
        CredentialConfig {
            credentials_file: self.credentials_file.clone(),
            server_key: self.server_key.clone(),
            vapid_key: self.vapid_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Tokens per provider request group (default: 10)
    pub chunk_size: usize,
    /// Upper bound on concurrently in-flight chunks (default: 8)
    pub workers: usize,
    /// Outer bound on detached fire-and-forget dispatches, in seconds
    /// (default: 120)
    pub detached_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10,
            workers: 8,
            detached_timeout_secs: 120,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        Ok(EngineConfig {
            fcm: FcmConfig {
                credentials_file: optional_env("FCM_CREDENTIALS_FILE"),
                server_key: optional_env("FCM_SERVER_KEY"),
                vapid_key: optional_env("FCM_VAPID_KEY"),
            },
            dispatch: DispatchConfig {
                chunk_size: std::env::var("PUSH_CHUNK_SIZE")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                workers: std::env::var("PUSH_DISPATCH_WORKERS")
                    .unwrap_or_else(|_| "8".to_string())
                    .parse()?,
                detached_timeout_secs: std::env::var("PUSH_DETACHED_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()?,
            },
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fcm: FcmConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_dispatch_defaults() {
        std::env::remove_var("PUSH_CHUNK_SIZE");
        std::env::remove_var("PUSH_DISPATCH_WORKERS");
        std::env::remove_var("PUSH_DETACHED_TIMEOUT_SECS");

        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.dispatch.chunk_size, 10);
        assert_eq!(config.dispatch.workers, 8);
        assert_eq!(config.dispatch.detached_timeout_secs, 120);
    }

    #[test]
    #[serial]
    fn test_chunk_size_override() {
        std::env::set_var("PUSH_CHUNK_SIZE", "25");
        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.dispatch.chunk_size, 25);
        std::env::remove_var("PUSH_CHUNK_SIZE");
    }
}
