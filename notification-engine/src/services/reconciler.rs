use std::collections::HashSet;

use campus_fcm_shared::TokenDelivery;
use tracing::{info, warn};

use crate::models::ChunkOutcome;
use crate::stores::UserStore;

/// Provider error codes that mean the token will never work again.
/// Everything else (quota, unavailable, internal) is transient and must
/// never trigger cleanup.
const PERMANENT_TOKEN_ERRORS: &[&str] = &[
    // legacy HTTP API
    "NotRegistered",
    "InvalidRegistration",
    "MismatchSenderId",
    "InvalidToken",
    // v1 API
    "UNREGISTERED",
    "NOT_FOUND",
];

pub fn is_permanent_token_error(code: &str) -> bool {
    PERMANENT_TOKEN_ERRORS.iter().any(|known| code == *known)
}

/// Collapses per-token deliveries into a chunk outcome, separating
/// permanently dead tokens from transient failures.
pub fn reconcile_chunk(index: usize, deliveries: &[TokenDelivery]) -> ChunkOutcome {
    let mut sent = 0;
    let mut failed = 0;
    let mut invalid_tokens = Vec::new();

    for delivery in deliveries {
        match &delivery.error {
            None => sent += 1,
            Some(code) => {
                failed += 1;
                if is_permanent_token_error(code) {
                    invalid_tokens.push(delivery.token.clone());
                }
            }
        }
    }

    ChunkOutcome {
        index,
        size: deliveries.len(),
        sent,
        failed,
        error: None,
        invalid_tokens,
    }
}

/// A chunk that never produced per-token feedback: every token counts as
/// failed, none as invalid.
pub fn failed_chunk(index: usize, size: usize, error: String) -> ChunkOutcome {
    ChunkOutcome {
        index,
        size,
        sent: 0,
        failed: size,
        error: Some(error),
        invalid_tokens: Vec::new(),
    }
}

/// Clears permanently-invalid tokens from the user store, deduplicated
/// across chunks. Errors are logged and swallowed; a lost cleanup never
/// fails the dispatch. Returns the number of tokens cleared.
pub async fn clean_invalid_tokens(users: &dyn UserStore, chunks: &[ChunkOutcome]) -> usize {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for chunk in chunks {
        for token in &chunk.invalid_tokens {
            if seen.insert(token.as_str()) {
                unique.push(token.as_str());
            }
        }
    }

    let mut cleaned = 0;
    for token in unique {
        match users.clear_device_token_by_value(token).await {
            Ok(rows) => {
                cleaned += 1;
                info!(rows, "cleared dead device token");
            }
            Err(e) => warn!(error = %e, "failed to clear dead device token"),
        }
    }
    cleaned
}
