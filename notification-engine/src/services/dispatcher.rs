use std::sync::Arc;

use campus_fcm_shared::{FcmClient, FcmNotification};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::config::DispatchConfig;
use crate::models::{ChunkOutcome, PushMessage};
use crate::services::reconciler;

/// Sends validated tokens in bounded chunks over the resolved transport.
///
/// Chunking bounds the blast radius of a bad chunk and keeps each provider
/// request inside payload-size conventions. Chunk failures are values in the
/// outcome list, never control-flow escapes, so one failing chunk cannot
/// abort its siblings.
pub struct BatchDispatcher {
    client: Arc<FcmClient>,
    chunk_size: usize,
    workers: usize,
}

impl BatchDispatcher {
    pub fn new(client: Arc<FcmClient>, config: &DispatchConfig) -> Self {
        Self {
            client,
            chunk_size: config.chunk_size.max(1),
            workers: config.workers.max(1),
        }
    }

    /// Every token lands in exactly one chunk of at most `chunk_size`.
    pub fn chunk(&self, tokens: &[String]) -> Vec<Vec<String>> {
        tokens
            .chunks(self.chunk_size)
            .map(|chunk| chunk.to_vec())
            .collect()
    }

    pub async fn dispatch(&self, tokens: &[String], message: &PushMessage) -> Vec<ChunkOutcome> {
        if tokens.is_empty() {
            return Vec::new();
        }

        let notification = FcmNotification {
            title: message.title.clone(),
            body: message.body.clone(),
        };
        let chunks = self.chunk(tokens);
        let width = self.workers.min(chunks.len());
        debug!(chunks = chunks.len(), width, "dispatching notification batch");

        let mut outcomes: Vec<ChunkOutcome> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| {
                let client = Arc::clone(&self.client);
                let notification = notification.clone();
                let data = message.data.clone();
                async move {
                    match client.send_chunk(&chunk, &notification, &data).await {
                        Ok(deliveries) => reconciler::reconcile_chunk(index, &deliveries),
                        Err(e) => {
                            warn!(chunk = index, error = %e, "chunk delivery failed");
                            reconciler::failed_chunk(index, chunk.len(), e.to_string())
                        }
                    }
                }
            })
            .buffer_unordered(width)
            .collect()
            .await;

        // Completion order is load-dependent; report in batch order.
        outcomes.sort_by_key(|outcome| outcome.index);
        outcomes
    }
}
