use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use campus_fcm_shared::{
    filter_plausible, resolve_transport, FcmClient, FcmEndpoints, FcmNotification, Transport,
};
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::metrics;
use crate::models::{DispatchReport, NotificationCategory, PushMessage, TopicReport};
use crate::services::reconciler;
use crate::services::{BatchDispatcher, RecipientResolver};
use crate::stores::{PreferenceStore, UserStore};

/// Push-notification delivery engine.
///
/// Resolves recipients from per-user category preferences, validates and
/// chunks their device tokens, fans the batch out over the configured FCM
/// transport, and purges tokens the provider reports as permanently dead.
///
/// Delivery is best-effort: `send_*` and `notify_*` return a report with
/// every failure inside it. Callers on a request path should prefer the
/// `spawn_*` variants so creating a post never waits on fan-out.
pub struct PushEngine {
    config: EngineConfig,
    client: Arc<FcmClient>,
    dispatcher: BatchDispatcher,
    resolver: RecipientResolver,
    users: Arc<dyn UserStore>,
}

impl PushEngine {
    /// Resolves the transport from the environment and config and wires the
    /// engine against the production endpoints.
    pub fn new(
        config: EngineConfig,
        users: Arc<dyn UserStore>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Result<Self, EngineError> {
        let transport = resolve_transport(&config.fcm.credential_config())?;
        Self::with_transport(config, transport, FcmEndpoints::default(), users, preferences)
    }

    /// Construction seam for an already-resolved transport and non-default
    /// endpoints.
    pub fn with_transport(
        config: EngineConfig,
        transport: Transport,
        endpoints: FcmEndpoints,
        users: Arc<dyn UserStore>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Result<Self, EngineError> {
        info!(transport = transport.kind(), "push engine initialized");
        let client = Arc::new(FcmClient::with_endpoints(transport, endpoints)?);
        let dispatcher = BatchDispatcher::new(Arc::clone(&client), &config.dispatch);
        let resolver = RecipientResolver::new(Arc::clone(&users), preferences);
        Ok(Self {
            config,
            client,
            dispatcher,
            resolver,
            users,
        })
    }

    pub fn transport(&self) -> &Transport {
        self.client.transport()
    }

    /// Sends to an explicit token list: dedup, syntactic validation,
    /// chunked dispatch, reconciliation, cleanup.
    pub async fn send_to_devices(&self, tokens: Vec<String>, message: &PushMessage) -> DispatchReport {
        let started = Instant::now();
        let original_tokens = tokens.len();

        let mut seen = HashSet::new();
        let unique: Vec<String> = tokens
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .filter(|t| seen.insert(t.clone()))
            .collect();
        let valid = filter_plausible(unique);

        if valid.is_empty() {
            return DispatchReport::empty(original_tokens);
        }

        // Unconfigured transport or a broken service account surfaces here,
        // before any chunk goes out.
        if let Err(e) = self.client.ensure_ready().await {
            warn!(error = %e, "push dispatch rejected before send");
            let mut report = DispatchReport::rejected(original_tokens, e.to_string());
            report.valid_tokens = valid.len();
            return report;
        }

        let chunks = self.dispatcher.dispatch(&valid, message).await;
        let cleaned_tokens = reconciler::clean_invalid_tokens(self.users.as_ref(), &chunks).await;

        let total_sent = chunks.iter().map(|c| c.sent).sum();
        let total_failed = chunks.iter().map(|c| c.failed).sum();
        metrics::observe_dispatch(total_sent, total_failed, cleaned_tokens, started.elapsed());

        info!(
            original_tokens,
            valid_tokens = valid.len(),
            total_sent,
            total_failed,
            cleaned_tokens,
            "push dispatch complete"
        );

        DispatchReport {
            success: true,
            error: None,
            original_tokens,
            valid_tokens: valid.len(),
            total_sent,
            total_failed,
            cleaned_tokens,
            chunks,
        }
    }

    pub async fn send_to_device(&self, token: impl Into<String>, message: &PushMessage) -> DispatchReport {
        self.send_to_devices(vec![token.into()], message).await
    }

    /// Topic broadcast over the legacy transport. No per-token feedback
    /// exists on this path, so there is nothing to reconcile or clean.
    pub async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> TopicReport {
        let notification = FcmNotification {
            title: message.title.clone(),
            body: message.body.clone(),
        };
        match self.client.send_to_topic(topic, &notification, &message.data).await {
            Ok(message_id) => TopicReport {
                success: true,
                message_id: Some(message_id),
                error: None,
            },
            Err(e) => {
                warn!(topic, error = %e, "topic broadcast failed");
                TopicReport {
                    success: false,
                    message_id: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Resolves the audience for a category and dispatches to it. The
    /// triggering actor never receives their own action's notification.
    pub async fn notify_category(
        &self,
        category: NotificationCategory,
        message: PushMessage,
        recipients: Option<&[Uuid]>,
        exclude_user_id: Option<Uuid>,
    ) -> DispatchReport {
        let tokens = match self
            .resolver
            .resolve(Some(category), recipients, exclude_user_id)
            .await
        {
            Ok(tokens) => tokens,
            Err(e) => {
                error!(category = category.as_str(), error = %e, "recipient resolution failed");
                return DispatchReport::rejected(0, e.to_string());
            }
        };

        if tokens.is_empty() {
            return DispatchReport::empty(0);
        }
        self.send_to_devices(tokens, &message).await
    }

    fn post_message(post_id: Uuid, title: &str) -> PushMessage {
        PushMessage::new("New post", title)
            .with_data("notification_type", NotificationCategory::Post.as_str())
            .with_data("post_id", post_id.to_string())
    }

    fn notes_message(note_id: Uuid, subject_id: Uuid, title: &str) -> PushMessage {
        PushMessage::new("New notes uploaded", title)
            .with_data("notification_type", NotificationCategory::Notes.as_str())
            .with_data("note_id", note_id.to_string())
            .with_data("subject_id", subject_id.to_string())
    }

    pub async fn notify_new_post(&self, actor_id: Uuid, post_id: Uuid, title: &str) -> DispatchReport {
        self.notify_category(
            NotificationCategory::Post,
            Self::post_message(post_id, title),
            None,
            Some(actor_id),
        )
        .await
    }

    pub async fn notify_new_notes(
        &self,
        uploader_id: Uuid,
        note_id: Uuid,
        subject_id: Uuid,
        title: &str,
    ) -> DispatchReport {
        self.notify_category(
            NotificationCategory::Notes,
            Self::notes_message(note_id, subject_id, title),
            None,
            Some(uploader_id),
        )
        .await
    }

    pub async fn notify_announcement(&self, author_id: Uuid, title: &str, body: &str) -> DispatchReport {
        let message = PushMessage::new(title, body).with_data(
            "notification_type",
            NotificationCategory::Announcement.as_str(),
        );
        self.notify_category(
            NotificationCategory::Announcement,
            message,
            None,
            Some(author_id),
        )
        .await
    }

    /// Connection events target one user rather than the whole category
    /// audience.
    pub async fn notify_connection_accepted(
        &self,
        actor_id: Uuid,
        recipient_id: Uuid,
        actor_name: &str,
    ) -> DispatchReport {
        let message = PushMessage::new(
            "Connection accepted",
            format!("{actor_name} accepted your connection request"),
        )
        .with_data(
            "notification_type",
            NotificationCategory::Connection.as_str(),
        );
        self.notify_category(
            NotificationCategory::Connection,
            message,
            Some(&[recipient_id]),
            Some(actor_id),
        )
        .await
    }

    pub async fn notify_schedule_change(
        &self,
        editor_id: Uuid,
        subject_id: Uuid,
        subject_name: &str,
    ) -> DispatchReport {
        let message = PushMessage::new(
            "Schedule updated",
            format!("The schedule for {subject_name} has changed"),
        )
        .with_data("notification_type", NotificationCategory::Schedule.as_str())
        .with_data("subject_id", subject_id.to_string());
        self.notify_category(NotificationCategory::Schedule, message, None, Some(editor_id))
            .await
    }

    /// Detached dispatch for request-path callers: the primary operation
    /// (creating a post, uploading notes) returns immediately while fan-out
    /// runs under its own bounded timeout.
    pub fn spawn_notify_category(
        self: &Arc<Self>,
        category: NotificationCategory,
        message: PushMessage,
        recipients: Option<Vec<Uuid>>,
        exclude_user_id: Option<Uuid>,
    ) {
        let engine = Arc::clone(self);
        let deadline = Duration::from_secs(self.config.dispatch.detached_timeout_secs);
        tokio::spawn(async move {
            let dispatch =
                engine.notify_category(category, message, recipients.as_deref(), exclude_user_id);
            match timeout(deadline, dispatch).await {
                Ok(report) if !report.success => {
                    warn!(
                        category = category.as_str(),
                        error = report.error.as_deref().unwrap_or("unknown"),
                        "detached dispatch reported failure"
                    );
                }
                Ok(_) => {}
                Err(_) => warn!(category = category.as_str(), "detached dispatch timed out"),
            }
        });
    }

    pub fn spawn_notify_new_post(self: &Arc<Self>, actor_id: Uuid, post_id: Uuid, title: &str) {
        self.spawn_notify_category(
            NotificationCategory::Post,
            Self::post_message(post_id, title),
            None,
            Some(actor_id),
        );
    }

    pub fn spawn_notify_new_notes(
        self: &Arc<Self>,
        uploader_id: Uuid,
        note_id: Uuid,
        subject_id: Uuid,
        title: &str,
    ) {
        self.spawn_notify_category(
            NotificationCategory::Notes,
            Self::notes_message(note_id, subject_id, title),
            None,
            Some(uploader_id),
        );
    }
}
