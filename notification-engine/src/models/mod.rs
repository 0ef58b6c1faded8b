use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification categories a user can opt in or out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Post,
    Notes,
    Announcement,
    Connection,
    Schedule,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Post => "post",
            NotificationCategory::Notes => "notes",
            NotificationCategory::Announcement => "announcement",
            NotificationCategory::Connection => "connection",
            NotificationCategory::Schedule => "schedule",
        }
    }

    /// Preference column backing this category. Fixed set, never derived
    /// from request input.
    pub(crate) fn preference_column(&self) -> &'static str {
        match self {
            NotificationCategory::Post => "post_enabled",
            NotificationCategory::Notes => "notes_enabled",
            NotificationCategory::Announcement => "announcement_enabled",
            NotificationCategory::Connection => "connection_enabled",
            NotificationCategory::Schedule => "schedule_enabled",
        }
    }
}

/// Per-user notification switches. The master switch wins over every
/// category flag.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationPreference {
    pub user_id: Uuid,
    pub enabled: bool,
    pub post_enabled: bool,
    pub notes_enabled: bool,
    pub announcement_enabled: bool,
    pub connection_enabled: bool,
    pub schedule_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreference {
    /// Everything on, the default for a fresh account.
    pub fn default_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            enabled: true,
            post_enabled: true,
            notes_enabled: true,
            announcement_enabled: true,
            connection_enabled: true,
            schedule_enabled: true,
            updated_at: Utc::now(),
        }
    }

    pub fn allows(&self, category: NotificationCategory) -> bool {
        self.enabled
            && match category {
                NotificationCategory::Post => self.post_enabled,
                NotificationCategory::Notes => self.notes_enabled,
                NotificationCategory::Announcement => self.announcement_enabled,
                NotificationCategory::Connection => self.connection_enabled,
                NotificationCategory::Schedule => self.schedule_enabled,
            }
    }

    /// Applied before persisting: turning the master switch off forces
    /// every category flag off.
    pub fn normalized(mut self) -> Self {
        if !self.enabled {
            self.post_enabled = false;
            self.notes_enabled = false;
            self.announcement_enabled = false;
            self.connection_enabled = false;
            self.schedule_enabled = false;
        }
        self
    }
}

/// A user id paired with its registered device token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeviceOwner {
    pub id: Uuid,
    pub device_token: String,
}

/// Push payload handed to the engine by feature code. `data` values are
/// string-typed because the provider requires it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl PushMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: HashMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Outcome of one chunk of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkOutcome {
    pub index: usize,
    pub size: usize,
    pub sent: usize,
    pub failed: usize,
    /// Set when the chunk failed before any per-token feedback existed.
    pub error: Option<String>,
    /// Tokens the provider reported as permanently dead.
    pub invalid_tokens: Vec<String>,
}

/// Aggregate outcome of a dispatch. Always returned by value.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub success: bool,
    pub error: Option<String>,
    pub original_tokens: usize,
    pub valid_tokens: usize,
    pub total_sent: usize,
    pub total_failed: usize,
    pub cleaned_tokens: usize,
    pub chunks: Vec<ChunkOutcome>,
}

impl DispatchReport {
    /// Nothing to send. Not an error.
    pub fn empty(original_tokens: usize) -> Self {
        Self {
            success: true,
            error: None,
            original_tokens,
            valid_tokens: 0,
            total_sent: 0,
            total_failed: 0,
            cleaned_tokens: 0,
            chunks: Vec::new(),
        }
    }

    /// The batch was rejected before any chunk went out (unconfigured
    /// transport, auth failure, recipient resolution failure).
    pub fn rejected(original_tokens: usize, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            original_tokens,
            valid_tokens: 0,
            total_sent: 0,
            total_failed: 0,
            cleaned_tokens: 0,
            chunks: Vec::new(),
        }
    }
}

/// Outcome of a topic broadcast (legacy transport only).
#[derive(Debug, Clone, Serialize)]
pub struct TopicReport {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_string_forms() {
        assert_eq!(NotificationCategory::Post.as_str(), "post");
        assert_eq!(NotificationCategory::Notes.as_str(), "notes");
        assert_eq!(NotificationCategory::Announcement.as_str(), "announcement");
        assert_eq!(NotificationCategory::Connection.as_str(), "connection");
        assert_eq!(NotificationCategory::Schedule.as_str(), "schedule");
    }

    #[test]
    fn test_eligibility_needs_master_and_category() {
        let mut prefs = NotificationPreference::default_for(Uuid::new_v4());
        assert!(prefs.allows(NotificationCategory::Notes));

        prefs.notes_enabled = false;
        assert!(!prefs.allows(NotificationCategory::Notes));
        assert!(prefs.allows(NotificationCategory::Post));

        prefs.enabled = false;
        assert!(!prefs.allows(NotificationCategory::Post));
    }

    #[test]
    fn test_master_off_forces_category_flags_off() {
        let mut prefs = NotificationPreference::default_for(Uuid::new_v4());
        prefs.enabled = false;
        let normalized = prefs.normalized();

        assert!(!normalized.post_enabled);
        assert!(!normalized.notes_enabled);
        assert!(!normalized.announcement_enabled);
        assert!(!normalized.connection_enabled);
        assert!(!normalized.schedule_enabled);
    }

    #[test]
    fn test_push_message_data_is_string_typed() {
        let message = PushMessage::new("New post", "Photosynthesis recap")
            .with_data("notification_type", "post")
            .with_data("post_id", Uuid::new_v4().to_string());

        assert_eq!(message.data.get("notification_type").unwrap(), "post");
        assert_eq!(message.data.len(), 2);
    }

    #[test]
    fn test_empty_report_is_successful_and_zeroed() {
        let report = DispatchReport::empty(5);
        assert!(report.success);
        assert!(report.error.is_none());
        assert_eq!(report.original_tokens, 5);
        assert_eq!(report.total_sent, 0);
        assert_eq!(report.total_failed, 0);
        assert_eq!(report.cleaned_tokens, 0);
        assert!(report.chunks.is_empty());
    }

    #[test]
    fn test_rejected_report_carries_the_error() {
        let report = DispatchReport::rejected(3, "no usable FCM transport is configured");
        assert!(!report.success);
        assert!(report.error.unwrap().contains("transport"));
    }
}
