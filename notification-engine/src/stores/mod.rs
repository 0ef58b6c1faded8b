use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{DeviceOwner, NotificationCategory, NotificationPreference};

pub mod postgres;

pub use postgres::{PgPreferenceStore, PgUserStore};

/// Read/write access to user rows, restricted to what push delivery needs.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// The user's device token, if the account is active and holds one.
    async fn find_device_owner(&self, user_id: Uuid) -> Result<Option<DeviceOwner>, StoreError>;

    /// Users holding a device token, filtered to active accounts
    /// (onboarding complete, not deleted, not blocked). `user_ids` narrows
    /// the result when given.
    async fn list_device_owners(
        &self,
        user_ids: Option<&[Uuid]>,
    ) -> Result<Vec<DeviceOwner>, StoreError>;

    /// Registers a token for `user_id`, releasing it from any other account
    /// first. A token belongs to at most one user at a time.
    async fn assign_device_token(&self, user_id: Uuid, token: &str) -> Result<(), StoreError>;

    /// Clears on logout, account deletion, or blocking.
    async fn clear_device_token(&self, user_id: Uuid) -> Result<(), StoreError>;

    /// Clears the token wherever it appears. Provider feedback carries only
    /// the token value, not the owning user id. Returns cleared row count.
    async fn clear_device_token_by_value(&self, token: &str) -> Result<u64, StoreError>;
}

/// Read/write access to per-user notification preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// User ids with the master switch and the category flag both on.
    async fn eligible_user_ids(
        &self,
        category: NotificationCategory,
    ) -> Result<Vec<Uuid>, StoreError>;

    async fn get_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<NotificationPreference>, StoreError>;

    /// Persists preferences after master-off normalization.
    async fn upsert_preferences(
        &self,
        prefs: NotificationPreference,
    ) -> Result<NotificationPreference, StoreError>;
}
