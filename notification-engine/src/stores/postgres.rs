use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{DeviceOwner, NotificationCategory, NotificationPreference};
use crate::stores::{PreferenceStore, UserStore};

const ACTIVE_OWNER_FILTER: &str = r#"
    device_token IS NOT NULL
    AND btrim(device_token) <> ''
    AND onboarding_complete = TRUE
    AND is_deleted = FALSE
    AND is_blocked = FALSE
"#;

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_device_owner(&self, user_id: Uuid) -> Result<Option<DeviceOwner>, StoreError> {
        let query = format!(
            "SELECT id, device_token FROM users WHERE id = $1 AND {ACTIVE_OWNER_FILTER}"
        );

        let owner = sqlx::query_as::<_, DeviceOwner>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    async fn list_device_owners(
        &self,
        user_ids: Option<&[Uuid]>,
    ) -> Result<Vec<DeviceOwner>, StoreError> {
        let query = format!(
            r#"
            SELECT id, device_token
            FROM users
            WHERE {ACTIVE_OWNER_FILTER}
              AND ($1::uuid[] IS NULL OR id = ANY($1))
            "#
        );

        let owners = sqlx::query_as::<_, DeviceOwner>(&query)
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(owners)
    }

    async fn assign_device_token(&self, user_id: Uuid, token: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // One owner per token: release it from any other account first.
        sqlx::query("UPDATE users SET device_token = NULL WHERE device_token = $1 AND id <> $2")
            .bind(token)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET device_token = $1 WHERE id = $2")
            .bind(token)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn clear_device_token(&self, user_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET device_token = NULL WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_device_token_by_value(&self, token: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE users SET device_token = NULL WHERE device_token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

pub struct PgPreferenceStore {
    pool: PgPool,
}

impl PgPreferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PREFERENCE_COLUMNS: &str = "user_id, enabled, post_enabled, notes_enabled, \
     announcement_enabled, connection_enabled, schedule_enabled, updated_at";

#[async_trait]
impl PreferenceStore for PgPreferenceStore {
    async fn eligible_user_ids(
        &self,
        category: NotificationCategory,
    ) -> Result<Vec<Uuid>, StoreError> {
        let query = format!(
            "SELECT user_id FROM notification_preferences WHERE enabled = TRUE AND {} = TRUE",
            category.preference_column()
        );

        let rows: Vec<(Uuid,)> = sqlx::query_as(&query).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn get_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<NotificationPreference>, StoreError> {
        let query = format!(
            "SELECT {PREFERENCE_COLUMNS} FROM notification_preferences WHERE user_id = $1"
        );

        let prefs = sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(prefs)
    }

    async fn upsert_preferences(
        &self,
        prefs: NotificationPreference,
    ) -> Result<NotificationPreference, StoreError> {
        let prefs = prefs.normalized();

        let query = format!(
            r#"
            INSERT INTO notification_preferences (
                user_id, enabled, post_enabled, notes_enabled,
                announcement_enabled, connection_enabled, schedule_enabled, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                enabled = $2,
                post_enabled = $3,
                notes_enabled = $4,
                announcement_enabled = $5,
                connection_enabled = $6,
                schedule_enabled = $7,
                updated_at = NOW()
            RETURNING {PREFERENCE_COLUMNS}
            "#
        );

        let stored = sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(prefs.user_id)
            .bind(prefs.enabled)
            .bind(prefs.post_enabled)
            .bind(prefs.notes_enabled)
            .bind(prefs.announcement_enabled)
            .bind(prefs.connection_enabled)
            .bind(prefs.schedule_enabled)
            .fetch_one(&self.pool)
            .await?;
        Ok(stored)
    }
}
