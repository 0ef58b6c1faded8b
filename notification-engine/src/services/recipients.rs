use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::NotificationCategory;
use crate::stores::{PreferenceStore, UserStore};

/// Turns a notification category into the deduplicated set of device tokens
/// that should receive it.
pub struct RecipientResolver {
    users: Arc<dyn UserStore>,
    preferences: Arc<dyn PreferenceStore>,
}

impl RecipientResolver {
    pub fn new(users: Arc<dyn UserStore>, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self { users, preferences }
    }

    /// Without a category, every active device token qualifies (optionally
    /// restricted to `explicit_user_ids`). With one, the audience is the
    /// preference store's eligible set, intersected with the explicit ids
    /// when given. The excluded actor never receives their own action's
    /// notification.
    pub async fn resolve(
        &self,
        category: Option<NotificationCategory>,
        explicit_user_ids: Option<&[Uuid]>,
        exclude_user_id: Option<Uuid>,
    ) -> Result<Vec<String>, StoreError> {
        let owners = match category {
            None => self.users.list_device_owners(explicit_user_ids).await?,
            Some(category) => {
                let mut eligible = self.preferences.eligible_user_ids(category).await?;
                if let Some(explicit) = explicit_user_ids {
                    let wanted: HashSet<Uuid> = explicit.iter().copied().collect();
                    eligible.retain(|id| wanted.contains(id));
                }
                if eligible.is_empty() {
                    debug!(category = category.as_str(), "no eligible recipients");
                    return Ok(Vec::new());
                }
                // Account eligibility is re-checked here; a stale preference
                // row must not resurrect a deleted or blocked user.
                self.users.list_device_owners(Some(&eligible)).await?
            }
        };

        let mut seen = HashSet::new();
        let mut tokens = Vec::with_capacity(owners.len());
        for owner in owners {
            if exclude_user_id == Some(owner.id) {
                continue;
            }
            let token = owner.device_token.trim();
            if token.is_empty() {
                continue;
            }
            if seen.insert(token.to_string()) {
                tokens.push(token.to_string());
            }
        }
        Ok(tokens)
    }
}
