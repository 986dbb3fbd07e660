//! Learner profile (read-only from the engines' point of view)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::storage::{self, keys, KeyValueStore};

/// Profile captured during onboarding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    /// Raw age-group label, e.g. "6-7"
    pub age_group: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub avatar: String,
    /// Onboarding fields the engines do not interpret
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl LearnerProfile {
    pub fn new(age_group: &str) -> Self {
        Self {
            age_group: age_group.to_string(),
            ..Default::default()
        }
    }
}

/// Source of the current learner profile
#[async_trait::async_trait]
pub trait ProfileSource: Send + Sync {
    /// `None` when onboarding has not happened yet or the profile is unreadable
    async fn get(&self) -> Option<LearnerProfile>;
}

/// Profile stored under the `user-profile` key
pub struct StoredProfile {
    store: Arc<dyn KeyValueStore>,
}

impl StoredProfile {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write the profile; used by onboarding surfaces, never by the engines
    pub async fn save(&self, profile: &LearnerProfile) -> bool {
        storage::save_logged(self.store.as_ref(), keys::USER_PROFILE, profile).await
    }
}

#[async_trait::async_trait]
impl ProfileSource for StoredProfile {
    async fn get(&self) -> Option<LearnerProfile> {
        match storage::read_json(self.store.as_ref(), keys::USER_PROFILE).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Ignoring unreadable learner profile: {}", e);
                None
            }
        }
    }
}

/// A fixed profile
#[async_trait::async_trait]
impl ProfileSource for LearnerProfile {
    async fn get(&self) -> Option<LearnerProfile> {
        Some(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    #[tokio::test]
    async fn test_stored_profile_roundtrip() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let profiles = StoredProfile::new(store.clone());
        assert!(profiles.get().await.is_none());

        let mut profile = LearnerProfile::new("6-7");
        profile.nickname = "Sam".to_string();
        assert!(profiles.save(&profile).await);
        assert_eq!(profiles.get().await, Some(profile));
    }

    #[tokio::test]
    async fn test_unknown_fields_are_kept() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        store
            .set(keys::USER_PROFILE, r#"{"ageGroup":"8-9","nickname":"Ana","avatar":"fox","favoriteColor":"green"}"#.to_string())
            .await
            .unwrap();

        let profile = StoredProfile::new(store).get().await.unwrap();
        assert_eq!(profile.age_group, "8-9");
        assert_eq!(profile.extra["favoriteColor"], "green");
    }
}
