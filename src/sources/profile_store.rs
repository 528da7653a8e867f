use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use fjall::Keyspace;
use tokio::sync::RwLock;
use tokio::task;

use super::ProfileStore;
use crate::error::AirwatchError;
use crate::models::{ProfileUpdate, UserHealthProfile};

const DEPENDENCY: &str = "profile store";

/// Profiles kept for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, UserHealthProfile>>,
}

impl MemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, user_id: &str) -> crate::Result<Option<UserHealthProfile>> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn put(&self, profile: UserHealthProfile) -> crate::Result<()> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile);
        Ok(())
    }

    /// Read, apply and store under one write guard
    async fn apply_update(&self, update: &ProfileUpdate) -> crate::Result<UserHealthProfile> {
        let mut profiles = self.profiles.write().await;
        let current = profiles
            .get(&update.user_id)
            .cloned()
            .unwrap_or_else(|| UserHealthProfile::new(&update.user_id));
        let updated = current.apply(update)?;
        profiles.insert(updated.user_id.clone(), updated.clone());
        Ok(updated)
    }
}

/// Profiles persisted in a fjall keyspace, postcard encoded
pub struct FjallProfileStore {
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn unavailable(error: impl std::fmt::Display) -> AirwatchError {
    tracing::warn!(%error, "Profile store operation failed");
    AirwatchError::dependency(DEPENDENCY, error.to_string())
}

impl FjallProfileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("profiles", fjall::KeyspaceCreateOptions::default)?;
        tracing::info!(path = %path.as_ref().display(), "Opened profile store");
        Ok(FjallProfileStore { store: items })
    }
}

#[async_trait]
impl ProfileStore for FjallProfileStore {
    #[tracing::instrument(name = "query_profile", level = "debug", skip(self))]
    async fn get(&self, user_id: &str) -> crate::Result<Option<UserHealthProfile>> {
        let store = self.store.clone();
        let key = user_id.as_bytes().to_vec();

        let maybe_bytes = task::spawn_blocking(move || get_from_store(store, key))
            .await
            .map_err(unavailable)?
            .map_err(unavailable)?;

        match maybe_bytes {
            Some(bytes) => {
                tracing::debug!("Profile found");
                let profile = postcard::from_bytes(&bytes).map_err(unavailable)?;
                Ok(Some(profile))
            }
            None => {
                tracing::debug!("Profile not found");
                Ok(None)
            }
        }
    }

    #[tracing::instrument(name = "put_profile", level = "debug", skip(self, profile), fields(user = %profile.user_id))]
    async fn put(&self, profile: UserHealthProfile) -> crate::Result<()> {
        let store = self.store.clone();
        let key = profile.user_id.as_bytes().to_vec();
        let bytes = postcard::to_stdvec(&profile).map_err(unavailable)?;

        task::spawn_blocking(move || store.insert(key, bytes))
            .await
            .map_err(unavailable)?
            .map_err(unavailable)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgeGroup;
    use std::sync::Arc;

    fn update(user_id: &str) -> ProfileUpdate {
        ProfileUpdate {
            user_id: user_id.to_string(),
            has_asthma: true,
            is_pregnant: false,
            age_group: "elderly".to_string(),
            sensitivity_score: Some(1.5),
        }
    }

    #[tokio::test]
    async fn test_memory_store_defaults_and_updates() {
        let store = MemoryProfileStore::new();
        assert!(store.get("u-1").await.unwrap().is_none());

        let default = store.profile_or_default("u-1").await.unwrap();
        assert_eq!(default.sensitivity, 1.0);

        let updated = store.apply_update(&update("u-1")).await.unwrap();
        assert!(updated.has_asthma);
        assert_eq!(updated.age_group, AgeGroup::Elderly);
        assert_eq!(store.get("u-1").await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_rejected_update_is_not_stored() {
        let store = MemoryProfileStore::new();
        let mut bad = update("u-2");
        bad.age_group = "teen".to_string();
        assert!(store.apply_update(&bad).await.is_err());
        assert!(store.get("u-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_omitted_sensitivity_keeps_stored_value() {
        let store = MemoryProfileStore::new();
        store.apply_update(&update("u-3")).await.unwrap();

        let mut next = update("u-3");
        next.sensitivity_score = None;
        next.has_asthma = false;
        let updated = store.apply_update(&next).await.unwrap();
        assert_eq!(updated.sensitivity, 1.5);
        assert!(!updated.has_asthma);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_keep_explicit_sensitivity() {
        for round in 0..20 {
            let store = Arc::new(MemoryProfileStore::new());
            let user = format!("u-{round}");

            let mut explicit = update(&user);
            explicit.sensitivity_score = Some(2.0);
            let mut handles = vec![{
                let store = store.clone();
                tokio::spawn(async move { store.apply_update(&explicit).await })
            }];
            for _ in 0..8 {
                let store = store.clone();
                let mut omitted = update(&user);
                omitted.sensitivity_score = None;
                handles.push(tokio::spawn(async move { store.apply_update(&omitted).await }));
            }
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            let stored = store.get(&user).await.unwrap().unwrap();
            assert_eq!(stored.sensitivity, 2.0);
        }
    }

    #[tokio::test]
    async fn test_fjall_store_round_trips_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let store = FjallProfileStore::open(dir.path().join("profiles")).unwrap();

        assert!(store.get("u-1").await.unwrap().is_none());
        store.apply_update(&update("u-1")).await.unwrap();

        let profile = store.get("u-1").await.unwrap().unwrap();
        assert!(profile.has_asthma);
        assert_eq!(profile.age_group, AgeGroup::Elderly);
        assert_eq!(profile.sensitivity, 1.5);
        assert!(store.get("u-2").await.unwrap().is_none());
    }
}
