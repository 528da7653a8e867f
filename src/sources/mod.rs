//! Collaborator seams
//!
//! The engine never performs I/O. Station readings, pollutant trends, the
//! seasonal outlook and user profiles are supplied through these traits so the
//! HTTP layer can be wired to a local snapshot, the ingestion API, or test
//! doubles.

pub mod profile_store;
pub mod snapshot;
pub mod upstream;

use async_trait::async_trait;

use crate::models::{ProfileUpdate, SeasonalAdvisory, Station, TrendSeries, UserHealthProfile};

pub use profile_store::{FjallProfileStore, MemoryProfileStore};
pub use snapshot::SnapshotSource;
pub use upstream::UpstreamClient;

/// Latest readings for every known station
#[async_trait]
pub trait StationSource: Send + Sync {
    async fn stations(&self) -> crate::Result<Vec<Station>>;
}

/// Predicted pollutant levels per station
#[async_trait]
pub trait TrendSource: Send + Sync {
    /// An unknown station yields an empty trend rather than an error
    async fn trend(&self, station_id: &str) -> crate::Result<TrendSeries>;
}

/// Seasonal outlook, passed through to clients unchanged
#[async_trait]
pub trait SeasonalSource: Send + Sync {
    async fn seasonal(&self) -> crate::Result<SeasonalAdvisory>;
}

/// Owner of user health profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: &str) -> crate::Result<Option<UserHealthProfile>>;

    async fn put(&self, profile: UserHealthProfile) -> crate::Result<()>;

    /// Stored profile, or the default profile for users never seen before
    async fn profile_or_default(&self, user_id: &str) -> crate::Result<UserHealthProfile> {
        Ok(self
            .get(user_id)
            .await?
            .unwrap_or_else(|| UserHealthProfile::new(user_id)))
    }

    /// Apply `update` to the current snapshot and store the result
    async fn apply_update(&self, update: &ProfileUpdate) -> crate::Result<UserHealthProfile> {
        let current = self.profile_or_default(&update.user_id).await?;
        let updated = current.apply(update)?;
        self.put(updated.clone()).await?;
        Ok(updated)
    }
}
