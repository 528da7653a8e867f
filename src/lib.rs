//! `airwatch` - Air-quality risk classification and personal advisories
//!
//! This library provides the risk engine (severity tiers, source attribution,
//! hotspot selection, personalized exposure scores, forecasts and activity
//! advisories) together with the collaborator seams and HTTP service around it.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod risk;
pub mod sources;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use config::AirwatchConfig;
pub use error::AirwatchError;
pub use models::{ActivityAdvisory, ActivityType, PersonalizedFeed, Station, UserHealthProfile};
pub use risk::{EnginePolicy, RiskEngine, SeverityTier, SourceCategory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AirwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
