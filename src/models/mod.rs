//! Data models for airwatch
//!
//! This module contains the input records and display-ready outputs of the engine:
//! - Station: validated station readings and the ingestion coercion step
//! - Profile: user health profile and profile updates
//! - Forecast: upstream trend input and projected points
//! - Advisory / Feed: activity advisories and the personalized feed

pub mod advisory;
pub mod feed;
pub mod forecast;
pub mod profile;
pub mod station;

// Re-export all public types for convenient access
pub use advisory::{ActivityAdvisory, ActivityType, AdvisoryStatus};
pub use feed::{CurrentContext, FeedProfile, PersonalizedFeed, SeasonalAdvisory};
pub use forecast::{ForecastPoint, PollutantForecastPoint, TrendPoint, TrendSeries};
pub use profile::{AgeGroup, ProfileUpdate, UserHealthProfile};
pub use station::{Coordinate, Pollutant, PollutantProfile, RawStation, Station};
