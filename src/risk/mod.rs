//! Risk engine
//!
//! Pure, stateless operations over station readings and user profiles:
//! - Classifier: AQI to severity tier and marker weight
//! - Source: pollution source attribution from tracer ratios
//! - Hotspots: selection of the stations shown on the map
//! - Scorer: personalized 0-10 exposure score
//! - Forecast: projection of the score over an upstream trend
//! - Advisory: per-activity recommendations
//! - Engine: facade carrying the configured policy

pub mod advisory;
pub mod classifier;
pub mod engine;
pub mod forecast;
pub mod hotspots;
pub mod scorer;
pub mod source;

pub use advisory::{advise, advise_all};
pub use classifier::{Classification, SeverityTier, classify, classify_station, sub_index};
pub use engine::{EnginePolicy, RiskEngine};
pub use forecast::{FEED_HORIZON, MAP_HORIZON, pollutant_series, project};
pub use hotspots::{HotspotPolicy, select_hotspots};
pub use scorer::{Confidence, DEFAULT_UNSAFE_THRESHOLD, ExposureScore, score};
pub use source::{AttributionCutoffs, SourceCategory, attribute};
