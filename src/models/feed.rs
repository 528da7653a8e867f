//! Personalized feed and seasonal advisory wire records

use serde::{Deserialize, Serialize};

use super::{ActivityAdvisory, ForecastPoint, UserHealthProfile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedProfile {
    pub age: String,
    pub asthma: bool,
    pub pregnant: bool,
    pub sensitivity: f64,
    pub name: String,
}

impl From<&UserHealthProfile> for FeedProfile {
    fn from(profile: &UserHealthProfile) -> Self {
        Self {
            age: profile.age_group.as_str().to_string(),
            asthma: profile.has_asthma,
            pregnant: profile.is_pregnant,
            sensitivity: profile.sensitivity,
            name: profile.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentContext {
    /// `null` when the station reports no usable AQI
    pub aqi: Option<f64>,
    pub risk_score: f64,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedFeed {
    pub user_profile: FeedProfile,
    pub current_context: CurrentContext,
    pub activities: Vec<ActivityAdvisory>,
    pub forecast: Vec<ForecastPoint>,
}

/// Seasonal outlook produced elsewhere and passed through untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalAdvisory {
    pub season: String,
    pub risks: Vec<String>,
    pub advice: String,
    pub alert_color: String,
}
