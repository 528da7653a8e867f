//! Personalized exposure scorer

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::classifier::{SeverityTier, classify, sub_index};
use crate::models::{Pollutant, Station, UserHealthProfile};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Default boundary; a score of exactly this value is still safe
pub const DEFAULT_UNSAFE_THRESHOLD: f64 = 5.0;

const ASTHMA_MODIFIER: f64 = 1.0;
const PREGNANCY_MODIFIER: f64 = 1.0;
const VULNERABLE_AGE_MODIFIER: f64 = 0.5;

/// Which input the score was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Station AQI was available
    Full,
    /// AQI missing; estimated from a particulate reading
    Degraded,
    /// Nothing usable reported; neutral baseline assumed
    Unavailable,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Full => write!(f, "full"),
            Confidence::Degraded => write!(f, "degraded"),
            Confidence::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Personalized exposure for one (station, profile) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureScore {
    /// In [0, 10], one decimal
    pub score: f64,
    pub is_unsafe: bool,
    /// Tier the baseline was taken from
    pub tier: SeverityTier,
    pub confidence: Confidence,
}

/// Tier baseline on the 0-10 scale
#[must_use]
pub fn tier_baseline(tier: SeverityTier) -> Option<f64> {
    match tier {
        SeverityTier::Good => Some(1.0),
        SeverityTier::Satisfactory => Some(2.0),
        SeverityTier::Moderate => Some(4.0),
        SeverityTier::Poor => Some(6.0),
        SeverityTier::VeryPoor => Some(8.0),
        SeverityTier::Severe => Some(10.0),
        SeverityTier::Unknown => None,
    }
}

#[must_use]
pub fn is_unsafe(score: f64, threshold: f64) -> bool {
    score > threshold
}

/// Clamp to [0, 10] and round to one decimal
#[must_use]
pub fn bound_score(raw: f64) -> f64 {
    if !raw.is_finite() {
        return if raw == f64::INFINITY { MAX_SCORE } else { MIN_SCORE };
    }
    (raw.clamp(MIN_SCORE, MAX_SCORE) * 10.0).round() / 10.0
}

/// Score a station for a user.
///
/// Never fails: when the station has no usable AQI the tier is estimated
/// from PM2.5, then PM10, and finally a Moderate baseline is assumed. The
/// returned [`Confidence`] records which path was taken.
#[must_use]
pub fn score(station: &Station, profile: &UserHealthProfile, unsafe_threshold: f64) -> ExposureScore {
    let (tier, base, confidence) = resolve_baseline(station);

    let mut raw = base;
    if profile.has_asthma {
        raw += ASTHMA_MODIFIER;
    }
    if profile.is_pregnant {
        raw += PREGNANCY_MODIFIER;
    }
    if profile.age_group.is_vulnerable() {
        raw += VULNERABLE_AGE_MODIFIER;
    }
    raw *= profile.effective_sensitivity();

    let score = bound_score(raw);
    debug!(
        station = %station.id,
        user = %profile.user_id,
        %tier,
        %confidence,
        score,
        "Scored exposure"
    );

    ExposureScore {
        score,
        is_unsafe: is_unsafe(score, unsafe_threshold),
        tier,
        confidence,
    }
}

fn resolve_baseline(station: &Station) -> (SeverityTier, f64, Confidence) {
    if let Some(aqi) = station.aqi {
        let tier = classify(aqi).tier;
        if let Some(base) = tier_baseline(tier) {
            return (tier, base, Confidence::Full);
        }
    }

    for pollutant in [Pollutant::Pm25, Pollutant::Pm10] {
        let estimated = station
            .reading(pollutant)
            .and_then(|c| sub_index(pollutant, c))
            .map(|index| classify(index).tier);
        if let Some(tier) = estimated {
            if let Some(base) = tier_baseline(tier) {
                warn!(station = %station.id, %pollutant, "AQI unavailable, estimating from particulate reading");
                return (tier, base, Confidence::Degraded);
            }
        }
    }

    warn!(station = %station.id, "No usable readings, assuming moderate exposure");
    (SeverityTier::Unknown, 4.0, Confidence::Unavailable)
}
