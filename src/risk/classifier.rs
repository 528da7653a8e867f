//! Breakpoint classifier
//!
//! Maps an AQI value to a severity tier using a strict greater-than chain:
//! the first threshold the value exceeds wins, so every boundary value belongs
//! to the lower tier. No interpolation happens here; the tier alone drives
//! marker weight and color so two stations in one tier render identically.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Pollutant, Station};

/// Descending `(aqi strictly greater than, tier)` chain
const TIER_BREAKPOINTS: [(f64, SeverityTier); 5] = [
    (400.0, SeverityTier::Severe),
    (300.0, SeverityTier::VeryPoor),
    (200.0, SeverityTier::Poor),
    (100.0, SeverityTier::Moderate),
    (50.0, SeverityTier::Satisfactory),
];

// Concentration (µg/m³) to AQI sub-index breakpoints, NAQI 24h averages.
// (c_low, c_high, index_low, index_high); values above the last row cap at 500.
const PM25_BREAKPOINTS: [(f64, f64, f64, f64); 6] = [
    (0.0, 30.0, 0.0, 50.0),
    (30.0, 60.0, 50.0, 100.0),
    (60.0, 90.0, 100.0, 200.0),
    (90.0, 120.0, 200.0, 300.0),
    (120.0, 250.0, 300.0, 400.0),
    (250.0, 380.0, 400.0, 500.0),
];

const PM10_BREAKPOINTS: [(f64, f64, f64, f64); 6] = [
    (0.0, 50.0, 0.0, 50.0),
    (50.0, 100.0, 50.0, 100.0),
    (100.0, 250.0, 100.0, 200.0),
    (250.0, 350.0, 200.0, 300.0),
    (350.0, 430.0, 300.0, 400.0),
    (430.0, 510.0, 400.0, 500.0),
];

const MAX_SUB_INDEX: f64 = 500.0;

/// Severity tiers, ordered from least to most severe; `Unknown` sorts last
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    VeryPoor,
    Severe,
    /// Sentinel for missing, NaN, infinite or negative input
    Unknown,
}

impl SeverityTier {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SeverityTier::Good => "Good",
            SeverityTier::Satisfactory => "Satisfactory",
            SeverityTier::Moderate => "Moderate",
            SeverityTier::Poor => "Poor",
            SeverityTier::VeryPoor => "Very Poor",
            SeverityTier::Severe => "Severe",
            SeverityTier::Unknown => "Unknown",
        }
    }

    /// Map marker radius; grows faster towards the severe end
    #[must_use]
    pub fn weight(self) -> f64 {
        match self {
            SeverityTier::Unknown => 6.0,
            SeverityTier::Good => 9.0,
            SeverityTier::Satisfactory => 10.0,
            SeverityTier::Moderate => 11.0,
            SeverityTier::Poor => 13.0,
            SeverityTier::VeryPoor => 14.0,
            SeverityTier::Severe => 16.0,
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            SeverityTier::Good => "#22c55e",
            SeverityTier::Satisfactory => "#84cc16",
            SeverityTier::Moderate => "#eab308",
            SeverityTier::Poor => "#f97316",
            SeverityTier::VeryPoor => "#b91c1c",
            SeverityTier::Severe => "#7f1d1d",
            SeverityTier::Unknown => "#71717a",
        }
    }

    /// General-population guidance shown next to a station
    #[must_use]
    pub fn health_advice(self) -> &'static str {
        match self {
            SeverityTier::Good => "Air quality is good. Enjoy the outdoors.",
            SeverityTier::Satisfactory => {
                "Satisfactory. Unusually sensitive people should reduce prolonged exertion."
            }
            SeverityTier::Moderate => {
                "Moderate. Breathing discomfort is possible for people with lung or heart disease."
            }
            SeverityTier::Poor => "Poor. Sensitive groups should stay indoors; others limit exertion.",
            SeverityTier::VeryPoor => {
                "Very poor. Wear an N95 mask outdoors and limit time outside."
            }
            SeverityTier::Severe => "Severe. Avoid all outdoor exertion and keep windows shut.",
            SeverityTier::Unknown => "No data",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of classifying a single value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub tier: SeverityTier,
    pub weight: f64,
}

impl From<SeverityTier> for Classification {
    fn from(tier: SeverityTier) -> Self {
        Self {
            tier,
            weight: tier.weight(),
        }
    }
}

/// Classify an AQI value
#[must_use]
pub fn classify(aqi: f64) -> Classification {
    tier_for(aqi).into()
}

/// Classify a station by its reported AQI; a missing AQI is `Unknown`
#[must_use]
pub fn classify_station(station: &Station) -> Classification {
    station.aqi.map_or(SeverityTier::Unknown.into(), classify)
}

fn tier_for(aqi: f64) -> SeverityTier {
    if !aqi.is_finite() || aqi < 0.0 {
        return SeverityTier::Unknown;
    }
    TIER_BREAKPOINTS
        .iter()
        .find(|(threshold, _)| aqi > *threshold)
        .map_or(SeverityTier::Good, |(_, tier)| *tier)
}

/// AQI sub-index for a particulate concentration.
///
/// Only PM2.5 and PM10 have breakpoint tables; other pollutants and
/// negative or non-finite concentrations yield `None`.
#[must_use]
pub fn sub_index(pollutant: Pollutant, concentration: f64) -> Option<f64> {
    let table = match pollutant {
        Pollutant::Pm25 => &PM25_BREAKPOINTS,
        Pollutant::Pm10 => &PM10_BREAKPOINTS,
        _ => return None,
    };
    if !concentration.is_finite() || concentration < 0.0 {
        return None;
    }

    for &(c_low, c_high, i_low, i_high) in table {
        if concentration <= c_high {
            let index = (i_high - i_low) / (c_high - c_low) * (concentration - c_low) + i_low;
            return Some(index.round());
        }
    }
    Some(MAX_SUB_INDEX)
}
