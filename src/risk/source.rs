//! Source attributor
//!
//! Infers the likely pollution source from the ratios between a station's
//! gaseous tracers and its particulate load. Rules are evaluated top-down and
//! the first match wins.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::PollutantProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    Traffic,
    Industrial,
    Dust,
    Clean,
    Unknown,
}

impl SourceCategory {
    /// Stable display key, safe to use for icon lookup
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            SourceCategory::Traffic => "traffic",
            SourceCategory::Industrial => "industrial",
            SourceCategory::Dust => "dust",
            SourceCategory::Clean => "clean",
            SourceCategory::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SourceCategory::Traffic => "Vehicular Traffic",
            SourceCategory::Industrial => "Industrial Plume",
            SourceCategory::Dust => "Dust / Biomass",
            SourceCategory::Clean => "Clean Air",
            SourceCategory::Unknown => "Urban Mix",
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Calibrated rule cutoffs, all concentrations in µg/m³
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionCutoffs {
    /// NO₂/PM2.5 ratio above which traffic dominates
    #[serde(default = "default_traffic_no2_ratio")]
    pub traffic_no2_ratio: f64,
    /// SO₂/PM2.5 ratio above which industrial emission dominates
    #[serde(default = "default_industrial_so2_ratio")]
    pub industrial_so2_ratio: f64,
    /// PM10/PM2.5 ratio above which coarse industrial dust dominates
    #[serde(default = "default_industrial_coarse_ratio")]
    pub industrial_coarse_ratio: f64,
    /// Aerosol optical depth considered elevated
    #[serde(default = "default_dust_aod")]
    pub dust_aod: f64,
    /// PM2.5 above which a low-gas particulate load reads as dust or biomass burning
    #[serde(default = "default_dust_heavy_pm25")]
    pub dust_heavy_pm25: f64,
    /// NO₂/PM2.5 ratio below which heavy particulate is not combustion driven
    #[serde(default = "default_dust_low_gas_ratio")]
    pub dust_low_gas_ratio: f64,
    /// Satisfactory ceilings; at or below all of them the air is clean
    #[serde(default = "default_clean_pm25")]
    pub clean_pm25: f64,
    #[serde(default = "default_clean_pm10")]
    pub clean_pm10: f64,
    #[serde(default = "default_clean_no2")]
    pub clean_no2: f64,
    #[serde(default = "default_clean_so2")]
    pub clean_so2: f64,
}

fn default_traffic_no2_ratio() -> f64 {
    0.35
}

fn default_industrial_so2_ratio() -> f64 {
    0.15
}

fn default_industrial_coarse_ratio() -> f64 {
    2.5
}

fn default_dust_aod() -> f64 {
    0.5
}

fn default_dust_heavy_pm25() -> f64 {
    150.0
}

fn default_dust_low_gas_ratio() -> f64 {
    0.2
}

fn default_clean_pm25() -> f64 {
    60.0
}

fn default_clean_pm10() -> f64 {
    100.0
}

fn default_clean_no2() -> f64 {
    80.0
}

fn default_clean_so2() -> f64 {
    80.0
}

impl Default for AttributionCutoffs {
    fn default() -> Self {
        Self {
            traffic_no2_ratio: default_traffic_no2_ratio(),
            industrial_so2_ratio: default_industrial_so2_ratio(),
            industrial_coarse_ratio: default_industrial_coarse_ratio(),
            dust_aod: default_dust_aod(),
            dust_heavy_pm25: default_dust_heavy_pm25(),
            dust_low_gas_ratio: default_dust_low_gas_ratio(),
            clean_pm25: default_clean_pm25(),
            clean_pm10: default_clean_pm10(),
            clean_no2: default_clean_no2(),
            clean_so2: default_clean_so2(),
        }
    }
}

/// Attribute a pollutant profile to a source category
#[must_use]
pub fn attribute(profile: &PollutantProfile, cutoffs: &AttributionCutoffs) -> SourceCategory {
    let category = if is_traffic(profile, cutoffs) {
        SourceCategory::Traffic
    } else if is_industrial(profile, cutoffs) {
        SourceCategory::Industrial
    } else if is_dust(profile, cutoffs) {
        SourceCategory::Dust
    } else if is_clean(profile, cutoffs) {
        SourceCategory::Clean
    } else {
        SourceCategory::Unknown
    };
    debug!(?profile, %category, "Attributed pollution source");
    category
}

/// Ratio of `tracer` to PM2.5; needs a positive PM2.5 reading
fn pm25_ratio(tracer: Option<f64>, profile: &PollutantProfile) -> Option<f64> {
    let pm25 = profile.pm25.filter(|v| *v > 0.0)?;
    tracer.map(|t| t / pm25)
}

fn is_traffic(profile: &PollutantProfile, cutoffs: &AttributionCutoffs) -> bool {
    let Some(no2_ratio) = pm25_ratio(profile.no2, profile) else {
        return false;
    };
    let no2 = profile.no2.unwrap_or(0.0);
    no2_ratio > cutoffs.traffic_no2_ratio && no2 >= profile.so2.unwrap_or(0.0)
}

fn is_industrial(profile: &PollutantProfile, cutoffs: &AttributionCutoffs) -> bool {
    let so2_heavy =
        pm25_ratio(profile.so2, profile).is_some_and(|r| r > cutoffs.industrial_so2_ratio);
    let coarse_heavy =
        pm25_ratio(profile.pm10, profile).is_some_and(|r| r > cutoffs.industrial_coarse_ratio);
    so2_heavy || coarse_heavy
}

fn is_dust(profile: &PollutantProfile, cutoffs: &AttributionCutoffs) -> bool {
    let low_ground_pm = match (profile.pm25, profile.pm10) {
        (Some(pm25), _) => pm25 <= cutoffs.clean_pm25,
        (None, Some(pm10)) => pm10 <= cutoffs.clean_pm10,
        (None, None) => false,
    };
    let aod_plume = profile.aod.is_some_and(|aod| aod > cutoffs.dust_aod) && low_ground_pm;

    let heavy_low_gas = profile.pm25.is_some_and(|pm25| pm25 > cutoffs.dust_heavy_pm25)
        && pm25_ratio(profile.no2, profile).is_none_or(|r| r < cutoffs.dust_low_gas_ratio);

    aod_plume || heavy_low_gas
}

fn is_clean(profile: &PollutantProfile, cutoffs: &AttributionCutoffs) -> bool {
    let monitored = [
        (profile.pm25, cutoffs.clean_pm25),
        (profile.pm10, cutoffs.clean_pm10),
        (profile.no2, cutoffs.clean_no2),
        (profile.so2, cutoffs.clean_so2),
    ];
    let mut present = monitored
        .iter()
        .filter_map(|(value, ceiling)| value.map(|v| (v, *ceiling)))
        .peekable();
    present.peek().is_some() && present.all(|(value, ceiling)| value <= ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn profile(
        pm25: Option<f64>,
        pm10: Option<f64>,
        no2: Option<f64>,
        so2: Option<f64>,
        aod: Option<f64>,
    ) -> PollutantProfile {
        PollutantProfile {
            pm25,
            pm10,
            no2,
            so2,
            aod,
        }
    }

    #[rstest]
    #[case::traffic(profile(Some(100.0), Some(150.0), Some(45.0), Some(5.0), None), SourceCategory::Traffic)]
    #[case::industrial_so2(profile(Some(100.0), Some(150.0), Some(10.0), Some(20.0), None), SourceCategory::Industrial)]
    #[case::industrial_coarse(profile(Some(40.0), Some(120.0), Some(5.0), None, None), SourceCategory::Industrial)]
    #[case::dust_aod(profile(Some(35.0), Some(70.0), Some(5.0), Some(2.0), Some(0.9)), SourceCategory::Dust)]
    #[case::dust_heavy_pm(profile(Some(210.0), Some(300.0), Some(12.0), Some(10.0), None), SourceCategory::Dust)]
    #[case::clean(profile(Some(20.0), Some(40.0), Some(5.0), Some(2.0), None), SourceCategory::Clean)]
    #[case::urban_mix(profile(Some(120.0), Some(180.0), Some(30.0), Some(10.0), None), SourceCategory::Unknown)]
    fn test_attribution_rules(#[case] input: PollutantProfile, #[case] expected: SourceCategory) {
        assert_eq!(attribute(&input, &AttributionCutoffs::default()), expected);
    }

    #[test]
    fn test_traffic_rule_wins_over_industrial() {
        // Both NO₂ and SO₂ ratios qualify; first rule in the list decides
        let input = profile(Some(100.0), None, Some(50.0), Some(20.0), None);
        assert_eq!(
            attribute(&input, &AttributionCutoffs::default()),
            SourceCategory::Traffic
        );
    }

    #[test]
    fn test_nothing_reported_is_unknown() {
        let input = PollutantProfile::default();
        assert_eq!(
            attribute(&input, &AttributionCutoffs::default()),
            SourceCategory::Unknown
        );
    }

    #[test]
    fn test_zero_pm25_disables_ratio_rules() {
        let input = profile(Some(0.0), None, Some(40.0), None, None);
        assert_eq!(
            attribute(&input, &AttributionCutoffs::default()),
            SourceCategory::Clean
        );
    }

    #[test]
    fn test_stable_keys() {
        assert_eq!(SourceCategory::Industrial.key(), "industrial");
        assert_eq!(
            serde_json::to_string(&SourceCategory::Dust).unwrap(),
            "\"dust\""
        );
    }
}
