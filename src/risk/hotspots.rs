//! Hotspot selector

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Station;

/// Sizing policy for the active hotspot set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HotspotPolicy {
    /// Minimum number of stations shown when that many valid ones exist
    pub min_count: usize,
    /// Stations with aqi strictly above this are critical and always shown
    pub critical_threshold: f64,
}

impl Default for HotspotPolicy {
    fn default() -> Self {
        Self {
            min_count: 5,
            critical_threshold: 200.0,
        }
    }
}

/// Reduce `stations` to the active hotspot set.
///
/// Stations without a valid coordinate or with a missing, non-finite or
/// non-positive aqi are ignored. The result is ordered by descending aqi with
/// ties in input order. If at least `min_count` stations are critical, all of
/// them are returned; otherwise the top `min_count` valid stations are.
#[must_use]
pub fn select_hotspots(stations: &[Station], policy: &HotspotPolicy) -> Vec<Station> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<(&Station, f64)> = stations
        .iter()
        .filter(|s| s.valid_coordinate().is_some())
        .filter_map(|s| s.finite_aqi().filter(|aqi| *aqi > 0.0).map(|aqi| (s, aqi)))
        .collect();

    // sort_by is stable, so equal aqi keeps input order
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked.retain(|(s, _)| seen.insert(s.id.as_str()));

    let critical_count = ranked
        .iter()
        .take_while(|(_, aqi)| *aqi > policy.critical_threshold)
        .count();

    let take = if critical_count >= policy.min_count {
        critical_count
    } else {
        policy.min_count
    };

    debug!(
        valid = ranked.len(),
        critical = critical_count,
        selected = take.min(ranked.len()),
        "Selected hotspots"
    );

    ranked
        .into_iter()
        .take(take)
        .map(|(s, _)| s.clone())
        .collect()
}
