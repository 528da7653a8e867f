//! Station, trend and seasonal data served from a JSON snapshot
//!
//! The snapshot has the same loosely typed station rows as the ingestion API:
//!
//! ```json
//! {
//!   "stations": [{"station_id": "DL-1", "aqi": "212", ...}],
//!   "trends": {"DL-1": {"baseline": 110.0, "points": [{"time": "14:00", "value": 118.4}]}},
//!   "seasonal": {"season": "Winter", "risks": [...], "advice": "...", "alert_color": "#ef4444"}
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use super::{SeasonalSource, StationSource, TrendSource};
use crate::error::AirwatchError;
use crate::models::{RawStation, SeasonalAdvisory, Station, TrendSeries};

#[derive(Debug, Default, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    stations: Vec<RawStation>,
    #[serde(default)]
    trends: HashMap<String, TrendSeries>,
    #[serde(default)]
    seasonal: Option<SeasonalAdvisory>,
}

/// In-memory data set, loaded once
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    stations: Vec<Station>,
    trends: HashMap<String, TrendSeries>,
    seasonal: Option<SeasonalAdvisory>,
}

impl SnapshotSource {
    #[must_use]
    pub fn new(
        stations: Vec<Station>,
        trends: HashMap<String, TrendSeries>,
        seasonal: Option<SeasonalAdvisory>,
    ) -> Self {
        Self {
            stations,
            trends,
            seasonal,
        }
    }

    /// Read a snapshot file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
        let snapshot = Self::from_json(&text)
            .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))?;
        info!(
            path = %path.display(),
            stations = snapshot.stations.len(),
            trends = snapshot.trends.len(),
            "Loaded station snapshot"
        );
        Ok(snapshot)
    }

    /// Parse a snapshot document; rows without an identifier are dropped
    pub fn from_json(text: &str) -> Result<Self> {
        let file: SnapshotFile = serde_json::from_str(text)?;
        let total = file.stations.len();
        let stations: Vec<Station> = file
            .stations
            .into_iter()
            .filter_map(RawStation::into_station)
            .collect();
        if stations.len() < total {
            warn!(dropped = total - stations.len(), "Skipped unusable station rows");
        }
        Ok(Self::new(stations, file.trends, file.seasonal))
    }
}

#[async_trait]
impl StationSource for SnapshotSource {
    async fn stations(&self) -> crate::Result<Vec<Station>> {
        Ok(self.stations.clone())
    }
}

#[async_trait]
impl TrendSource for SnapshotSource {
    async fn trend(&self, station_id: &str) -> crate::Result<TrendSeries> {
        Ok(self.trends.get(station_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl SeasonalSource for SnapshotSource {
    async fn seasonal(&self) -> crate::Result<SeasonalAdvisory> {
        self.seasonal
            .clone()
            .ok_or_else(|| AirwatchError::dependency("seasonal forecast", "no seasonal outlook in snapshot"))
    }
}
