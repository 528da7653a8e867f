//! Trend input from the forecasting collaborator and the projected output points

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One predicted pollutant level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Either an RFC 3339 timestamp or an already formatted label such as "14:00"
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl TrendPoint {
    #[must_use]
    pub fn new(time: Option<&str>, value: f64) -> Self {
        Self {
            time: time.map(str::to_string),
            value: Some(value),
        }
    }

    /// `HH:MM` label for this point, if it carries a time
    #[must_use]
    pub fn label(&self) -> Option<String> {
        let time = self.time.as_deref()?.trim();
        if time.is_empty() {
            return None;
        }
        match DateTime::parse_from_rfc3339(time) {
            Ok(dt) => Some(dt.with_timezone(&Utc).format("%H:%M").to_string()),
            Err(_) => Some(time.to_string()),
        }
    }

    #[must_use]
    pub fn finite_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }
}

/// Upstream trend for one station
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    /// Currently observed level the predictions are relative to
    #[serde(default)]
    pub baseline: Option<f64>,
    #[serde(default)]
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    #[must_use]
    pub fn new(baseline: Option<f64>, points: Vec<TrendPoint>) -> Self {
        Self { baseline, points }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A projected personal exposure point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: String,
    pub risk_score: f64,
    pub is_unsafe: bool,
}

/// A raw pollutant forecast point for the map chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantForecastPoint {
    pub time: String,
    pub value: f64,
}
