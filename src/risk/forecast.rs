//! Forecast projector
//!
//! Turns an upstream pollutant trend into a fixed-length series of personal
//! exposure points. Projection scales the current score by the ratio of each
//! predicted level to the observed baseline; there is no physical model here.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::scorer::{bound_score, is_unsafe};
use crate::models::{ForecastPoint, PollutantForecastPoint, TrendPoint, TrendSeries};

/// Points in the personalized feed forecast
pub const FEED_HORIZON: usize = 12;
/// Points in the raw pollutant series of the map view
pub const MAP_HORIZON: usize = 48;

/// Project `current_score` over `horizon` hourly steps.
///
/// The output length is always `horizon`. A short trend carries its last point
/// forward, a long one is truncated and an empty one holds the score flat.
/// Points without a timestamp are labelled `start + i` hours.
#[must_use]
pub fn project(
    current_score: f64,
    trend: &TrendSeries,
    horizon: usize,
    start: DateTime<Utc>,
    unsafe_threshold: f64,
) -> Vec<ForecastPoint> {
    let current = bound_score(current_score);
    let reference = reference_level(trend);

    let mut previous = current;
    let points: Vec<ForecastPoint> = (0..horizon)
        .map(|i| {
            let point = padded_point(trend, i);
            let risk_score = match (point.and_then(TrendPoint::finite_value), reference) {
                (Some(value), Some(reference)) => bound_score(current * value / reference),
                _ => previous,
            };
            previous = risk_score;

            ForecastPoint {
                time: time_label(trend, i, start),
                risk_score,
                is_unsafe: is_unsafe(risk_score, unsafe_threshold),
            }
        })
        .collect();

    debug!(
        horizon,
        trend_len = trend.points.len(),
        reference = ?reference,
        "Projected exposure forecast"
    );
    points
}

/// Raw pollutant series for the map chart, values rounded to one decimal.
///
/// Uses the same padding rules as [`project`]; an empty trend holds the
/// baseline flat, or yields nothing when there is no baseline either.
#[must_use]
pub fn pollutant_series(
    trend: &TrendSeries,
    horizon: usize,
    start: DateTime<Utc>,
) -> Vec<PollutantForecastPoint> {
    let baseline = trend.baseline.filter(|b| b.is_finite());
    let Some(mut previous) = baseline.or_else(|| first_finite(trend)) else {
        return Vec::new();
    };

    (0..horizon)
        .map(|i| {
            if let Some(value) = padded_point(trend, i).and_then(TrendPoint::finite_value) {
                previous = value;
            }
            PollutantForecastPoint {
                time: time_label(trend, i, start),
                value: (previous * 10.0).round() / 10.0,
            }
        })
        .collect()
}

/// Baseline if usable, else the first finite positive predicted level
fn reference_level(trend: &TrendSeries) -> Option<f64> {
    trend
        .baseline
        .filter(|b| b.is_finite() && *b > 0.0)
        .or_else(|| {
            trend
                .points
                .iter()
                .filter_map(TrendPoint::finite_value)
                .find(|v| *v > 0.0)
        })
}

fn first_finite(trend: &TrendSeries) -> Option<f64> {
    trend.points.iter().find_map(TrendPoint::finite_value)
}

fn padded_point(trend: &TrendSeries, i: usize) -> Option<&TrendPoint> {
    trend.points.get(i).or_else(|| trend.points.last())
}

fn time_label(trend: &TrendSeries, i: usize, start: DateTime<Utc>) -> String {
    trend
        .points
        .get(i)
        .and_then(TrendPoint::label)
        .unwrap_or_else(|| {
            let offset = i64::try_from(i).unwrap_or(i64::MAX);
            (start + Duration::hours(offset)).format("%H:%M").to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 2, 14, 0, 0).unwrap()
    }

    fn trend(baseline: Option<f64>, values: &[f64]) -> TrendSeries {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| TrendPoint::new(Some(format!("{:02}:00", 15 + i).as_str()), *v))
            .collect();
        TrendSeries::new(baseline, points)
    }

    #[test]
    fn test_scales_by_ratio_to_baseline() {
        let series = trend(Some(100.0), &[100.0, 150.0, 50.0]);
        let points = project(4.0, &series, 3, start(), 5.0);

        let scores: Vec<f64> = points.iter().map(|p| p.risk_score).collect();
        assert_eq!(scores, vec![4.0, 6.0, 2.0]);
        assert_eq!(points[1].time, "16:00");
        assert!(points[1].is_unsafe);
        assert!(!points[0].is_unsafe);
    }

    #[test]
    fn test_output_length_matches_horizon() {
        let short = trend(Some(100.0), &[120.0, 140.0]);
        let points = project(5.0, &short, FEED_HORIZON, start(), 5.0);
        assert_eq!(points.len(), FEED_HORIZON);
        assert!(points[2..].iter().all(|p| p.risk_score == 7.0));

        let long = trend(Some(100.0), &[100.0; 60]);
        assert_eq!(project(5.0, &long, MAP_HORIZON, start(), 5.0).len(), MAP_HORIZON);
    }

    #[test]
    fn test_empty_trend_holds_score_flat() {
        let points = project(3.3, &TrendSeries::default(), 4, start(), 5.0);
        assert!(points.iter().all(|p| p.risk_score == 3.3 && !p.is_unsafe));
        assert_eq!(points[0].time, "14:00");
        assert_eq!(points[3].time, "17:00");
    }

    #[test]
    fn test_missing_baseline_uses_first_positive_value() {
        let series = trend(None, &[0.0, 80.0, 160.0]);
        let points = project(2.0, &series, 3, start(), 5.0);
        let scores: Vec<f64> = points.iter().map(|p| p.risk_score).collect();
        assert_eq!(scores, vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_non_finite_values_repeat_previous_score() {
        let series = trend(Some(100.0), &[200.0, f64::NAN, 50.0]);
        let scores: Vec<f64> = project(3.0, &series, 3, start(), 5.0)
            .iter()
            .map(|p| p.risk_score)
            .collect();
        assert_eq!(scores, vec![6.0, 6.0, 1.5]);
    }

    #[test]
    fn test_scores_are_clamped() {
        let series = trend(Some(10.0), &[1000.0]);
        let points = project(8.0, &series, 2, start(), 5.0);
        assert!(points.iter().all(|p| p.risk_score == 10.0));
    }

    #[test]
    fn test_projection_is_deterministic() {
        let series = trend(Some(140.0), &[150.0, 171.3, 133.9, f64::NAN, 220.0]);
        let first = project(6.1, &series, FEED_HORIZON, start(), 5.0);
        let second = project(6.1, &series, FEED_HORIZON, start(), 5.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_pollutant_series_rounds_and_pads() {
        let series = trend(Some(100.0), &[101.26, f64::INFINITY, 99.94]);
        let points = pollutant_series(&series, 5, start());
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![101.3, 101.3, 99.9, 99.9, 99.9]);
        assert_eq!(points[4].time, "18:00");
    }

    #[test]
    fn test_pollutant_series_without_data_is_empty() {
        assert!(pollutant_series(&TrendSeries::default(), MAP_HORIZON, start()).is_empty());
        let flat = pollutant_series(&TrendSeries::new(Some(42.0), vec![]), 3, start());
        assert!(flat.iter().all(|p| p.value == 42.0));
    }
}
