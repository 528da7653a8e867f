//! Engine facade bundling the calibrated policy with the pure risk operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::advisory;
use super::classifier::{self, Classification};
use super::forecast::{self, FEED_HORIZON, MAP_HORIZON};
use super::hotspots::{self, HotspotPolicy};
use super::scorer::{self, DEFAULT_UNSAFE_THRESHOLD, ExposureScore};
use super::source::{self, AttributionCutoffs, SourceCategory};
use crate::models::{
    ActivityAdvisory, ActivityType, CurrentContext, FeedProfile, ForecastPoint, PersonalizedFeed,
    Pollutant, PollutantForecastPoint, Station, TrendSeries, UserHealthProfile,
};

/// Tunable parameters of the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnginePolicy {
    pub hotspots: HotspotPolicy,
    pub cutoffs: AttributionCutoffs,
    pub unsafe_threshold: f64,
    pub feed_horizon: usize,
    pub map_horizon: usize,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            hotspots: HotspotPolicy::default(),
            cutoffs: AttributionCutoffs::default(),
            unsafe_threshold: DEFAULT_UNSAFE_THRESHOLD,
            feed_horizon: FEED_HORIZON,
            map_horizon: MAP_HORIZON,
        }
    }
}

/// Stateless risk engine; cheap to clone and safe to share across requests
#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    policy: EnginePolicy,
}

impl RiskEngine {
    #[must_use]
    pub fn new(policy: EnginePolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    #[must_use]
    pub fn classify(&self, aqi: f64) -> Classification {
        classifier::classify(aqi)
    }

    #[must_use]
    pub fn classify_station(&self, station: &Station) -> Classification {
        classifier::classify_station(station)
    }

    #[must_use]
    pub fn attribute(&self, station: &Station) -> SourceCategory {
        source::attribute(&station.pollutant_profile(), &self.policy.cutoffs)
    }

    #[must_use]
    pub fn select_hotspots(&self, stations: &[Station]) -> Vec<Station> {
        hotspots::select_hotspots(stations, &self.policy.hotspots)
    }

    #[must_use]
    pub fn score(&self, station: &Station, profile: &UserHealthProfile) -> ExposureScore {
        scorer::score(station, profile, self.policy.unsafe_threshold)
    }

    /// Personal forecast over the feed horizon
    #[must_use]
    pub fn project(
        &self,
        current_score: f64,
        trend: &TrendSeries,
        start: DateTime<Utc>,
    ) -> Vec<ForecastPoint> {
        forecast::project(
            current_score,
            trend,
            self.policy.feed_horizon,
            start,
            self.policy.unsafe_threshold,
        )
    }

    /// Raw pollutant forecast over the map horizon
    #[must_use]
    pub fn pollutant_forecast(
        &self,
        trend: &TrendSeries,
        start: DateTime<Utc>,
    ) -> Vec<PollutantForecastPoint> {
        forecast::pollutant_series(trend, self.policy.map_horizon, start)
    }

    /// Advise on an activity given by name; unknown names are rejected
    pub fn advise(
        &self,
        activity: &str,
        score: f64,
        profile: &UserHealthProfile,
    ) -> crate::Result<ActivityAdvisory> {
        let activity: ActivityType = activity.parse()?;
        Ok(advisory::advise(activity, score, profile))
    }

    #[must_use]
    pub fn advise_all(&self, score: f64, profile: &UserHealthProfile) -> Vec<ActivityAdvisory> {
        advisory::advise_all(score, profile)
    }

    /// Assemble the personalized feed for one user at one station.
    ///
    /// A trend without a baseline is anchored to the station's PM2.5 reading.
    #[instrument(skip(self, station, profile, trend), fields(station = %station.id, user = %profile.user_id))]
    #[must_use]
    pub fn feed(
        &self,
        station: &Station,
        profile: &UserHealthProfile,
        trend: &TrendSeries,
        now: DateTime<Utc>,
    ) -> PersonalizedFeed {
        let anchored;
        let trend = match (trend.baseline, station.reading(Pollutant::Pm25)) {
            (None, Some(pm25)) => {
                anchored = TrendSeries::new(Some(pm25), trend.points.clone());
                &anchored
            }
            _ => trend,
        };

        let exposure = self.score(station, profile);
        let forecast = self.project(exposure.score, trend, now);
        let activities = self.advise_all(exposure.score, profile);
        let last_updated = station.timestamp.unwrap_or(now).to_rfc3339();

        debug!(score = exposure.score, confidence = %exposure.confidence, "Assembled feed");

        PersonalizedFeed {
            user_profile: FeedProfile::from(profile),
            current_context: CurrentContext {
                aqi: station.finite_aqi(),
                risk_score: exposure.score,
                last_updated,
            },
            activities,
            forecast,
        }
    }

    /// Closest station with a valid coordinate; ties keep input order
    #[must_use]
    pub fn nearest_station<'a>(
        &self,
        stations: &'a [Station],
        latitude: f64,
        longitude: f64,
    ) -> Option<&'a Station> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }

        let mut best: Option<(&Station, f64)> = None;
        for station in stations {
            let Some(coordinate) = station.valid_coordinate() else {
                continue;
            };
            let distance = haversine::distance(
                haversine::Location {
                    latitude,
                    longitude,
                },
                haversine::Location {
                    latitude: coordinate.latitude,
                    longitude: coordinate.longitude,
                },
                haversine::Units::Kilometers,
            );
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((station, distance));
            }
        }
        best.map(|(station, _)| station)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AirwatchError;
    use crate::models::{AdvisoryStatus, TrendPoint};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 2, 8, 0, 0).unwrap()
    }

    fn poor_station() -> Station {
        Station::new("DL-01", "Anand Vihar")
            .with_coordinate(28.647, 77.315)
            .with_aqi(250.0)
    }

    #[test]
    fn test_feed_composition() {
        let engine = RiskEngine::default();
        let profile = UserHealthProfile::new("u-1")
            .with_asthma(true)
            .with_display_name("Asha");
        let trend = TrendSeries::new(Some(100.0), vec![TrendPoint::new(Some("09:00"), 50.0)]);

        let feed = engine.feed(&poor_station(), &profile, &trend, now());

        assert_eq!(feed.user_profile.name, "Asha");
        assert!(feed.user_profile.asthma);
        assert_eq!(feed.current_context.aqi, Some(250.0));
        assert_eq!(feed.current_context.risk_score, 7.0);
        assert_eq!(feed.current_context.last_updated, now().to_rfc3339());
        assert_eq!(feed.activities.len(), 3);
        assert_eq!(feed.activities[0].status, AdvisoryStatus::Stop);
        assert_eq!(feed.forecast.len(), FEED_HORIZON);
        assert_eq!(feed.forecast[0].time, "09:00");
        assert_eq!(feed.forecast[0].risk_score, 3.5);
    }

    #[test]
    fn test_feed_anchors_trend_to_station_pm25() {
        let station = poor_station().with_reading(Pollutant::Pm25, 200.0);
        let trend = TrendSeries::new(
            None,
            vec![
                TrendPoint::new(Some("09:00"), 100.0),
                TrendPoint::new(Some("10:00"), 200.0),
            ],
        );
        let feed = engine_feed(&station, &trend);
        // Without anchoring the first point would be the reference and score 6.0
        assert_eq!(feed.forecast[0].risk_score, 3.0);
        assert_eq!(feed.forecast[1].risk_score, 6.0);
    }

    fn engine_feed(station: &Station, trend: &TrendSeries) -> PersonalizedFeed {
        RiskEngine::default().feed(station, &UserHealthProfile::new("u"), trend, now())
    }

    #[test]
    fn test_feed_prefers_station_timestamp() {
        let stamp = Utc.with_ymd_and_hms(2024, 11, 2, 7, 30, 0).unwrap();
        let station = poor_station().with_timestamp(stamp);
        let feed = RiskEngine::default().feed(
            &station,
            &UserHealthProfile::new("u"),
            &TrendSeries::default(),
            now(),
        );
        assert_eq!(feed.current_context.last_updated, stamp.to_rfc3339());
    }

    #[test]
    fn test_advise_rejects_unknown_activity() {
        let engine = RiskEngine::default();
        let profile = UserHealthProfile::new("u");
        let err = engine.advise("skydiving", 2.0, &profile).unwrap_err();
        assert!(matches!(err, AirwatchError::UnsupportedActivity { .. }));
        assert!(engine.advise("SPORT", 2.0, &profile).is_ok());
    }

    #[test]
    fn test_nearest_station() {
        let engine = RiskEngine::default();
        let stations = vec![
            Station::new("far", "Mumbai").with_coordinate(19.07, 72.87),
            Station::new("bad", "Broken").with_coordinate(f64::NAN, 77.2),
            Station::new("near", "ITO").with_coordinate(28.628, 77.241),
            Station::new("none", "No coordinate"),
        ];
        let found = engine.nearest_station(&stations, 28.61, 77.23);
        assert_eq!(found.map(|s| s.id.as_str()), Some("near"));
        assert!(engine.nearest_station(&stations[3..], 28.61, 77.23).is_none());
        assert!(engine.nearest_station(&stations, f64::NAN, 77.23).is_none());
    }

    #[test]
    fn test_nearest_station_ties_keep_input_order() {
        let engine = RiskEngine::default();
        let stations = vec![
            Station::new("first", "A").with_coordinate(10.0, 10.0),
            Station::new("second", "B").with_coordinate(10.0, 10.0),
        ];
        let found = engine.nearest_station(&stations, 11.0, 11.0);
        assert_eq!(found.map(|s| s.id.as_str()), Some("first"));
    }

    #[test]
    fn test_policy_drives_threshold() {
        let engine = RiskEngine::new(EnginePolicy {
            unsafe_threshold: 7.5,
            ..EnginePolicy::default()
        });
        let profile = UserHealthProfile::new("u").with_asthma(true);
        let exposure = engine.score(&poor_station(), &profile);
        assert_eq!(exposure.score, 7.0);
        assert!(!exposure.is_unsafe);
    }
}
