//! Station model and the ingestion-boundary coercion step
//!
//! Upstream station rows are loosely typed: numeric fields arrive as numbers,
//! numeric-looking strings, or null. [`RawStation`] accepts all of those and
//! [`RawStation::into_station`] is the single place they are coerced into a
//! validated [`Station`]. A reading that cannot be coerced is absent, never
//! zero.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// PBL height (m) below which a temperature inversion is reported
pub const INVERSION_PBL_HEIGHT_M: f64 = 300.0;

/// Measured quantities a station may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pollutant {
    Pm25,
    Pm10,
    No2,
    So2,
    /// Aerosol optical depth (dimensionless, satellite derived)
    Aod,
    TempC,
    WindSpeed10m,
    WindSpeed80m,
    WindDir,
    PblHeight,
}

impl Pollutant {
    /// Every reading type, in wire order
    pub const ALL: [Pollutant; 10] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::Aod,
        Pollutant::TempC,
        Pollutant::WindSpeed10m,
        Pollutant::WindSpeed80m,
        Pollutant::WindDir,
        Pollutant::PblHeight,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::No2 => "no2",
            Pollutant::So2 => "so2",
            Pollutant::Aod => "aod",
            Pollutant::TempC => "temp_c",
            Pollutant::WindSpeed10m => "wind_speed_10m",
            Pollutant::WindSpeed80m => "wind_speed_80m",
            Pollutant::WindDir => "wind_dir",
            Pollutant::PblHeight => "pbl_height",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside the WGS84 ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A monitoring station with its latest readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub coordinate: Option<Coordinate>,
    /// Composite AQI as reported by the station, if any
    pub aqi: Option<f64>,
    /// Present readings only; absent keys mean "unknown"
    pub readings: BTreeMap<Pollutant, f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// The subset of readings the source attributor looks at
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PollutantProfile {
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub aod: Option<f64>,
}

impl Station {
    #[must_use]
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinate: None,
            aqi: None,
            readings: BTreeMap::new(),
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_coordinate(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinate = Some(Coordinate::new(latitude, longitude));
        self
    }

    #[must_use]
    pub fn with_aqi(mut self, aqi: f64) -> Self {
        self.aqi = Some(aqi);
        self
    }

    #[must_use]
    pub fn with_reading(mut self, pollutant: Pollutant, value: f64) -> Self {
        self.readings.insert(pollutant, value);
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Finite reading for `pollutant`, if reported
    #[must_use]
    pub fn reading(&self, pollutant: Pollutant) -> Option<f64> {
        self.readings
            .get(&pollutant)
            .copied()
            .filter(|v| v.is_finite())
    }

    /// Finite AQI, if reported
    #[must_use]
    pub fn finite_aqi(&self) -> Option<f64> {
        self.aqi.filter(|v| v.is_finite())
    }

    #[must_use]
    pub fn valid_coordinate(&self) -> Option<Coordinate> {
        self.coordinate.filter(Coordinate::is_valid)
    }

    #[must_use]
    pub fn pollutant_profile(&self) -> PollutantProfile {
        PollutantProfile {
            pm25: self.reading(Pollutant::Pm25),
            pm10: self.reading(Pollutant::Pm10),
            no2: self.reading(Pollutant::No2),
            so2: self.reading(Pollutant::So2),
            aod: self.reading(Pollutant::Aod),
        }
    }

    /// Low boundary layer traps pollutants near the ground
    #[must_use]
    pub fn inversion_detected(&self) -> bool {
        self.reading(Pollutant::PblHeight)
            .is_some_and(|pbl| pbl < INVERSION_PBL_HEIGHT_M)
    }
}

/// Station row as delivered by the ingestion layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawStation {
    pub station_id: Value,
    pub name: Value,
    pub latitude: Value,
    pub longitude: Value,
    pub pm25: Value,
    pub pm10: Value,
    pub aqi: Value,
    pub no2_sat: Value,
    pub so2_sat: Value,
    pub aod: Value,
    pub temp_c: Value,
    pub wind_speed_10m: Value,
    pub wind_speed_80m: Value,
    pub wind_dir: Value,
    pub pbl_height: Value,
    pub timestamp: Value,
}

impl RawStation {
    /// Coerce loosely typed fields into a [`Station`].
    ///
    /// Returns `None` only when the row has no usable identifier; every other
    /// malformed field degrades to "absent".
    #[must_use]
    pub fn into_station(self) -> Option<Station> {
        let Some(id) = coerce_text(&self.station_id) else {
            warn!("Dropping station row without an identifier");
            return None;
        };
        let name = coerce_text(&self.name).unwrap_or_else(|| id.clone());

        let coordinate = match (coerce_number(&self.latitude), coerce_number(&self.longitude)) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)).filter(Coordinate::is_valid),
            _ => None,
        };
        if coordinate.is_none() {
            warn!(station = %id, "Station has no usable coordinate");
        }

        let fields = [
            (Pollutant::Pm25, &self.pm25),
            (Pollutant::Pm10, &self.pm10),
            (Pollutant::No2, &self.no2_sat),
            (Pollutant::So2, &self.so2_sat),
            (Pollutant::Aod, &self.aod),
            (Pollutant::TempC, &self.temp_c),
            (Pollutant::WindSpeed10m, &self.wind_speed_10m),
            (Pollutant::WindSpeed80m, &self.wind_speed_80m),
            (Pollutant::WindDir, &self.wind_dir),
            (Pollutant::PblHeight, &self.pbl_height),
        ];
        let readings = fields
            .into_iter()
            .filter_map(|(pollutant, value)| coerce_number(value).map(|v| (pollutant, v)))
            .collect();

        Some(Station {
            id,
            name,
            coordinate,
            aqi: coerce_number(&self.aqi),
            readings,
            timestamp: coerce_timestamp(&self.timestamp),
        })
    }
}

/// Numbers and numeric-looking strings become finite `f64`s; everything else is absent
#[must_use]
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts RFC 3339, RFC 2822 (HTTP dates) and naive `YYYY-MM-DD HH:MM:SS` as UTC
#[must_use]
pub fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let Value::String(s) = value else {
        return None;
    };
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(42.5)), Some(42.5));
        assert_eq!(coerce_number(&json!(" 17 ")), Some(17.0));
        assert_eq!(coerce_number(&json!("n/a")), None);
        assert_eq!(coerce_number(&json!("NaN")), None);
        assert_eq!(coerce_number(&json!(null)), None);
        assert_eq!(coerce_number(&json!(true)), None);
    }

    #[test]
    fn test_raw_station_coercion_keeps_absence_distinct_from_zero() {
        let raw: RawStation = serde_json::from_value(json!({
            "station_id": "DL-ANAND",
            "name": "Anand Vihar",
            "latitude": "28.6469",
            "longitude": 77.3160,
            "pm25": "185.5",
            "pm10": null,
            "aqi": 310,
            "no2_sat": "0",
            "so2_sat": "bad",
            "pbl_height": 250,
            "timestamp": "2024-11-02T08:00:00Z"
        }))
        .unwrap();

        let station = raw.into_station().unwrap();
        assert_eq!(station.id, "DL-ANAND");
        assert_eq!(station.reading(Pollutant::Pm25), Some(185.5));
        assert_eq!(station.reading(Pollutant::Pm10), None);
        assert_eq!(station.reading(Pollutant::No2), Some(0.0));
        assert_eq!(station.reading(Pollutant::So2), None);
        assert_eq!(station.aqi, Some(310.0));
        assert!(station.valid_coordinate().is_some());
        assert!(station.inversion_detected());
        assert!(station.timestamp.is_some());
    }

    #[test]
    fn test_raw_station_numeric_id_and_missing_name() {
        let raw: RawStation =
            serde_json::from_value(json!({ "station_id": 1042, "aqi": "abc" })).unwrap();
        let station = raw.into_station().unwrap();
        assert_eq!(station.id, "1042");
        assert_eq!(station.name, "1042");
        assert_eq!(station.aqi, None);
        assert!(station.coordinate.is_none());
    }

    #[test]
    fn test_raw_station_without_id_is_dropped() {
        let raw: RawStation = serde_json::from_value(json!({ "name": "Ghost" })).unwrap();
        assert!(raw.into_station().is_none());
    }

    #[test]
    fn test_out_of_range_coordinate_is_absent() {
        let raw: RawStation = serde_json::from_value(json!({
            "station_id": "X", "latitude": 123.0, "longitude": 77.0
        }))
        .unwrap();
        assert!(raw.into_station().unwrap().coordinate.is_none());
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(coerce_timestamp(&json!("Sat, 02 Nov 2024 08:00:00 GMT")).is_some());
        assert!(coerce_timestamp(&json!("2024-11-02 08:00:00")).is_some());
        assert!(coerce_timestamp(&json!("yesterday")).is_none());
        assert!(coerce_timestamp(&json!(1_730_534_400)).is_none());
    }
}
