use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{
    AirwatchError,
    models::{
        ActivityAdvisory, ActivityType, PersonalizedFeed, Pollutant, PollutantForecastPoint, ProfileUpdate,
        SeasonalAdvisory, Station, UserHealthProfile,
    },
    risk::RiskEngine,
    sources::{ProfileStore, SeasonalSource, StationSource, TrendSource},
};

/// Shared collaborators handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: RiskEngine,
    pub stations: Arc<dyn StationSource>,
    pub trends: Arc<dyn TrendSource>,
    pub seasonal: Arc<dyn SeasonalSource>,
    pub profiles: Arc<dyn ProfileStore>,
}

impl AppState {
    /// Wire one data source that serves stations, trends and the seasonal outlook
    pub fn from_source<S>(engine: RiskEngine, source: Arc<S>, profiles: Arc<dyn ProfileStore>) -> Self
    where
        S: StationSource + TrendSource + SeasonalSource + 'static,
    {
        Self {
            engine,
            stations: source.clone(),
            trends: source.clone(),
            seasonal: source,
            profiles,
        }
    }
}

/// Station as rendered on the map, enriched with engine output
#[derive(Debug, Serialize, Deserialize)]
pub struct StationView {
    pub station_id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub aqi: Option<f64>,
    pub no2_sat: Option<f64>,
    pub so2_sat: Option<f64>,
    pub aod: Option<f64>,
    pub temp_c: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub wind_speed_80m: Option<f64>,
    pub wind_dir: Option<f64>,
    pub pbl_height: Option<f64>,
    pub timestamp: Option<String>,
    pub severity: String,
    pub weight: f64,
    pub inversion_detected: bool,
    pub likely_source: Option<String>,
    pub health_advice: Option<String>,
}

impl StationView {
    #[must_use]
    pub fn build(station: &Station, engine: &RiskEngine) -> Self {
        let classification = engine.classify_station(station);
        let coordinate = station.valid_coordinate();
        Self {
            station_id: station.id.clone(),
            name: station.name.clone(),
            latitude: coordinate.map(|c| c.latitude),
            longitude: coordinate.map(|c| c.longitude),
            pm25: station.reading(Pollutant::Pm25),
            pm10: station.reading(Pollutant::Pm10),
            aqi: station.finite_aqi(),
            no2_sat: station.reading(Pollutant::No2),
            so2_sat: station.reading(Pollutant::So2),
            aod: station.reading(Pollutant::Aod),
            temp_c: station.reading(Pollutant::TempC),
            wind_speed_10m: station.reading(Pollutant::WindSpeed10m),
            wind_speed_80m: station.reading(Pollutant::WindSpeed80m),
            wind_dir: station.reading(Pollutant::WindDir),
            pbl_height: station.reading(Pollutant::PblHeight),
            timestamp: station.timestamp.map(|t| t.to_rfc3339()),
            severity: classification.tier.label().to_string(),
            weight: classification.weight,
            inversion_detected: station.inversion_detected(),
            likely_source: Some(engine.attribute(station).key().to_string()),
            health_advice: Some(classification.tier.health_advice().to_string()),
        }
    }
}

impl IntoResponse for AirwatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

/// Which station a personal request is about
#[derive(Debug, Deserialize)]
pub struct StationQuery {
    pub user_id: Option<String>,
    pub station_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stations", get(get_stations))
        .route("/hotspots", get(get_hotspots))
        .route("/personalized_feed", get(get_personalized_feed))
        .route("/advisory/{activity}", get(get_advisory))
        .route("/update_profile", post(update_profile))
        .route("/predictions/{station_id}", get(get_predictions))
        .route("/seasonal_forecast", get(get_seasonal_forecast))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

#[instrument(skip(state))]
async fn get_stations(State(state): State<AppState>) -> Result<Json<Vec<StationView>>, AirwatchError> {
    let stations = state.stations.stations().await?;
    let views: Vec<StationView> = stations
        .iter()
        .map(|s| StationView::build(s, &state.engine))
        .collect();
    info!(count = views.len(), "Served stations");
    Ok(Json(views))
}

#[instrument(skip(state))]
async fn get_hotspots(State(state): State<AppState>) -> Result<Json<Vec<StationView>>, AirwatchError> {
    let stations = state.stations.stations().await?;
    let views: Vec<StationView> = state
        .engine
        .select_hotspots(&stations)
        .iter()
        .map(|s| StationView::build(s, &state.engine))
        .collect();
    info!(count = views.len(), "Served hotspots");
    Ok(Json(views))
}

#[instrument(skip(state))]
async fn get_personalized_feed(
    State(state): State<AppState>,
    Query(query): Query<StationQuery>,
) -> Result<Json<PersonalizedFeed>, AirwatchError> {
    let (station, profile) = resolve_request(&state, &query).await?;
    let trend = state.trends.trend(&station.id).await?;
    Ok(Json(state.engine.feed(&station, &profile, &trend, Utc::now())))
}

#[instrument(skip(state))]
async fn get_advisory(
    State(state): State<AppState>,
    Path(activity): Path<String>,
    Query(query): Query<StationQuery>,
) -> Result<Json<ActivityAdvisory>, AirwatchError> {
    // Reject unknown activities before touching any collaborator
    let _: ActivityType = activity.parse()?;

    let (station, profile) = resolve_request(&state, &query).await?;
    let exposure = state.engine.score(&station, &profile);
    let advisory = state.engine.advise(&activity, exposure.score, &profile)?;
    Ok(Json(advisory))
}

#[instrument(skip(state, update), fields(user = %update.user_id))]
async fn update_profile(
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserHealthProfile>, AirwatchError> {
    let profile = state.profiles.apply_update(&update).await?;
    info!("Profile updated");
    Ok(Json(profile))
}

#[instrument(skip(state))]
async fn get_predictions(
    State(state): State<AppState>,
    Path(station_id): Path<String>,
) -> Result<Json<Vec<PollutantForecastPoint>>, AirwatchError> {
    let trend = state.trends.trend(&station_id).await?;
    Ok(Json(state.engine.pollutant_forecast(&trend, Utc::now())))
}

#[instrument(skip(state))]
async fn get_seasonal_forecast(
    State(state): State<AppState>,
) -> Result<Json<SeasonalAdvisory>, AirwatchError> {
    Ok(Json(state.seasonal.seasonal().await?))
}

/// Load the user's profile and pick the station by id, else nearest to lat/lon
async fn resolve_request(
    state: &AppState,
    query: &StationQuery,
) -> Result<(Station, UserHealthProfile), AirwatchError> {
    let user_id = match query.user_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => return Err(AirwatchError::validation("user_id is required")),
    };

    let stations = state.stations.stations().await?;
    let station = match (&query.station_id, query.lat, query.lon) {
        (Some(id), _, _) => stations
            .into_iter()
            .find(|s| &s.id == id)
            .ok_or_else(|| AirwatchError::not_found(format!("Station '{id}' not found")))?,
        (None, Some(lat), Some(lon)) => {
            if !crate::models::Coordinate::new(lat, lon).is_valid() {
                return Err(AirwatchError::validation(format!(
                    "Coordinates out of range: {lat}, {lon}"
                )));
            }
            state
                .engine
                .nearest_station(&stations, lat, lon)
                .cloned()
                .ok_or_else(|| AirwatchError::not_found("No station with a known location"))?
        }
        _ => {
            return Err(AirwatchError::validation(
                "Either station_id or both lat and lon are required",
            ));
        }
    };

    let profile = state.profiles.profile_or_default(user_id).await?;
    Ok((station, profile))
}
