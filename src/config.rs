//! Configuration management for airwatch
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::AirwatchError;
use crate::risk::{AttributionCutoffs, EnginePolicy, HotspotPolicy};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "AIRWATCH_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirwatchConfig {
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,
    /// Engine policy
    #[serde(default)]
    pub engine: EngineConfig,
    /// Source attribution cutoffs
    #[serde(default)]
    pub attribution: AttributionCutoffs,
    /// Data collaborators
    #[serde(default)]
    pub data: DataConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum number of hotspots shown
    #[serde(default = "default_hotspot_min_count")]
    pub hotspot_min_count: usize,
    /// AQI above which a station is always a hotspot
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
    /// Personal score above which exposure is unsafe
    #[serde(default = "default_unsafe_threshold")]
    pub unsafe_threshold: f64,
    /// Points in the personalized forecast
    #[serde(default = "default_feed_horizon")]
    pub feed_horizon: usize,
    /// Points in the map pollutant forecast
    #[serde(default = "default_map_horizon")]
    pub map_horizon: usize,
}

/// Where station data, trends and profiles come from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Station source (snapshot or upstream)
    #[serde(default = "default_data_source")]
    pub source: String,
    /// JSON snapshot file used by the snapshot source
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    /// Base URL of the ingestion API used by the upstream source
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,
    /// Upstream request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Profile store backend (memory or fjall)
    #[serde(default = "default_profile_store")]
    pub profile_store: String,
    /// Directory of the fjall profile database
    #[serde(default = "default_profile_store_path")]
    pub profile_store_path: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_hotspot_min_count() -> usize {
    HotspotPolicy::default().min_count
}

fn default_critical_threshold() -> f64 {
    HotspotPolicy::default().critical_threshold
}

fn default_unsafe_threshold() -> f64 {
    crate::risk::DEFAULT_UNSAFE_THRESHOLD
}

fn default_feed_horizon() -> usize {
    crate::risk::FEED_HORIZON
}

fn default_map_horizon() -> usize {
    crate::risk::MAP_HORIZON
}

fn default_data_source() -> String {
    "snapshot".to_string()
}

fn default_snapshot_path() -> String {
    "data/snapshot.json".to_string()
}

fn default_upstream_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_profile_store() -> String {
    "memory".to_string()
}

fn default_profile_store_path() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("airwatch").join("profiles"))
        .unwrap_or_else(|| PathBuf::from("profiles"))
        .to_string_lossy()
        .into_owned()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hotspot_min_count: default_hotspot_min_count(),
            critical_threshold: default_critical_threshold(),
            unsafe_threshold: default_unsafe_threshold(),
            feed_horizon: default_feed_horizon(),
            map_horizon: default_map_horizon(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: default_data_source(),
            snapshot_path: default_snapshot_path(),
            upstream_url: default_upstream_url(),
            timeout_seconds: default_timeout(),
            profile_store: default_profile_store(),
            profile_store_path: default_profile_store_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AirwatchConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = Self::resolve_config_path(config_path);
        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // AIRWATCH_ENGINE__UNSAFE_THRESHOLD=6.0 overrides engine.unsafe_threshold
        builder = builder.add_source(
            Environment::with_prefix("AIRWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AirwatchConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to deserialize configuration from {}", config_file.display()))?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Pick the configuration file: explicit path, then `AIRWATCH_CONFIG`,
    /// then the platform config directory, then `config.toml`
    #[must_use]
    pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
            .or_else(|| Self::get_config_path().filter(|path| path.exists()))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("airwatch").join("config.toml"))
    }

    /// Engine policy described by this configuration
    #[must_use]
    pub fn engine_policy(&self) -> EnginePolicy {
        EnginePolicy {
            hotspots: HotspotPolicy {
                min_count: self.engine.hotspot_min_count,
                critical_threshold: self.engine.critical_threshold,
            },
            cutoffs: self.attribution.clone(),
            unsafe_threshold: self.engine.unsafe_threshold,
            feed_horizon: self.engine.feed_horizon,
            map_horizon: self.engine.map_horizon,
        }
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
        if self.engine.feed_horizon == 0 {
            self.engine.feed_horizon = default_feed_horizon();
        }
        if self.engine.map_horizon == 0 {
            self.engine.map_horizon = default_map_horizon();
        }
        if self.data.source.is_empty() {
            self.data.source = default_data_source();
        }
        if self.data.snapshot_path.is_empty() {
            self.data.snapshot_path = default_snapshot_path();
        }
        if self.data.upstream_url.is_empty() {
            self.data.upstream_url = default_upstream_url();
        }
        if self.data.timeout_seconds == 0 {
            self.data.timeout_seconds = default_timeout();
        }
        if self.data.profile_store.is_empty() {
            self.data.profile_store = default_profile_store();
        }
        if self.data.profile_store_path.is_empty() {
            self.data.profile_store_path = default_profile_store_path();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.engine.hotspot_min_count == 0 {
            return Err(AirwatchError::config("Hotspot minimum count must be at least 1").into());
        }

        if !self.engine.critical_threshold.is_finite() || self.engine.critical_threshold <= 0.0 {
            return Err(AirwatchError::config("Critical AQI threshold must be a positive number").into());
        }

        if !(0.0..=10.0).contains(&self.engine.unsafe_threshold) {
            return Err(AirwatchError::config("Unsafe threshold must be between 0 and 10").into());
        }

        if self.engine.feed_horizon > 168 || self.engine.map_horizon > 168 {
            return Err(AirwatchError::config("Forecast horizons cannot exceed 168 hours (1 week)").into());
        }

        if self.data.timeout_seconds > 300 {
            return Err(AirwatchError::config("Upstream timeout cannot exceed 300 seconds").into());
        }

        let cutoffs = [
            self.attribution.traffic_no2_ratio,
            self.attribution.industrial_so2_ratio,
            self.attribution.industrial_coarse_ratio,
            self.attribution.dust_aod,
            self.attribution.dust_heavy_pm25,
            self.attribution.dust_low_gas_ratio,
            self.attribution.clean_pm25,
            self.attribution.clean_pm10,
            self.attribution.clean_no2,
            self.attribution.clean_so2,
        ];
        if cutoffs.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(AirwatchError::config("Attribution cutoffs must be non-negative numbers").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AirwatchError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AirwatchError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_sources = ["snapshot", "upstream"];
        if !valid_sources.contains(&self.data.source.as_str()) {
            return Err(AirwatchError::config(format!(
                "Invalid data source '{}'. Must be one of: {}",
                self.data.source,
                valid_sources.join(", ")
            ))
            .into());
        }

        let valid_stores = ["memory", "fjall"];
        if !valid_stores.contains(&self.data.profile_store.as_str()) {
            return Err(AirwatchError::config(format!(
                "Invalid profile store '{}'. Must be one of: {}",
                self.data.profile_store,
                valid_stores.join(", ")
            ))
            .into());
        }

        if self.data.source == "upstream"
            && !self.data.upstream_url.starts_with("http://")
            && !self.data.upstream_url.starts_with("https://")
        {
            return Err(AirwatchError::config("Upstream URL must be a valid HTTP or HTTPS URL").into());
        }

        Ok(())
    }
}
