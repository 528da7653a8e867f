use std::path::PathBuf;
use std::sync::Arc;

use airwatch::api::AppState;
use airwatch::config::AirwatchConfig;
use airwatch::risk::RiskEngine;
use airwatch::sources::{
    FjallProfileStore, MemoryProfileStore, ProfileStore, SnapshotSource, UpstreamClient,
};
use airwatch::web;
use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(config: &AirwatchConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("airwatch={0},tower_http={0}", config.logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

fn build_profile_store(config: &AirwatchConfig) -> Result<Arc<dyn ProfileStore>> {
    let store: Arc<dyn ProfileStore> = match config.data.profile_store.as_str() {
        "fjall" => Arc::new(
            FjallProfileStore::open(&config.data.profile_store_path).with_context(|| {
                format!(
                    "Failed to open profile store at {}",
                    config.data.profile_store_path
                )
            })?,
        ),
        _ => Arc::new(MemoryProfileStore::new()),
    };
    Ok(store)
}

fn build_state(config: &AirwatchConfig) -> Result<AppState> {
    let engine = RiskEngine::new(config.engine_policy());
    let profiles = build_profile_store(config)?;

    let state = match config.data.source.as_str() {
        "upstream" => {
            let client = UpstreamClient::from_config(&config.data)?;
            tracing::info!(url = client.base_url(), "Using upstream ingestion API");
            AppState::from_source(engine, Arc::new(client), profiles)
        }
        _ => {
            let snapshot = SnapshotSource::load(&config.data.snapshot_path)?;
            AppState::from_source(engine, Arc::new(snapshot), profiles)
        }
    };
    Ok(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AirwatchConfig::load_from_path(config_path)?;

    init_tracing(&config);
    tracing::info!(
        version = airwatch::VERSION,
        source = %config.data.source,
        profile_store = %config.data.profile_store,
        "Starting airwatch"
    );

    let state = build_state(&config)?;
    web::run(&config.server.host, config.server.port, state).await
}
