//! HTTP client for the ingestion API
//!
//! Talks to the service that collects station readings and runs the pollutant
//! forecasting model. Every failure surfaces as
//! [`AirwatchError::DependencyUnavailable`]; nothing is retried here.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::{SeasonalSource, StationSource, TrendSource};
use crate::config::DataConfig;
use crate::error::AirwatchError;
use crate::models::{RawStation, SeasonalAdvisory, Station, TrendPoint, TrendSeries};

const DEPENDENCY: &str = "ingestion API";

/// Client for `GET {base}/stations`, `GET {base}/predictions/{id}` and
/// `GET {base}/seasonal_forecast`
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("airwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &DataConfig) -> anyhow::Result<Self> {
        Self::new(
            &config.upstream_url,
            Duration::from_secs(config.timeout_seconds.into()),
        )
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Station ids are user input, so they are encoded as a single path segment
    fn predictions_path(station_id: &str) -> String {
        format!("predictions/{}", urlencoding::encode(station_id))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> crate::Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("Upstream request URL: {}", url);
        let start_time = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(&url, &e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "Upstream returned an error status");
            return Err(AirwatchError::dependency(
                DEPENDENCY,
                format!("{url} returned {status}"),
            ));
        }

        let body = response.json::<T>().await.map_err(|e| unavailable(&url, &e))?;
        info!(%url, elapsed_ms = start_time.elapsed().as_millis(), "Upstream request completed");
        Ok(body)
    }
}

fn unavailable(url: &str, error: &reqwest::Error) -> AirwatchError {
    warn!(%url, %error, "Upstream request failed");
    AirwatchError::dependency(DEPENDENCY, format!("{url}: {error}"))
}

#[async_trait]
impl StationSource for UpstreamClient {
    #[instrument(skip(self))]
    async fn stations(&self) -> crate::Result<Vec<Station>> {
        let rows: Vec<RawStation> = self.get_json("stations").await?;
        let total = rows.len();
        let stations: Vec<Station> = rows.into_iter().filter_map(RawStation::into_station).collect();
        if stations.len() < total {
            warn!(dropped = total - stations.len(), "Skipped unusable station rows");
        }
        Ok(stations)
    }
}

#[async_trait]
impl TrendSource for UpstreamClient {
    #[instrument(skip(self))]
    async fn trend(&self, station_id: &str) -> crate::Result<TrendSeries> {
        let points: Vec<TrendPoint> = self.get_json(&Self::predictions_path(station_id)).await?;
        Ok(TrendSeries::new(None, points))
    }
}

#[async_trait]
impl SeasonalSource for UpstreamClient {
    #[instrument(skip(self))]
    async fn seasonal(&self) -> crate::Result<SeasonalAdvisory> {
        self.get_json("seasonal_forecast").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_base_url_is_normalized() {
        let client = UpstreamClient::new("http://localhost:8001/api/", Duration::from_secs(2)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8001/api");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_dependency_error() {
        // Port 9 (discard) on loopback is closed in test environments
        let client = UpstreamClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = client.stations().await.unwrap_err();
        assert!(matches!(
            err,
            AirwatchError::DependencyUnavailable { ref dependency, .. } if dependency == DEPENDENCY
        ));
        assert!(client.trend("DL-1").await.is_err());
    }

    #[test]
    fn test_station_id_is_a_single_path_segment() {
        assert_eq!(UpstreamClient::predictions_path("DL-1"), "predictions/DL-1");
        assert_eq!(
            UpstreamClient::predictions_path("DL/01?debug=1#x"),
            "predictions/DL%2F01%3Fdebug%3D1%23x"
        );
    }

    #[tokio::test]
    async fn test_trend_request_encodes_station_id() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0_u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let body = r#"[{"time": "10:00", "value": 88.0}]"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            request
        });

        let client = UpstreamClient::new(&format!("http://{addr}/api"), Duration::from_secs(5)).unwrap();
        let trend = client.trend("DL/01?debug=1").await.unwrap();
        assert_eq!(trend.points.len(), 1);

        let request = server.await.unwrap();
        assert!(
            request.starts_with("GET /api/predictions/DL%2F01%3Fdebug%3D1 HTTP/1.1"),
            "unexpected request line: {request}"
        );
    }
}
