//! Prometheus adapter using the Prometheus HTTP API.
//!
//! This adapter reads Istio's standard metrics from Prometheus, which is
//! typically available on port 9090.
//!
//! ## Metrics Queried
//!
//! - **`istio_requests_total`**: Request rate per call edge, used to build
//!   the call graph (instant query)
//! - **`istio_request_duration_seconds_bucket`**: Latency histogram, reduced
//!   to a quantile per edge or per workload (range query)
//!
//! ## Example
//!
//! ```rust,no_run
//! use outlier_adapters::prometheus::PrometheusAdapter;
//! use outlier_adapters::TelemetrySource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = PrometheusAdapter::builder()
//!         .endpoint("http://prometheus.istio-system:9090")
//!         .quantile(0.99)
//!         .build()?;
//!
//!     let end = 1_540_652_400_000;
//!     let start = end - 75 * 60 * 1000;
//!     for series in adapter.downstream_latencies("productpage-v1", start, end).await? {
//!         println!("{:?}: {} samples", series.label("destination_workload"), series.samples.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod query;
mod response;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use outlier_types::{InstantSample, Series};

use crate::{AdapterError, TelemetrySource};

pub use response::{decode_matrix, decode_vector};

/// Prometheus adapter for fetching Istio telemetry.
#[derive(Debug, Clone)]
pub struct PrometheusAdapter {
    client: Client,
    endpoint: String,
    resolution: Duration,
    rate_window: String,
    quantile: f64,
}

impl PrometheusAdapter {
    /// Create a new builder for configuring the adapter.
    pub fn builder() -> PrometheusAdapterBuilder {
        PrometheusAdapterBuilder::default()
    }

    /// The configured API endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Evaluate an instant query at the current time.
    pub async fn query(&self, promql: &str) -> Result<Vec<InstantSample>, AdapterError> {
        let url = format!("{}/api/v1/query", self.endpoint);
        debug!(query = promql, "prometheus instant query");

        let body = self.get(&url, &[("query", promql.to_string())]).await?;
        decode_vector(&body)
    }

    /// Evaluate a range query between two Unix millisecond timestamps.
    pub async fn query_range(
        &self,
        promql: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Series>, AdapterError> {
        let url = format!("{}/api/v1/query_range", self.endpoint);
        debug!(query = promql, start_ms, end_ms, "prometheus range query");

        let params = [
            ("query", promql.to_string()),
            ("start", format_timestamp(start_ms)),
            ("end", format_timestamp(end_ms)),
            ("step", format!("{}", self.resolution.as_secs_f64())),
        ];
        let body = self.get(&url, &params).await?;
        decode_matrix(&body)
    }

    async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<String, AdapterError> {
        let response = self.client.get(url).query(params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Prometheus reports query errors as JSON with a 4xx/5xx status, so
        // only bail out here when the body is not an API response at all.
        if !status.is_success() && !body.trim_start().starts_with('{') {
            return Err(AdapterError::Http(format!("API returned status {}", status)));
        }

        Ok(body)
    }
}

#[async_trait]
impl TelemetrySource for PrometheusAdapter {
    async fn request_totals(&self) -> Result<Vec<InstantSample>, AdapterError> {
        self.query(&query::request_totals(&self.rate_window)).await
    }

    async fn downstream_latencies(
        &self,
        workload: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Series>, AdapterError> {
        let promql = query::downstream_durations(self.quantile, workload, &self.rate_window);
        self.query_range(&promql, start_ms, end_ms).await
    }

    async fn upstream_latencies(
        &self,
        workload: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Series>, AdapterError> {
        let promql = query::upstream_durations(self.quantile, workload, &self.rate_window);
        self.query_range(&promql, start_ms, end_ms).await
    }

    async fn workload_latencies(
        &self,
        workload: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Series>, AdapterError> {
        let promql = query::workload_durations(self.quantile, workload, &self.rate_window);
        self.query_range(&promql, start_ms, end_ms).await
    }
}

/// Builder for PrometheusAdapter.
#[derive(Debug, Default)]
pub struct PrometheusAdapterBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
    resolution: Option<Duration>,
    rate_window: Option<String>,
    quantile: Option<f64>,
}

impl PrometheusAdapterBuilder {
    /// Set the API endpoint (e.g., "http://localhost:9090").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the range query resolution (default: 5 seconds, Istio's scrape
    /// interval).
    pub fn resolution(mut self, resolution: Duration) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Set the `rate()` window (default: "60s").
    pub fn rate_window(mut self, window: impl Into<String>) -> Self {
        self.rate_window = Some(window.into());
        self
    }

    /// Set the latency quantile (default: 0.95).
    pub fn quantile(mut self, quantile: f64) -> Self {
        self.quantile = Some(quantile);
        self
    }

    /// Build the adapter.
    pub fn build(self) -> Result<PrometheusAdapter, AdapterError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Http(format!("failed to build HTTP client: {}", e)))?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:9090".to_string());

        Ok(PrometheusAdapter {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            resolution: self.resolution.unwrap_or(Duration::from_secs(5)),
            rate_window: self.rate_window.unwrap_or_else(|| "60s".to_string()),
            quantile: self.quantile.unwrap_or(0.95),
        })
    }
}

// Unix seconds with millisecond precision, as accepted by the HTTP API.
fn format_timestamp(ms: i64) -> String {
    format!("{:.3}", ms as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let adapter = PrometheusAdapter::builder().build().unwrap();
        assert_eq!(adapter.endpoint, "http://localhost:9090");
        assert_eq!(adapter.resolution, Duration::from_secs(5));
        assert_eq!(adapter.rate_window, "60s");
        assert_eq!(adapter.quantile, 0.95);
    }

    #[test]
    fn test_builder_custom() {
        let adapter = PrometheusAdapter::builder()
            .endpoint("http://prometheus.local:9090/")
            .resolution(Duration::from_secs(15))
            .rate_window("2m")
            .quantile(0.5)
            .build()
            .unwrap();

        assert_eq!(adapter.endpoint(), "http://prometheus.local:9090");
        assert_eq!(adapter.resolution, Duration::from_secs(15));
        assert_eq!(adapter.rate_window, "2m");
        assert_eq!(adapter.quantile, 0.5);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1_540_652_400_000), "1540652400.000");
        assert_eq!(format_timestamp(1_539_917_345_608), "1539917345.608");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let adapter = PrometheusAdapter::builder()
            .endpoint("http://127.0.0.1:1")
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();

        let result = adapter.request_totals().await;
        assert!(matches!(
            result,
            Err(AdapterError::Connection(_)) | Err(AdapterError::Timeout) | Err(AdapterError::Http(_))
        ));
    }
}
