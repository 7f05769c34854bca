//! Telemetry source abstraction.

use async_trait::async_trait;
use outlier_types::{InstantSample, Series};

use crate::AdapterError;

/// Trait for fetching mesh telemetry.
///
/// Implementations answer the four query shapes the engine needs: the
/// request-rate vector used to build the call graph, and three latency range
/// queries around a single workload. Range bounds are Unix milliseconds.
///
/// # Example
///
/// ```rust,no_run
/// use outlier_adapters::{prometheus::PrometheusAdapter, TelemetrySource};
///
/// # async fn run() -> Result<(), outlier_adapters::AdapterError> {
/// let source = PrometheusAdapter::builder()
///     .endpoint("http://localhost:9090")
///     .build()?;
///
/// let edges = source.request_totals().await?;
/// println!("{} call edges", edges.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Request rates per `(source, destination)` workload pair.
    async fn request_totals(&self) -> Result<Vec<InstantSample>, AdapterError>;

    /// Latency series of calls made by `workload`, one series per destination.
    async fn downstream_latencies(
        &self,
        workload: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Series>, AdapterError>;

    /// Latency series of calls received by `workload`, one series per source.
    async fn upstream_latencies(
        &self,
        workload: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Series>, AdapterError>;

    /// Latency of all calls received by `workload`, aggregated.
    async fn workload_latencies(
        &self,
        workload: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Series>, AdapterError>;
}
