//! # outlier-adapters
//!
//! Telemetry adapters for outlier.
//!
//! This crate hides the telemetry backend behind the [`TelemetrySource`]
//! trait. The engine only ever sees decoded [`Series`] and
//! [`InstantSample`] values.
//!
//! ## Supported Systems
//!
//! - **Prometheus** (`prometheus` feature, default) - Queries Istio's
//!   `istio_requests_total` and `istio_request_duration_seconds` metrics via
//!   the Prometheus HTTP API
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use outlier_adapters::prometheus::PrometheusAdapter;
//! use outlier_adapters::TelemetrySource;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = PrometheusAdapter::builder()
//!         .endpoint("http://localhost:9090")
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let totals = adapter.request_totals().await?;
//!     println!("Observed {} call edges", totals.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod source;

#[cfg(feature = "prometheus")]
pub mod prometheus;

pub use error::AdapterError;
pub use source::TelemetrySource;

// Re-export types for convenience
pub use outlier_types::{InstantSample, Labels, Sample, Series};
