//! # outlier-engine
//!
//! Latency outlier detection for service meshes.
//!
//! The engine turns raw latency series into timelines of `ok` / `high` /
//! `unknown` windows, and request totals into a call graph.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  request_totals   ┌──────────────┐
//! │                  │──────────────────▶│ labels       │──▶ graph ──▶ WorkloadGraph
//! │ TelemetrySource  │                   └──────────────┘
//! │ (outlier-        │  *_latencies      ┌──────────────┐   ┌────────────┐
//! │  adapters)       │──────────────────▶│ window       │──▶│ classifier │──▶ StatusTimeline
//! └──────────────────┘                   └──────────────┘   └─────┬──────┘
//!                                                                 │ baseline
//!                                                           ┌─────▼──────┐
//!                                                           │ stats      │
//!                                                           └────────────┘
//! ```
//!
//! [`status`] drives the fetch, window and classify steps for the three
//! views around one workload.
//!
//! ## Usage
//!
//! ### Classifying a series
//!
//! ```
//! use std::time::Duration;
//! use outlier_engine::Classifier;
//! use outlier_types::{Sample, StatusLabel};
//!
//! let mut samples: Vec<Sample> = (0..6).map(|m| Sample::new(m * 60_000, 0.010)).collect();
//! samples.push(Sample::new(6 * 60_000, 0.250));
//!
//! let timeline = Classifier::default().classify_samples(&samples, 5 * 60_000, Duration::from_secs(60));
//! assert_eq!(timeline[0].label, StatusLabel::High);
//! ```
//!
//! ### Querying a workload
//!
//! ```no_run
//! use outlier_adapters::prometheus::PrometheusAdapter;
//! use outlier_engine::{get_workload_status, StatusQuery};
//!
//! # tokio_test::block_on(async {
//! let source = PrometheusAdapter::builder()
//!     .endpoint("http://localhost:9090")
//!     .build()
//!     .unwrap();
//!
//! let report = get_workload_status(&source, &StatusQuery::new("reviews-v3")).await;
//! if let Some(error) = &report.error {
//!     eprintln!("partial result: {}", error);
//! }
//! println!("{} downstream edges", report.workload.destinations.len());
//! # });
//! ```

pub mod classifier;
pub mod graph;
pub mod labels;
pub mod stats;
pub mod status;
pub mod window;

pub use classifier::{BaselinePool, Classifier, LabelPolicy, MIN_BASELINE_SIZE};
pub use graph::{build_graph, WorkloadGraph};
pub use labels::edges_from_vector;
pub use status::{
    get_workload_status, get_workloads, Branch, BranchFailure, StatusError, StatusQuery,
    StatusReport,
};
pub use window::{Window, WindowAggregator};
