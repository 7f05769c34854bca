//! # outlier-server
//!
//! HTTP API in front of the outlier engine.
//!
//! Serves the mesh call graph, per-workload latency status timelines and
//! the static web UI. Telemetry is read from Prometheus on every request;
//! nothing is stored between requests.
//!
//! ## Running
//!
//! ```bash
//! # Defaults: listen on 0.0.0.0:8080, Prometheus at localhost:9090
//! outlier
//!
//! # Point at the mesh's Prometheus and a UI build
//! PROMETHEUS_HOST=http://prometheus.istio-system:9090 WEB_DIST_PATH=./web/dist outlier
//!
//! # Settings file, overridden by OUTLIER_* variables and flags
//! outlier --config outlier.toml --log-level debug
//! ```

pub mod config;
pub mod params;
pub mod routes;
pub mod server;

pub use config::{QueryDefaults, Settings};
pub use routes::{handle_request, AppState};
