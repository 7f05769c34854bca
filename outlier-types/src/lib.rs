//! # outlier-types
//!
//! Core types for latency outlier detection in a service mesh. This crate
//! defines the data model shared by the telemetry adapters, the classification
//! engine and the HTTP API.
//!
//! ## Design Goals
//!
//! - **Plain data**: No I/O and no algorithms, only the shapes that flow
//!   between crates
//! - **Optional serialization**: Enable the `serde` feature to get the JSON
//!   representation served by the API
//! - **Stable identity**: Workloads are keyed by a `(name, app)` pair rather
//!   than a concatenated string
//!
//! ## Features
//!
//! - `serde`: JSON serialization via serde (RFC 3339 dates, `null` for
//!   absent statistics)
//!
//! ## Example
//!
//! ```rust
//! use outlier_types::{Edge, Sample, WorkloadId};
//!
//! let edge = Edge::new(
//!     WorkloadId::new("productpage-v1", "productpage"),
//!     WorkloadId::new("reviews-v3", "reviews"),
//! );
//! assert_eq!(edge.source.name, "productpage-v1");
//!
//! let sample = Sample::new(1_539_917_345_608, 0.012);
//! assert!(sample.is_usable());
//! ```

mod sample;
mod status;
mod workload;

pub use sample::*;
pub use status::*;
pub use workload::*;
