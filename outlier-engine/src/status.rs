//! Status queries around a single workload.
//!
//! A status query fans out three independent fetches to the telemetry
//! source and classifies each returned series against its own history:
//!
//! ```text
//!                    ┌── downstream_latencies ──▶ destinations[].statuses
//! get_workload_status├── upstream_latencies   ──▶ sources[].statuses
//!                    └── workload_latencies   ──▶ statuses
//! ```
//!
//! All three branches run to completion. Failed branches are collected into a
//! [`StatusError`] next to whatever the other branches produced.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use outlier_adapters::{AdapterError, Series, TelemetrySource};
use outlier_types::{Neighbor, StatusTimeline, WorkloadId, WorkloadNode};

use crate::classifier::{Classifier, LabelPolicy};
use crate::graph::{build_graph, WorkloadGraph};
use crate::labels::{destination_of, edges_from_vector, source_of};

/// Default width of the reported range, ending now.
pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(60 * 60);
/// Default history fetched before the reported range to seed the baseline.
pub const DEFAULT_HISTORICAL: Duration = Duration::from_secs(15 * 60);
/// Default window size.
pub const DEFAULT_STEP: Duration = Duration::from_secs(5 * 60);

/// Parameters of a status query.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusQuery {
    /// Workload name.
    pub workload: String,
    /// Start of the reported range. Samples at or before it seed the baseline.
    pub start: DateTime<Utc>,
    /// End of the reported range.
    pub end: DateTime<Utc>,
    /// How far before `start` history is fetched.
    pub historical: Duration,
    /// Window size.
    pub step: Duration,
    /// Labelling rule.
    pub policy: LabelPolicy,
}

impl StatusQuery {
    /// Query for the last hour, with default history and step.
    pub fn new(workload: impl Into<String>) -> Self {
        let end = Utc::now();
        let start = end - DEFAULT_LOOKBACK;
        Self {
            workload: workload.into(),
            start,
            end,
            historical: DEFAULT_HISTORICAL,
            step: DEFAULT_STEP,
            policy: LabelPolicy::default(),
        }
    }

    /// Set the reported range.
    pub fn with_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Set the history lookback.
    pub fn with_historical(mut self, historical: Duration) -> Self {
        self.historical = historical;
        self
    }

    /// Set the window size.
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Set the labelling rule.
    pub fn with_policy(mut self, policy: LabelPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The fetched range `[start - historical, end]` in Unix milliseconds.
    pub fn fetch_range_ms(&self) -> (i64, i64) {
        let historical_ms = i64::try_from(self.historical.as_millis()).unwrap_or(i64::MAX);
        (
            self.start.timestamp_millis().saturating_sub(historical_ms),
            self.end.timestamp_millis(),
        )
    }
}

/// One of the three fetches of a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Calls made by the workload.
    Downstream,
    /// Calls received by the workload, per caller.
    Upstream,
    /// Calls received by the workload, aggregated.
    Aggregate,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Branch::Downstream => "downstream",
            Branch::Upstream => "upstream",
            Branch::Aggregate => "aggregate",
        })
    }
}

/// A failed branch of a status query.
#[derive(Debug, Error)]
#[error("{branch} query failed: {error}")]
pub struct BranchFailure {
    /// The branch that failed.
    pub branch: Branch,
    /// Why it failed.
    #[source]
    pub error: AdapterError,
}

/// Every branch failure of one status query.
#[derive(Debug, Error)]
#[error("{} of 3 status queries failed: {}", .failures.len(), join_failures(.failures))]
pub struct StatusError {
    /// Failures in branch order.
    pub failures: Vec<BranchFailure>,
}

fn join_failures(failures: &[BranchFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of a status query: the workload with whatever the successful
/// branches produced, plus the failures of the others.
#[derive(Debug)]
pub struct StatusReport {
    /// The workload with its neighbors and timelines.
    pub workload: WorkloadNode,
    /// Failed branches, if any.
    pub error: Option<StatusError>,
}

impl StatusReport {
    /// Whether every branch succeeded.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// All-or-nothing view of the report.
    pub fn into_result(self) -> Result<WorkloadNode, StatusError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.workload),
        }
    }
}

/// Fetch and classify the latency timelines around one workload.
///
/// The workload's downstream and upstream neighbors each carry the timeline
/// of their edge; the workload itself carries the timeline of everything it
/// receives. A branch that fails leaves its part empty.
pub async fn get_workload_status<S>(source: &S, query: &StatusQuery) -> StatusReport
where
    S: TelemetrySource + ?Sized,
{
    let name = query.workload.as_str();
    let (from_ms, to_ms) = query.fetch_range_ms();

    debug!(workload = name, from_ms, to_ms, "fetching workload status");

    let (downstream, upstream, aggregate) = tokio::join!(
        source.downstream_latencies(name, from_ms, to_ms),
        source.upstream_latencies(name, from_ms, to_ms),
        source.workload_latencies(name, from_ms, to_ms),
    );

    let classifier = Classifier::new(query.policy);
    let split_ms = query.start.timestamp_millis();
    let classify = |series: &Series| classifier.classify_samples(&series.samples, split_ms, query.step);

    let mut workload = WorkloadNode::new(WorkloadId::named(name));
    workload.statuses = Some(StatusTimeline::new());
    let mut failures = Vec::new();

    match downstream {
        Ok(series) => {
            debug!(workload = name, series = series.len(), "downstream series");
            for s in &series {
                workload.add_destination(Neighbor::with_statuses(destination_of(&s.labels), classify(s)));
            }
        }
        Err(error) => failures.push(BranchFailure {
            branch: Branch::Downstream,
            error,
        }),
    }

    match upstream {
        Ok(series) => {
            debug!(workload = name, series = series.len(), "upstream series");
            for s in &series {
                workload.add_source(Neighbor::with_statuses(source_of(&s.labels), classify(s)));
            }
        }
        Err(error) => failures.push(BranchFailure {
            branch: Branch::Upstream,
            error,
        }),
    }

    match aggregate {
        // Only the first series is used; none at all is an empty timeline.
        Ok(series) => workload.statuses = Some(series.first().map(classify).unwrap_or_default()),
        Err(error) => failures.push(BranchFailure {
            branch: Branch::Aggregate,
            error,
        }),
    }

    for failure in &failures {
        warn!(workload = name, branch = %failure.branch, error = %failure.error, "status query branch failed");
    }

    StatusReport {
        workload,
        error: (!failures.is_empty()).then_some(StatusError { failures }),
    }
}

/// Fetch the current request totals and build the call graph.
pub async fn get_workloads<S>(source: &S) -> Result<WorkloadGraph, AdapterError>
where
    S: TelemetrySource + ?Sized,
{
    let totals = source.request_totals().await?;
    let graph = build_graph(&edges_from_vector(&totals));

    debug!(edges = totals.len(), workloads = graph.len(), "built call graph");
    Ok(graph)
}
