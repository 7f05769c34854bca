//! Workload identity extraction from mesh telemetry labels.

use outlier_types::{Edge, InstantSample, Labels, WorkloadId};

/// Label carrying the calling workload's name.
pub const SOURCE_WORKLOAD: &str = "source_workload";
/// Label carrying the calling workload's app.
pub const SOURCE_APP: &str = "source_app";
/// Label carrying the called workload's name.
pub const DESTINATION_WORKLOAD: &str = "destination_workload";
/// Label carrying the called workload's app.
pub const DESTINATION_APP: &str = "destination_app";

/// Identity of the calling side. Missing labels become empty strings.
pub fn source_of(labels: &Labels) -> WorkloadId {
    identity(labels, SOURCE_WORKLOAD, SOURCE_APP)
}

/// Identity of the called side. Missing labels become empty strings.
pub fn destination_of(labels: &Labels) -> WorkloadId {
    identity(labels, DESTINATION_WORKLOAD, DESTINATION_APP)
}

/// The call edge described by a label set.
pub fn edge_of(labels: &Labels) -> Edge {
    Edge::new(source_of(labels), destination_of(labels))
}

/// Convert an instant vector of request totals into call edges, one per
/// sample, in input order.
pub fn edges_from_vector(vector: &[InstantSample]) -> Vec<Edge> {
    vector.iter().map(|sample| edge_of(&sample.labels)).collect()
}

fn identity(labels: &Labels, name: &str, app: &str) -> WorkloadId {
    let get = |key: &str| labels.get(key).cloned().unwrap_or_default();
    WorkloadId::new(get(name), get(app))
}
