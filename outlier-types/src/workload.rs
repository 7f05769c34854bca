//! Workload identities, call edges and graph nodes.

use core::fmt;

use crate::StatusTimeline;

/// Identity of a workload: its name plus the mesh `app` it belongs to.
///
/// Ordering is by name, then app, which is also the order workloads are
/// listed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkloadId {
    /// Workload name (e.g. `reviews-v3`).
    pub name: String,
    /// Application label (e.g. `reviews`). May be empty.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "String::is_empty"))]
    pub app: String,
}

impl WorkloadId {
    /// Create a workload identity.
    pub fn new(name: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            app: app.into(),
        }
    }

    /// Identity known only by name, as used for status queries.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }
}

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.app.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}/{}", self.name, self.app)
        }
    }
}

/// A directed observation that `source` called `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    /// Calling workload.
    pub source: WorkloadId,
    /// Called workload.
    pub destination: WorkloadId,
}

impl Edge {
    /// Create an edge.
    pub fn new(source: WorkloadId, destination: WorkloadId) -> Self {
        Self {
            source,
            destination,
        }
    }
}

/// An entry in a node's adjacency list.
///
/// In a graph listing this is only an identity. In a status report it also
/// carries the classified timeline of the edge to that neighbor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Neighbor {
    /// Identity of the neighboring workload.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub id: WorkloadId,
    /// Timeline of the edge between the node and this neighbor.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub statuses: Option<StatusTimeline>,
}

impl Neighbor {
    /// A neighbor without a timeline.
    pub fn new(id: WorkloadId) -> Self {
        Self { id, statuses: None }
    }

    /// A neighbor carrying the timeline of its edge.
    pub fn with_statuses(id: WorkloadId, statuses: StatusTimeline) -> Self {
        Self {
            id,
            statuses: Some(statuses),
        }
    }
}

/// A workload with its upstream and downstream neighbors.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkloadNode {
    /// Identity of the workload.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub id: WorkloadId,
    /// Workloads calling this one (upstream).
    #[cfg_attr(feature = "serde", serde(default))]
    pub sources: Vec<Neighbor>,
    /// Workloads called by this one (downstream).
    #[cfg_attr(feature = "serde", serde(default))]
    pub destinations: Vec<Neighbor>,
    /// Timeline of the workload itself; only set for status queries.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub statuses: Option<StatusTimeline>,
}

impl WorkloadNode {
    /// Create a node without neighbors.
    pub fn new(id: WorkloadId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Workload name.
    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Workload app.
    pub fn app(&self) -> &str {
        &self.id.app
    }

    /// Append an upstream neighbor.
    pub fn add_source(&mut self, neighbor: Neighbor) {
        self.sources.push(neighbor);
    }

    /// Append a downstream neighbor.
    pub fn add_destination(&mut self, neighbor: Neighbor) {
        self.destinations.push(neighbor);
    }
}
