//! Call graph assembled from observed edges.

use std::collections::btree_map::{self, BTreeMap};

use outlier_types::{Edge, Neighbor, WorkloadId, WorkloadNode};

/// Workloads keyed by identity, each with its upstream and downstream
/// neighbors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkloadGraph {
    nodes: BTreeMap<WorkloadId, WorkloadNode>,
}

impl WorkloadGraph {
    /// Build a graph from a list of edges.
    ///
    /// The first pass registers every source and its destination neighbor,
    /// the second every destination and its source neighbor. Repeated edges
    /// add repeated neighbor entries.
    pub fn build(edges: &[Edge]) -> Self {
        let mut nodes: BTreeMap<WorkloadId, WorkloadNode> = BTreeMap::new();

        for edge in edges {
            nodes
                .entry(edge.source.clone())
                .or_insert_with_key(|id| WorkloadNode::new(id.clone()))
                .add_destination(Neighbor::new(edge.destination.clone()));
        }

        for edge in edges {
            nodes
                .entry(edge.destination.clone())
                .or_insert_with_key(|id| WorkloadNode::new(id.clone()))
                .add_source(Neighbor::new(edge.source.clone()));
        }

        Self { nodes }
    }

    /// Look up a workload.
    pub fn get(&self, id: &WorkloadId) -> Option<&WorkloadNode> {
        self.nodes.get(id)
    }

    /// Number of distinct workloads.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no workloads.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate workloads in identity order.
    pub fn iter(&self) -> btree_map::Values<'_, WorkloadId, WorkloadNode> {
        self.nodes.values()
    }

    /// Consume the graph, yielding workloads in identity order.
    pub fn into_workloads(self) -> Vec<WorkloadNode> {
        self.nodes.into_values().collect()
    }
}

/// Build a [`WorkloadGraph`] from a list of edges.
pub fn build_graph(edges: &[Edge]) -> WorkloadGraph {
    WorkloadGraph::build(edges)
}
