//! Core graph data structure.
//!
//! The ServiceGraph wraps petgraph and adds the indexes the analyzers
//! need: id lookups, first-edge-per-pair lookups and id-ordered
//! adjacency lists in both directions. It is immutable once built;
//! a new snapshot means a new graph.

use crate::builder::GraphBuilder;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use servicemap_core::{ServiceNode, ServiceRelationship, TopologySnapshot};
use std::collections::HashMap;

/// Unique identifier for a node in the graph.
pub type NodeId = NodeIndex;

/// The service dependency graph.
///
/// Node indexes are dense (`0..node_count`) because nodes are never
/// removed, so analyzers index plain vectors with `NodeId::index()`.
#[derive(Debug, Clone, Default)]
pub struct ServiceGraph {
    /// The underlying petgraph graph.
    pub(crate) graph: DiGraph<ServiceNode, ServiceRelationship>,

    /// Maps service ids to graph node indexes.
    pub(crate) id_index: HashMap<String, NodeId>,

    /// Maps relationship ids to edge indexes. Last write wins.
    pub(crate) edge_index: HashMap<String, EdgeIndex>,

    /// First edge supplied for each (source, target) pair.
    pub(crate) pair_index: HashMap<(NodeId, NodeId), EdgeIndex>,

    /// Distinct successors of each node, ordered by id.
    pub(crate) forward: Vec<Vec<NodeId>>,

    /// Distinct predecessors of each node, ordered by id.
    pub(crate) reverse: Vec<Vec<NodeId>>,
}

impl ServiceGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from a full snapshot.
    ///
    /// Edges whose source or target is not in the snapshot are dropped.
    pub fn from_snapshot(snapshot: &TopologySnapshot) -> Self {
        let mut builder = GraphBuilder::new();
        builder.add_nodes(snapshot.nodes.iter().cloned());
        builder.add_edges(snapshot.edges.iter().cloned());
        builder.build()
    }

    /// Gets a node by its service id.
    pub fn get_by_id(&self, id: &str) -> Option<&ServiceNode> {
        let index = self.id_index.get(id)?;
        self.graph.node_weight(*index)
    }

    /// Gets a node by its graph index.
    pub fn get(&self, index: NodeId) -> Option<&ServiceNode> {
        self.graph.node_weight(index)
    }

    /// Gets the node index for a service id.
    pub fn get_index(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    /// Returns the service id stored at `index`.
    ///
    /// Panics if the index did not come from this graph.
    pub(crate) fn id_of(&self, index: NodeId) -> &str {
        &self.graph[index].id
    }

    /// Distinct direct dependencies of a node, ordered by id.
    pub fn successors(&self, index: NodeId) -> &[NodeId] {
        self.forward
            .get(index.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Distinct direct dependents of a node, ordered by id.
    pub fn predecessors(&self, index: NodeId) -> &[NodeId] {
        self.reverse
            .get(index.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ids of the services `id` points to. Empty for unknown ids.
    pub fn forward_neighbors(&self, id: &str) -> Vec<&str> {
        self.get_index(id)
            .map(|index| self.ids(self.successors(index)))
            .unwrap_or_default()
    }

    /// Ids of the services pointing to `id`. Empty for unknown ids.
    pub fn reverse_neighbors(&self, id: &str) -> Vec<&str> {
        self.get_index(id)
            .map(|index| self.ids(self.predecessors(index)))
            .unwrap_or_default()
    }

    /// Gets a relationship by its id.
    pub fn edge_by_id(&self, id: &str) -> Option<&ServiceRelationship> {
        let index = self.edge_index.get(id)?;
        self.graph.edge_weight(*index)
    }

    /// Gets the first relationship supplied from `source` to `target`.
    ///
    /// Parallel edges after the first are kept in the graph but never
    /// consulted for weights.
    pub fn edge_between(&self, source: &str, target: &str) -> Option<&ServiceRelationship> {
        let from = self.get_index(source)?;
        let to = self.get_index(target)?;
        self.edge_between_indexes(from, to)
    }

    /// Index-based form of [`ServiceGraph::edge_between`].
    pub fn edge_between_indexes(&self, from: NodeId, to: NodeId) -> Option<&ServiceRelationship> {
        let index = self.pair_index.get(&(from, to))?;
        self.graph.edge_weight(*index)
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of retained edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns true when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Iterates over all nodes in snapshot order.
    pub fn nodes(&self) -> impl Iterator<Item = &ServiceNode> {
        self.graph.node_weights()
    }

    /// Iterates over all retained edges in snapshot order.
    pub fn edges(&self) -> impl Iterator<Item = &ServiceRelationship> {
        self.graph.edge_weights()
    }

    /// Iterates over all node indexes in snapshot order.
    pub fn node_indexes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    fn ids(&self, indexes: &[NodeId]) -> Vec<&str> {
        indexes.iter().map(|&index| self.id_of(index)).collect()
    }
}

/// Graph statistics for status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub root_count: usize,
    pub leaf_count: usize,
}

impl ServiceGraph {
    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        let root_count = self
            .node_indexes()
            .filter(|&index| self.predecessors(index).is_empty())
            .count();
        let leaf_count = self
            .node_indexes()
            .filter(|&index| self.successors(index).is_empty())
            .count();

        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            root_count,
            leaf_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(nodes: &[&str], edges: &[(&str, &str, &str)]) -> TopologySnapshot {
        TopologySnapshot::new(
            nodes.iter().map(|id| ServiceNode::new(*id, "service")).collect(),
            edges
                .iter()
                .map(|(id, s, t)| ServiceRelationship::new(*id, *s, *t, "http"))
                .collect(),
        )
    }

    #[test]
    fn test_empty_graph() {
        let graph = ServiceGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.forward_neighbors("missing").is_empty());
    }

    #[test]
    fn test_adjacency_both_directions() {
        let graph = ServiceGraph::from_snapshot(&snapshot(
            &["api", "auth", "db"],
            &[("e1", "api", "db"), ("e2", "api", "auth"), ("e3", "auth", "db")],
        ));

        assert_eq!(graph.forward_neighbors("api"), vec!["auth", "db"]);
        assert_eq!(graph.reverse_neighbors("db"), vec!["api", "auth"]);
        assert!(graph.reverse_neighbors("api").is_empty());
    }

    #[test]
    fn test_unknown_endpoints_dropped() {
        let graph = ServiceGraph::from_snapshot(&snapshot(
            &["api", "db"],
            &[("e1", "api", "db"), ("e2", "api", "ghost"), ("e3", "ghost", "db")],
        ));

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edge_by_id("e2").is_none());
        assert_eq!(graph.reverse_neighbors("db"), vec!["api"]);
    }

    #[test]
    fn test_duplicate_node_last_write_wins() {
        let mut snap = snapshot(&["api", "db"], &[]);
        snap.nodes.push(ServiceNode::new("api", "gateway"));

        let graph = ServiceGraph::from_snapshot(&snap);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.get_by_id("api").unwrap().kind, "gateway");
        assert_eq!(graph.get_index("api"), Some(NodeId::new(0)));
    }

    #[test]
    fn test_parallel_edges_first_wins_for_lookup() {
        let mut snap = snapshot(&["a", "b"], &[]);
        snap.edges
            .push(ServiceRelationship::new("slow", "a", "b", "http").with_latency(500.0));
        snap.edges
            .push(ServiceRelationship::new("fast", "a", "b", "grpc").with_latency(5.0));

        let graph = ServiceGraph::from_snapshot(&snap);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edge_between("a", "b").unwrap().id, "slow");
        assert_eq!(graph.edge_by_id("fast").unwrap().kind, "grpc");
        // Parallel edges collapse to one adjacency entry.
        assert_eq!(graph.forward_neighbors("a"), vec!["b"]);
    }

    #[test]
    fn test_stats() {
        let graph = ServiceGraph::from_snapshot(&snapshot(
            &["a", "b", "c", "lonely"],
            &[("e1", "a", "b"), ("e2", "b", "c")],
        ));

        let stats = graph.stats();
        assert_eq!(stats.node_count, 4);
        assert_eq!(stats.edge_count, 2);
        assert_eq!(stats.root_count, 2); // a, lonely
        assert_eq!(stats.leaf_count, 2); // c, lonely
    }
}
