//! Graph builder for constructing the service graph from a snapshot.
//!
//! The builder takes nodes first, then resolves each relationship's
//! endpoint ids into graph edges.

use crate::graph::{NodeId, ServiceGraph};
use servicemap_core::{ServiceNode, ServiceRelationship};
use tracing::debug;

/// Builds a ServiceGraph from snapshot records.
///
/// The builder handles the two-pass process:
/// 1. Add all nodes to the graph
/// 2. Resolve relationships into edges, dropping dangling ones
pub struct GraphBuilder {
    graph: ServiceGraph,
    /// Relationships waiting for endpoint resolution.
    pending: Vec<ServiceRelationship>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            graph: ServiceGraph::new(),
            pending: Vec::new(),
        }
    }

    /// Adds services to the graph.
    ///
    /// A repeated id replaces the earlier node in place.
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = ServiceNode>) {
        for node in nodes {
            match self.graph.id_index.get(&node.id) {
                Some(&index) => self.graph.graph[index] = node,
                None => {
                    let id = node.id.clone();
                    let index = self.graph.graph.add_node(node);
                    self.graph.id_index.insert(id, index);
                }
            }
        }
    }

    /// Queues relationships for resolution in `build`.
    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = ServiceRelationship>) {
        self.pending.extend(edges);
    }

    /// Resolves queued relationships into graph edges.
    ///
    /// Relationships naming an unknown service are dropped, not reported.
    /// Returns the number dropped.
    fn resolve_edges(&mut self) -> usize {
        let mut dropped = 0;

        for edge in std::mem::take(&mut self.pending) {
            let from = self.graph.get_index(&edge.source);
            let to = self.graph.get_index(&edge.target);

            let (Some(from), Some(to)) = (from, to) else {
                debug!(
                    "Dropping relationship {} ({} -> {}): unknown endpoint",
                    edge.id, edge.source, edge.target
                );
                dropped += 1;
                continue;
            };

            let id = edge.id.clone();
            let index = self.graph.graph.add_edge(from, to, edge);
            self.graph.edge_index.insert(id, index);
            self.graph.pair_index.entry((from, to)).or_insert(index);
        }

        dropped
    }

    /// Projects the edge list into id-ordered adjacency sets.
    fn index_adjacency(&mut self) {
        let count = self.graph.node_count();
        let mut forward: Vec<Vec<NodeId>> = vec![Vec::new(); count];
        let mut reverse: Vec<Vec<NodeId>> = vec![Vec::new(); count];

        for &(from, to) in self.graph.pair_index.keys() {
            forward[from.index()].push(to);
            reverse[to.index()].push(from);
        }

        let graph = &self.graph.graph;
        for list in forward.iter_mut().chain(reverse.iter_mut()) {
            list.sort_by(|a, b| graph[*a].id.cmp(&graph[*b].id));
        }

        self.graph.forward = forward;
        self.graph.reverse = reverse;
    }

    /// Finishes building and returns the graph.
    pub fn build(mut self) -> ServiceGraph {
        let dropped = self.resolve_edges();
        self.index_adjacency();

        debug!(
            "Built service graph: {} nodes, {} edges ({} dropped)",
            self.graph.node_count(),
            self.graph.edge_count(),
            dropped
        );

        self.graph
    }
}
