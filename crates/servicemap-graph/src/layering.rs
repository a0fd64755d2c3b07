//! Dependency depth: level assignment, topological order and the
//! critical (longest weighted) path.

use crate::graph::{NodeId, ServiceGraph};
use crate::ranking::CentralityScores;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::warn;

/// Services grouped by distance from the nearest root.
pub type DependencyLevels = BTreeMap<usize, Vec<String>>;

/// Result of a critical path query.
///
/// Cyclic graphs have no longest path, so they get a centrality ranking
/// instead. The two are different kinds of answer and are kept apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CriticalPath {
    /// Longest weighted path of an acyclic graph.
    Exact { nodes: Vec<String>, length: f64 },
    /// Most central services of a cyclic graph. Not a connected path.
    ApproximateCentralityRanking { nodes: Vec<String> },
}

impl CriticalPath {
    /// Service ids in the result, whichever variant it is.
    pub fn nodes(&self) -> &[String] {
        match self {
            CriticalPath::Exact { nodes, .. } => nodes,
            CriticalPath::ApproximateCentralityRanking { nodes } => nodes,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, CriticalPath::Exact { .. })
    }
}

impl ServiceGraph {
    /// Assigns each service its hop distance from the nearest root.
    ///
    /// Roots are services nothing points to. Multi-source BFS from all
    /// roots fixes a level the first time a node is reached. Services
    /// reachable from no root (e.g. inside a closed cycle) get no level.
    pub fn dependency_levels(&self) -> DependencyLevels {
        let mut level: Vec<Option<usize>> = vec![None; self.node_count()];
        let mut queue = VecDeque::new();
        let mut levels = DependencyLevels::new();

        for root in self.node_indexes() {
            if self.predecessors(root).is_empty() {
                level[root.index()] = Some(0);
                queue.push_back((root, 0));
            }
        }

        while let Some((current, depth)) = queue.pop_front() {
            levels
                .entry(depth)
                .or_default()
                .push(self.id_of(current).to_string());

            for &next in self.successors(current) {
                if level[next.index()].is_none() {
                    level[next.index()] = Some(depth + 1);
                    queue.push_back((next, depth + 1));
                }
            }
        }

        levels
    }

    /// Kahn's algorithm. Returns `None` when the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<NodeId>> {
        let mut in_degree: Vec<usize> = self
            .node_indexes()
            .map(|index| self.predecessors(index).len())
            .collect();

        let mut queue: VecDeque<NodeId> = self
            .node_indexes()
            .filter(|index| in_degree[index.index()] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.node_count());

        while let Some(current) = queue.pop_front() {
            order.push(current);
            for &next in self.successors(current) {
                in_degree[next.index()] -= 1;
                if in_degree[next.index()] == 0 {
                    queue.push_back(next);
                }
            }
        }

        (order.len() == self.node_count()).then_some(order)
    }

    /// Finds the longest weighted path through an acyclic graph.
    ///
    /// Returns `None` when the graph has a cycle.
    pub fn longest_path(&self) -> Option<(Vec<String>, f64)> {
        let order = self.topological_order()?;

        let count = self.node_count();
        let mut dist = vec![0.0; count];
        let mut prev: Vec<Option<NodeId>> = vec![None; count];

        for &current in &order {
            for &next in self.successors(current) {
                let candidate = dist[current.index()] + self.weight_between(current, next);
                if candidate > dist[next.index()] {
                    dist[next.index()] = candidate;
                    prev[next.index()] = Some(current);
                }
            }
        }

        let mut end: Option<NodeId> = None;
        for &index in &order {
            if end.map_or(true, |best| dist[index.index()] > dist[best.index()]) {
                end = Some(index);
            }
        }

        let Some(end) = end else {
            return Some((Vec::new(), 0.0));
        };

        let mut path = vec![end];
        let mut cursor = end;
        while let Some(parent) = prev[cursor.index()] {
            path.push(parent);
            cursor = parent;
        }
        path.reverse();

        let ids = path
            .into_iter()
            .map(|index| self.id_of(index).to_string())
            .collect();
        Some((ids, dist[end.index()]))
    }

    /// Longest weighted path, or on cyclic graphs the `fallback_limit`
    /// most central services.
    pub fn critical_path(&self, centrality: &CentralityScores, fallback_limit: usize) -> CriticalPath {
        if let Some((nodes, length)) = self.longest_path() {
            return CriticalPath::Exact { nodes, length };
        }

        warn!(
            "Graph has cycles; critical path replaced by top {} services by centrality",
            fallback_limit
        );

        CriticalPath::ApproximateCentralityRanking {
            nodes: centrality
                .ranked()
                .into_iter()
                .take(fallback_limit)
                .map(|(id, _)| id.to_string())
                .collect(),
        }
    }
}
