//! Weighted path finding between services.
//!
//! Edge cost blends latency, unreliability and (inversely) traffic into
//! one positive number, so "shortest" means "cheapest to traverse".

use crate::graph::{NodeId, ServiceGraph};
use serde::{Deserialize, Serialize};
use servicemap_core::ServiceRelationship;

/// Cost of a hop with no recorded relationship.
pub const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

/// Floor applied to every computed edge cost.
pub const MIN_EDGE_WEIGHT: f64 = 0.1;

/// Computes the traversal cost of a relationship.
///
/// ```text
/// weight = 1 + latency / 100 + error_rate * 10
/// weight *= 1 / ln(traffic_volume + 1)
/// weight = max(weight, 0.1)
/// ```
///
/// Absent measurements contribute nothing. A traffic volume of zero
/// counts as absent.
pub fn edge_weight(edge: &ServiceRelationship) -> f64 {
    let mut weight = 1.0;

    if let Some(latency) = edge.latency {
        weight += latency / 100.0;
    }
    if let Some(error_rate) = edge.error_rate {
        weight += error_rate * 10.0;
    }
    if let Some(traffic) = edge.traffic_volume.filter(|volume| *volume > 0.0) {
        weight *= 1.0 / (traffic + 1.0).ln();
    }

    weight.max(MIN_EDGE_WEIGHT)
}

/// A path through the graph with its cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePath {
    /// Service ids from source to target, both inclusive.
    pub nodes: Vec<String>,
    /// Sum of edge weights along the path.
    pub cost: f64,
    /// Number of edges traversed.
    pub hops: usize,
}

impl ServiceGraph {
    /// Weight of the hop `from -> to`, using the first edge for the pair.
    pub fn weight_between(&self, from: NodeId, to: NodeId) -> f64 {
        self.edge_between_indexes(from, to)
            .map(edge_weight)
            .unwrap_or(DEFAULT_EDGE_WEIGHT)
    }

    /// Finds the cheapest path from `source` to `target`.
    ///
    /// Dijkstra with a linear scan for the next node; among equally
    /// distant candidates the lowest id is settled first. Returns `None`
    /// when either endpoint is unknown or `target` is unreachable.
    pub fn shortest_path(&self, source: &str, target: &str) -> Option<ServicePath> {
        let from = self.get_index(source)?;
        let to = self.get_index(target)?;

        let count = self.node_count();
        let mut dist = vec![f64::INFINITY; count];
        let mut prev: Vec<Option<NodeId>> = vec![None; count];
        let mut settled = vec![false; count];
        dist[from.index()] = 0.0;

        while let Some(current) = self.closest_unsettled(&dist, &settled) {
            if current == to {
                break;
            }
            settled[current.index()] = true;

            for &next in self.successors(current) {
                if settled[next.index()] {
                    continue;
                }
                let candidate = dist[current.index()] + self.weight_between(current, next);
                if candidate < dist[next.index()] {
                    dist[next.index()] = candidate;
                    prev[next.index()] = Some(current);
                }
            }
        }

        if dist[to.index()].is_infinite() {
            return None;
        }

        let mut indexes = vec![to];
        let mut cursor = to;
        while let Some(parent) = prev[cursor.index()] {
            indexes.push(parent);
            cursor = parent;
        }
        indexes.reverse();

        Some(ServicePath {
            hops: indexes.len() - 1,
            cost: dist[to.index()],
            nodes: self.path_ids(&indexes),
        })
    }

    /// Picks the unsettled node with the smallest finite distance.
    fn closest_unsettled(&self, dist: &[f64], settled: &[bool]) -> Option<NodeId> {
        let mut best: Option<NodeId> = None;

        for index in self.node_indexes() {
            let i = index.index();
            if settled[i] || dist[i].is_infinite() {
                continue;
            }
            best = match best {
                Some(current)
                    if dist[current.index()] < dist[i]
                        || (dist[current.index()] == dist[i]
                            && self.id_of(current) < self.id_of(index)) =>
                {
                    Some(current)
                }
                _ => Some(index),
            };
        }

        best
    }

    /// Enumerates every simple path from `source` to `target` with at
    /// most `max_length` hops, sorted by hop count.
    ///
    /// The search is exhaustive and exponential in the worst case.
    /// Neighbors are explored in id order and the sort is stable, so the
    /// output is deterministic.
    pub fn all_paths(&self, source: &str, target: &str, max_length: usize) -> Vec<ServicePath> {
        let (Some(from), Some(to)) = (self.get_index(source), self.get_index(target)) else {
            return Vec::new();
        };

        if from == to {
            return vec![self.make_path(&[from])];
        }

        let mut found = Vec::new();
        let mut on_path = vec![false; self.node_count()];
        let mut path = vec![from];
        on_path[from.index()] = true;

        // Work stack frame: (node, position in its successor list)
        let mut stack: Vec<(NodeId, usize)> = vec![(from, 0)];

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let successors = self.successors(node);

            if path.len() - 1 >= max_length || frame.1 >= successors.len() {
                stack.pop();
                path.pop();
                on_path[node.index()] = false;
                continue;
            }

            let next = successors[frame.1];
            frame.1 += 1;

            if on_path[next.index()] {
                continue;
            }
            if next == to {
                path.push(next);
                found.push(self.make_path(&path));
                path.pop();
                continue;
            }

            path.push(next);
            on_path[next.index()] = true;
            stack.push((next, 0));
        }

        found.sort_by_key(|p| p.hops);
        found
    }

    fn make_path(&self, indexes: &[NodeId]) -> ServicePath {
        let cost = indexes
            .windows(2)
            .map(|pair| self.weight_between(pair[0], pair[1]))
            .sum();

        ServicePath {
            nodes: self.path_ids(indexes),
            cost,
            hops: indexes.len().saturating_sub(1),
        }
    }

    fn path_ids(&self, indexes: &[NodeId]) -> Vec<String> {
        indexes
            .iter()
            .map(|&index| self.id_of(index).to_string())
            .collect()
    }
}
