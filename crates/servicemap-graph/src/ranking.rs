//! Betweenness centrality and the rankings derived from it.
//!
//! Centrality measures how often a service sits on the shortest routes
//! between other services. Services with high scores are structural
//! chokepoints: bottlenecks, and endpoints of critical dependencies.

use crate::graph::{NodeId, ServiceGraph};
use serde::{Deserialize, Serialize};
use servicemap_core::Criticality;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// Betweenness scores indexed by node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CentralityScores {
    /// `(service id, score)` in snapshot order.
    scores: Vec<(String, f64)>,
}

impl CentralityScores {
    /// Score of the node at `index`, 0.0 if out of range.
    pub fn get(&self, index: NodeId) -> f64 {
        self.scores
            .get(index.index())
            .map(|(_, score)| *score)
            .unwrap_or(0.0)
    }

    /// Score of the service with `id`.
    pub fn score(&self, id: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|(node, _)| node == id)
            .map(|(_, score)| *score)
    }

    /// Iterates `(id, score)` pairs in snapshot order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(id, score)| (id.as_str(), *score))
    }

    /// All scores, highest first; equal scores ordered by id.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| descending(a.1, b.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Unweighted distances and shortest-path counts from one source.
struct HopTable {
    dist: Vec<Option<usize>>,
    paths: Vec<f64>,
}

fn hop_table(graph: &ServiceGraph, source: NodeId) -> HopTable {
    let count = graph.node_count();
    let mut dist = vec![None; count];
    let mut paths = vec![0.0; count];
    let mut queue = VecDeque::new();

    dist[source.index()] = Some(0);
    paths[source.index()] = 1.0;
    queue.push_back(source);

    while let Some(current) = queue.pop_front() {
        let Some(depth) = dist[current.index()] else {
            continue;
        };
        for &next in graph.successors(current) {
            match dist[next.index()] {
                None => {
                    dist[next.index()] = Some(depth + 1);
                    paths[next.index()] = paths[current.index()];
                    queue.push_back(next);
                }
                Some(d) if d == depth + 1 => {
                    paths[next.index()] += paths[current.index()];
                }
                Some(_) => {}
            }
        }
    }

    HopTable { dist, paths }
}

/// Computes normalized betweenness centrality for every node.
///
/// For each ordered pair `(s, t)` with `k` minimum-hop paths, every
/// interior node gets `1/k` per path it lies on. A node `v` lies on
/// `paths(s, v) * paths(v, t)` of them whenever
/// `dist(s, v) + dist(v, t) == dist(s, t)`. Totals are scaled by
/// `2 / ((n - 1)(n - 2))` when `n > 2`.
///
/// Cubic in the node count.
pub fn compute_centrality(graph: &ServiceGraph) -> CentralityScores {
    let count = graph.node_count();
    let tables: Vec<HopTable> = graph
        .node_indexes()
        .map(|source| hop_table(graph, source))
        .collect();

    let mut totals = vec![0.0; count];

    for s in 0..count {
        for t in 0..count {
            if s == t {
                continue;
            }
            let Some(st) = tables[s].dist[t] else {
                continue;
            };
            let through_all = tables[s].paths[t];

            for (v, total) in totals.iter_mut().enumerate() {
                if v == s || v == t {
                    continue;
                }
                if let (Some(sv), Some(vt)) = (tables[s].dist[v], tables[v].dist[t]) {
                    if sv + vt == st {
                        *total += tables[s].paths[v] * tables[v].paths[t] / through_all;
                    }
                }
            }
        }
    }

    if count > 2 {
        let scale = 2.0 / ((count - 1) as f64 * (count - 2) as f64);
        for total in &mut totals {
            *total *= scale;
        }
    }

    CentralityScores {
        scores: graph
            .nodes()
            .zip(totals)
            .map(|(node, score)| (node.id.clone(), score))
            .collect(),
    }
}

/// Why an edge was flagged as a critical dependency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CriticalReason {
    /// One of the endpoints is tagged `CRITICAL`.
    CriticalEndpoint,
    /// The endpoints' mean centrality is above the threshold.
    HighCentrality { average: f64 },
}

/// An edge whose failure matters more than most.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalDependency {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: String,
    pub reason: CriticalReason,
}

/// Selects edges touching a `CRITICAL` service or joining two central
/// ones. Every retained edge is checked, parallel edges included, in
/// snapshot order.
pub fn find_critical_dependencies(
    graph: &ServiceGraph,
    centrality: &CentralityScores,
    threshold: f64,
) -> Vec<CriticalDependency> {
    graph
        .graph
        .edge_indices()
        .filter_map(|edge_index| {
            let (from, to) = graph.graph.edge_endpoints(edge_index)?;
            let edge = graph.graph.edge_weight(edge_index)?;

            let is_critical = |index: NodeId| {
                graph
                    .get(index)
                    .and_then(|node| node.criticality)
                    .is_some_and(|level| level == Criticality::Critical)
            };

            let reason = if is_critical(from) || is_critical(to) {
                CriticalReason::CriticalEndpoint
            } else {
                let average = (centrality.get(from) + centrality.get(to)) / 2.0;
                if average <= threshold {
                    return None;
                }
                CriticalReason::HighCentrality { average }
            };

            Some(CriticalDependency {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                kind: edge.kind.clone(),
                reason,
            })
        })
        .collect()
}

/// A service that sits on an unusual share of shortest routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub id: String,
    pub centrality: f64,
}

/// Returns services scoring strictly above the cutoff, highest first.
///
/// The cutoff is the score at rank `floor(n * top_fraction)` of the
/// descending ranking; with the default fraction of 0.1 that is the
/// 90th percentile.
pub fn find_bottlenecks(centrality: &CentralityScores, top_fraction: f64) -> Vec<Bottleneck> {
    let ranked = centrality.ranked();
    if ranked.is_empty() {
        return Vec::new();
    }

    let rank = ((ranked.len() as f64 * top_fraction).floor() as usize).min(ranked.len() - 1);
    let cutoff = ranked[rank].1;

    ranked
        .into_iter()
        .filter(|(_, score)| *score > cutoff)
        .map(|(id, centrality)| Bottleneck {
            id: id.to_string(),
            centrality,
        })
        .collect()
}
