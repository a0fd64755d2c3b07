//! Impact analysis for service failures.
//!
//! This module walks the graph downstream from a service to find
//! everything that depends on it being up. It answers the question:
//! "What breaks if this service goes down?"

use crate::error::{AnalysisError, Result};
use crate::graph::{NodeId, ServiceGraph};
use serde::{Deserialize, Serialize};
use servicemap_core::{Criticality, HealthStatus, ServiceNode};
use std::collections::VecDeque;

/// Upper bound of the risk score.
pub const MAX_RISK_SCORE: u32 = 100;

/// A service reached from the analyzed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedService {
    pub id: String,
    /// Number of edges from the analyzed service to this one.
    pub hop_distance: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criticality: Option<Criticality>,
}

/// Complete impact analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    /// The service being analyzed.
    pub node: String,
    /// Services one hop downstream, ordered by id. A self-loop does not
    /// make a service its own dependent, so the service never appears here.
    pub direct_impact: Vec<String>,
    /// Services reachable only through others, ordered by id.
    pub indirect_impact: Vec<String>,
    /// Every reachable service, ordered by hop distance then id.
    pub affected: Vec<AffectedService>,
    /// Total count of affected services.
    pub total_affected: usize,
    /// Longest chain of downstream hops found from the service.
    ///
    /// Exact on acyclic downstream regions; only indicative when the
    /// region contains cycles.
    pub critical_path: Vec<String>,
    /// Failure risk, 0 to 100.
    pub risk_score: u32,
}

/// Scores the risk of `source` failing given the services it affects.
///
/// ```text
/// score  = weight(source criticality, default MEDIUM)
/// score += min(affected * 0.5, 10)
/// score += sum(weight(affected criticality, default LOW) * 0.2)
/// score *= 1.5 if unhealthy, 1.2 if degraded
/// risk   = min(round(score * 2), 100)
/// ```
pub fn risk_score<'a>(
    source: &ServiceNode,
    affected: impl IntoIterator<Item = &'a ServiceNode>,
) -> u32 {
    let mut score = source.criticality_or(Criticality::Medium).weight();

    let mut count = 0usize;
    let mut downstream_weight = 0.0;
    for node in affected {
        count += 1;
        downstream_weight += node.criticality_or(Criticality::Low).weight() * 0.2;
    }

    score += (count as f64 * 0.5).min(10.0);
    score += downstream_weight;

    match source.health {
        Some(HealthStatus::Unhealthy) => score *= 1.5,
        Some(HealthStatus::Degraded) => score *= 1.2,
        _ => {}
    }

    ((score * 2.0).round().max(0.0) as u32).min(MAX_RISK_SCORE)
}

impl ServiceGraph {
    /// Analyzes the blast radius of a service failing.
    ///
    /// Errors with `NodeNotFound` when `id` is not in the graph.
    pub fn analyze_impact(&self, id: &str) -> Result<ImpactAnalysis> {
        let target = self
            .get_index(id)
            .ok_or_else(|| AnalysisError::NodeNotFound(id.to_string()))?;
        let source = &self.graph[target];

        let direct: Vec<NodeId> = self
            .successors(target)
            .iter()
            .copied()
            .filter(|&next| next != target)
            .collect();

        let reached = self.bfs_downstream(target);

        let mut indirect: Vec<&str> = reached
            .iter()
            .filter(|(index, _)| !direct.contains(index))
            .map(|&(index, _)| self.id_of(index))
            .collect();
        indirect.sort();

        let affected: Vec<AffectedService> = reached
            .iter()
            .map(|&(index, hops)| AffectedService {
                id: self.id_of(index).to_string(),
                hop_distance: hops,
                criticality: self.graph[index].criticality,
            })
            .collect();

        let risk = risk_score(source, reached.iter().map(|&(index, _)| &self.graph[index]));

        Ok(ImpactAnalysis {
            node: source.id.clone(),
            direct_impact: direct
                .iter()
                .map(|&index| self.id_of(index).to_string())
                .collect(),
            indirect_impact: indirect.into_iter().map(str::to_string).collect(),
            total_affected: affected.len(),
            affected,
            critical_path: self.longest_downstream_chain(target),
            risk_score: risk,
        })
    }

    /// BFS over outgoing edges, excluding the start node.
    ///
    /// Returns `(node, hop distance)` sorted by distance then id.
    fn bfs_downstream(&self, start: NodeId) -> Vec<(NodeId, usize)> {
        let mut visited = vec![false; self.node_count()];
        let mut queue = VecDeque::new();
        let mut result = Vec::new();

        visited[start.index()] = true;
        queue.push_back((start, 0usize));

        while let Some((current, depth)) = queue.pop_front() {
            if current != start {
                result.push((current, depth));
            }
            for &next in self.successors(current) {
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    queue.push_back((next, depth + 1));
                }
            }
        }

        result.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| self.id_of(a.0).cmp(self.id_of(b.0))));
        result
    }

    /// Longest downstream chain by BFS relaxation.
    ///
    /// A node's distance is raised, and the node re-queued, whenever a
    /// longer route to it appears. A node already on the current node's
    /// predecessor chain is never relaxed, so the predecessor links form
    /// a tree rooted at `start` and every chain is a simple path. Each
    /// distance is bounded by its depth in that tree, which bounds the
    /// work on cyclic regions. Exact on acyclic downstream regions.
    fn longest_downstream_chain(&self, start: NodeId) -> Vec<String> {
        let count = self.node_count();
        let mut dist: Vec<Option<usize>> = vec![None; count];
        let mut prev: Vec<Option<NodeId>> = vec![None; count];
        let mut queue = VecDeque::new();

        dist[start.index()] = Some(0);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let Some(depth) = dist[current.index()] else {
                continue;
            };
            let candidate = depth + 1;

            for &next in self.successors(current) {
                if on_chain(&prev, current, next) {
                    continue;
                }
                if dist[next.index()].map_or(true, |existing| candidate > existing) {
                    dist[next.index()] = Some(candidate);
                    prev[next.index()] = Some(current);
                    queue.push_back(next);
                }
            }
        }

        // Farthest node; lowest id among equals.
        let mut end = start;
        for index in self.node_indexes() {
            let Some(d) = dist[index.index()] else {
                continue;
            };
            let best = dist[end.index()].unwrap_or(0);
            if d > best || (d == best && d > 0 && self.id_of(index) < self.id_of(end)) {
                end = index;
            }
        }

        let mut chain = vec![end];
        let mut cursor = end;
        while let Some(parent) = prev[cursor.index()] {
            chain.push(parent);
            cursor = parent;
        }
        chain.reverse();

        chain
            .into_iter()
            .map(|index| self.id_of(index).to_string())
            .collect()
    }
}

/// True when `node` is `from` or one of its predecessors.
fn on_chain(prev: &[Option<NodeId>], from: NodeId, node: NodeId) -> bool {
    let mut cursor = Some(from);
    while let Some(current) = cursor {
        if current == node {
            return true;
        }
        cursor = prev[current.index()];
    }
    false
}
