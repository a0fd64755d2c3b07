//! Memoization of path and impact queries.
//!
//! Results depend only on the graph, so entries stay valid until the
//! graph is replaced. The owning analyzer clears everything at once.

use crate::impact::ImpactAnalysis;
use crate::paths::ServicePath;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Cache lookups since the last clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Per-analyzer cache with one namespace per query kind.
#[derive(Debug, Default)]
pub struct QueryCache {
    /// Keyed by ordered (source, target). `None` records "no path".
    shortest: HashMap<(String, String), Option<ServicePath>>,
    /// Keyed by (source, target, max hops).
    all_paths: HashMap<(String, String, usize), Vec<ServicePath>>,
    /// Keyed by node id.
    impact: HashMap<String, ImpactAnalysis>,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shortest_path(&mut self, source: &str, target: &str) -> Option<Option<ServicePath>> {
        let key = (source.to_string(), target.to_string());
        let cached = self.shortest.get(&key).cloned();
        self.record("shortest_path", cached.is_some());
        cached
    }

    pub fn store_shortest_path(&mut self, source: &str, target: &str, path: Option<ServicePath>) {
        self.shortest
            .insert((source.to_string(), target.to_string()), path);
    }

    pub fn all_paths(&mut self, source: &str, target: &str, max_length: usize) -> Option<Vec<ServicePath>> {
        let key = (source.to_string(), target.to_string(), max_length);
        let cached = self.all_paths.get(&key).cloned();
        self.record("all_paths", cached.is_some());
        cached
    }

    pub fn store_all_paths(
        &mut self,
        source: &str,
        target: &str,
        max_length: usize,
        paths: Vec<ServicePath>,
    ) {
        self.all_paths
            .insert((source.to_string(), target.to_string(), max_length), paths);
    }

    pub fn impact(&mut self, id: &str) -> Option<ImpactAnalysis> {
        let cached = self.impact.get(id).cloned();
        self.record("impact", cached.is_some());
        cached
    }

    pub fn store_impact(&mut self, analysis: ImpactAnalysis) {
        self.impact.insert(analysis.node.clone(), analysis);
    }

    /// Drops every entry in every namespace and resets the counters.
    pub fn clear(&mut self) {
        self.shortest.clear();
        self.all_paths.clear();
        self.impact.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.shortest.len() + self.all_paths.len() + self.impact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.len(),
        }
    }

    fn record(&mut self, namespace: &str, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        debug!("{} cache {}", namespace, if hit { "hit" } else { "miss" });
    }
}
