//! The analyzer facade: one graph snapshot plus its query cache.
//!
//! Queries take `&self` and may run concurrently; the cache is behind a
//! mutex. Replacing the graph takes `&mut self`, so under a
//! [`SharedAnalyzer`] it holds the write lock for the whole rebuild and
//! readers never see a new graph with old cache entries.

use crate::cache::{CacheStats, QueryCache};
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};
use crate::graph::ServiceGraph;
use crate::impact::ImpactAnalysis;
use crate::layering::{CriticalPath, DependencyLevels};
use crate::paths::ServicePath;
use crate::ranking::{
    compute_centrality, find_bottlenecks, find_critical_dependencies, Bottleneck,
    CentralityScores, CriticalDependency,
};
use serde::{Deserialize, Serialize};
use servicemap_core::TopologySnapshot;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Analyzer shared between threads.
///
/// Hold the read guard for the duration of a query and the write guard
/// for the whole of `update_graph`.
pub type SharedAnalyzer = Arc<RwLock<TopologyAnalyzer>>;

/// Structural overview of the whole graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyAnalysis {
    pub cycles: Vec<Vec<String>>,
    pub levels: DependencyLevels,
    pub critical_dependencies: Vec<CriticalDependency>,
    pub bottlenecks: Vec<Bottleneck>,
}

/// Analysis engine over one service topology snapshot.
#[derive(Debug)]
pub struct TopologyAnalyzer {
    graph: ServiceGraph,
    cache: Mutex<QueryCache>,
    config: AnalyzerConfig,
}

impl TopologyAnalyzer {
    /// Builds an analyzer with the default configuration.
    pub fn new(snapshot: &TopologySnapshot) -> Self {
        Self::with_config(snapshot, AnalyzerConfig::default())
    }

    pub fn with_config(snapshot: &TopologySnapshot, config: AnalyzerConfig) -> Self {
        let graph = ServiceGraph::from_snapshot(snapshot);
        info!(
            "Loaded topology: {} services, {} relationships",
            graph.node_count(),
            graph.edge_count()
        );

        Self {
            graph,
            cache: Mutex::new(QueryCache::new()),
            config,
        }
    }

    /// Wraps the analyzer for sharing across threads.
    pub fn into_shared(self) -> SharedAnalyzer {
        Arc::new(RwLock::new(self))
    }

    /// Replaces the graph with a new snapshot and empties the cache.
    pub fn update_graph(&mut self, snapshot: &TopologySnapshot) {
        let graph = ServiceGraph::from_snapshot(snapshot);
        let cache = self.cache.get_mut().unwrap_or_else(PoisonError::into_inner);

        self.graph = graph;
        cache.clear();

        info!(
            "Replaced topology: {} services, {} relationships",
            self.graph.node_count(),
            self.graph.edge_count()
        );
    }

    pub fn graph(&self) -> &ServiceGraph {
        &self.graph
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Cheapest path between two services. Cached per ordered pair.
    pub fn find_shortest_path(&self, source: &str, target: &str) -> Option<ServicePath> {
        if let Some(cached) = self.cache().shortest_path(source, target) {
            return cached;
        }

        let path = self.graph.shortest_path(source, target);
        self.cache()
            .store_shortest_path(source, target, path.clone());
        path
    }

    /// Every simple path of at most `max_length` hops, fewest hops first.
    pub fn find_all_paths(
        &self,
        source: &str,
        target: &str,
        max_length: usize,
    ) -> Result<Vec<ServicePath>> {
        if let Some(cached) = self.cache().all_paths(source, target, max_length) {
            return Ok(cached);
        }

        self.guard("find_all_paths")?;
        let paths = self.graph.all_paths(source, target, max_length);
        self.cache()
            .store_all_paths(source, target, max_length, paths.clone());
        Ok(paths)
    }

    /// [`find_all_paths`](Self::find_all_paths) with the configured hop limit.
    pub fn find_all_paths_default(&self, source: &str, target: &str) -> Result<Vec<ServicePath>> {
        self.find_all_paths(source, target, self.config.max_path_length)
    }

    /// Blast radius and risk of `id` failing. Cached per service.
    pub fn analyze_impact(&self, id: &str) -> Result<ImpactAnalysis> {
        if let Some(cached) = self.cache().impact(id) {
            return Ok(cached);
        }

        let analysis = self.graph.analyze_impact(id)?;
        debug!(
            "Impact of {}: {} affected, risk {}",
            id, analysis.total_affected, analysis.risk_score
        );
        self.cache().store_impact(analysis.clone());
        Ok(analysis)
    }

    /// Cyclic groups of services.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        self.graph.detect_cycles()
    }

    /// Services grouped by distance from the nearest root.
    pub fn dependency_levels(&self) -> DependencyLevels {
        self.graph.dependency_levels()
    }

    /// Betweenness centrality of every service.
    pub fn centrality(&self) -> Result<CentralityScores> {
        self.guard("centrality")?;
        Ok(compute_centrality(&self.graph))
    }

    /// Longest weighted path, or a centrality ranking on cyclic graphs.
    pub fn find_critical_path(&self) -> Result<CriticalPath> {
        self.guard("find_critical_path")?;
        // Centrality is only needed for the cyclic fallback.
        let centrality = if self.graph.topological_order().is_some() {
            CentralityScores::default()
        } else {
            compute_centrality(&self.graph)
        };
        Ok(self
            .graph
            .critical_path(&centrality, self.config.critical_path_fallback_limit))
    }

    /// Edges touching critical or highly central services.
    pub fn find_critical_dependencies(&self) -> Result<Vec<CriticalDependency>> {
        let centrality = self.centrality()?;
        Ok(self.critical_dependencies_from(&centrality))
    }

    /// Services with outlying centrality, highest first.
    pub fn find_bottlenecks(&self) -> Result<Vec<Bottleneck>> {
        let centrality = self.centrality()?;
        Ok(self.bottlenecks_from(&centrality))
    }

    /// Cycles, levels, critical dependencies and bottlenecks in one go.
    pub fn analyze_dependencies(&self) -> Result<DependencyAnalysis> {
        self.guard("analyze_dependencies")?;
        let centrality = compute_centrality(&self.graph);

        Ok(DependencyAnalysis {
            cycles: self.detect_cycles(),
            levels: self.dependency_levels(),
            critical_dependencies: self.critical_dependencies_from(&centrality),
            bottlenecks: self.bottlenecks_from(&centrality),
        })
    }

    /// Empties every cache namespace.
    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }

    fn critical_dependencies_from(&self, centrality: &CentralityScores) -> Vec<CriticalDependency> {
        find_critical_dependencies(
            &self.graph,
            centrality,
            self.config.critical_centrality_threshold,
        )
    }

    fn bottlenecks_from(&self, centrality: &CentralityScores) -> Vec<Bottleneck> {
        find_bottlenecks(centrality, self.config.bottleneck_top_fraction)
    }

    /// Rejects all-pairs and enumeration queries on oversized graphs.
    fn guard(&self, operation: &'static str) -> Result<()> {
        let nodes = self.graph.node_count();
        let limit = self.config.max_nodes;
        if nodes > limit {
            warn!(
                "Refusing {} on {} services (limit {})",
                operation, nodes, limit
            );
            return Err(AnalysisError::GraphTooLarge {
                operation,
                nodes,
                limit,
            });
        }
        Ok(())
    }

    fn cache(&self) -> MutexGuard<'_, QueryCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use servicemap_core::{ServiceNode, ServiceRelationship};

    fn snapshot(nodes: &[&str], edges: &[(&str, &str)]) -> TopologySnapshot {
        TopologySnapshot::new(
            nodes.iter().map(|id| ServiceNode::new(*id, "service")).collect(),
            edges
                .iter()
                .enumerate()
                .map(|(i, (s, t))| ServiceRelationship::new(format!("e{}", i), *s, *t, "http"))
                .collect(),
        )
    }

    #[test]
    fn test_shortest_path_cached() {
        let analyzer = TopologyAnalyzer::new(&snapshot(&["a", "b"], &[("a", "b")]));

        let first = analyzer.find_shortest_path("a", "b");
        let second = analyzer.find_shortest_path("a", "b");
        assert_eq!(first, second);

        let stats = analyzer.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_update_graph_invalidates_cache() {
        let mut analyzer = TopologyAnalyzer::new(&snapshot(&["a", "b"], &[("a", "b")]));
        assert!(analyzer.find_shortest_path("a", "b").is_some());
        assert_eq!(analyzer.analyze_impact("a").unwrap().total_affected, 1);

        analyzer.update_graph(&snapshot(&["a", "b"], &[("b", "a")]));

        assert_eq!(analyzer.cache_stats(), CacheStats::default());
        assert!(analyzer.find_shortest_path("a", "b").is_none());
        assert_eq!(analyzer.analyze_impact("a").unwrap().total_affected, 0);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let analyzer = TopologyAnalyzer::new(&snapshot(&["a"], &[]));
        assert!(analyzer.analyze_impact("ghost").is_err());
        assert_eq!(analyzer.cache_stats().entries, 0);
    }

    #[test]
    fn test_node_guard() {
        let config = AnalyzerConfig {
            max_nodes: 2,
            ..AnalyzerConfig::default()
        };
        let analyzer =
            TopologyAnalyzer::with_config(&snapshot(&["a", "b", "c"], &[("a", "b")]), config);

        assert_eq!(
            analyzer.analyze_dependencies(),
            Err(AnalysisError::GraphTooLarge {
                operation: "analyze_dependencies",
                nodes: 3,
                limit: 2
            })
        );
        assert!(analyzer.find_all_paths("a", "b", 5).is_err());
        // Linear queries are not guarded
        assert!(analyzer.find_shortest_path("a", "b").is_some());
        assert!(analyzer.detect_cycles().is_empty());
    }

    #[test]
    fn test_shared_analyzer_update() {
        let shared = TopologyAnalyzer::new(&snapshot(&["a"], &[])).into_shared();

        {
            let mut writer = shared.write().unwrap();
            writer.update_graph(&snapshot(&["a", "b"], &[("a", "b")]));
        }

        let reader = shared.read().unwrap();
        assert_eq!(reader.graph().node_count(), 2);
        assert_eq!(reader.analyze_impact("a").unwrap().direct_impact, vec!["b"]);
    }
}
