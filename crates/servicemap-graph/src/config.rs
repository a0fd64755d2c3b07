//! Analyzer configuration.

use serde::{Deserialize, Serialize};

/// Tunables for a [`TopologyAnalyzer`](crate::TopologyAnalyzer).
///
/// Every field has a default, so a partial JSON document is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Hop limit used by `find_all_paths_default`.
    pub max_path_length: usize,

    /// Mean endpoint centrality above which an edge is critical.
    pub critical_centrality_threshold: f64,

    /// Share of the centrality ranking whose boundary sets the
    /// bottleneck cutoff.
    pub bottleneck_top_fraction: f64,

    /// Nodes returned by the centrality ranking that stands in for a
    /// critical path on cyclic graphs.
    pub critical_path_fallback_limit: usize,

    /// Largest graph the all-pairs and path-enumeration queries accept.
    pub max_nodes: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_path_length: 10,
            critical_centrality_threshold: 0.1,
            bottleneck_top_fraction: 0.1,
            critical_path_fallback_limit: 10,
            max_nodes: 500,
        }
    }
}
