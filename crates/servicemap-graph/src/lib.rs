//! Servicemap Graph - Service dependency analysis
//!
//! This crate holds a service topology snapshot as a graph and answers
//! structural questions about it: cheapest routes between services,
//! dependency cycles, depth levels, centrality, critical edges, and the
//! blast radius of a failing service.
//!
//! # Architecture
//!
//! The graph uses petgraph internally with additional indexes for:
//! - Id-based lookups
//! - First-edge-per-pair weight lookups
//! - Id-ordered adjacency in both directions (deterministic traversals)
//!
//! [`TopologyAnalyzer`] wraps one graph with a query cache. The graph is
//! never mutated; a new snapshot replaces it and empties the cache.
//!
//! # Example
//!
//! ```
//! use servicemap_core::{ServiceNode, ServiceRelationship, TopologySnapshot};
//! use servicemap_graph::TopologyAnalyzer;
//!
//! let snapshot = TopologySnapshot::new(
//!     vec![ServiceNode::new("api", "service"), ServiceNode::new("db", "database")],
//!     vec![ServiceRelationship::new("e1", "api", "db", "reads")],
//! );
//!
//! let analyzer = TopologyAnalyzer::new(&snapshot);
//! let path = analyzer.find_shortest_path("api", "db").unwrap();
//! assert_eq!(path.hops, 1);
//!
//! let impact = analyzer.analyze_impact("api").unwrap();
//! assert_eq!(impact.direct_impact, vec!["db"]);
//! ```

mod analyzer;
mod builder;
mod cache;
mod config;
mod cycles;
mod error;
mod graph;
mod impact;
mod layering;
mod paths;
mod ranking;

pub use analyzer::{DependencyAnalysis, SharedAnalyzer, TopologyAnalyzer};
pub use builder::GraphBuilder;
pub use cache::{CacheStats, QueryCache};
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, Result};
pub use graph::{GraphStats, NodeId, ServiceGraph};
pub use impact::{risk_score, AffectedService, ImpactAnalysis, MAX_RISK_SCORE};
pub use layering::{CriticalPath, DependencyLevels};
pub use paths::{edge_weight, ServicePath, DEFAULT_EDGE_WEIGHT, MIN_EDGE_WEIGHT};
pub use ranking::{
    compute_centrality, find_bottlenecks, find_critical_dependencies, Bottleneck,
    CentralityScores, CriticalDependency, CriticalReason,
};
