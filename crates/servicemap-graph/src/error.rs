use thiserror::Error;

/// Errors raised by analyzer queries.
///
/// Each error is local to the query that produced it; the analyzer's
/// graph and caches are left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Graph too large for {operation}: {nodes} nodes exceeds limit of {limit}")]
    GraphTooLarge {
        operation: &'static str,
        nodes: usize,
        limit: usize,
    },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
