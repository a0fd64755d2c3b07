//! A full topology snapshot as delivered by the catalog.

use crate::node::ServiceNode;
use crate::relationship::ServiceRelationship;
use serde::{Deserialize, Serialize};

/// Nodes and edges captured at one point in time.
///
/// The analyzer is always built from, and replaced by, a whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    #[serde(default)]
    pub nodes: Vec<ServiceNode>,
    #[serde(default)]
    pub edges: Vec<ServiceRelationship>,
}

impl TopologySnapshot {
    pub fn new(nodes: Vec<ServiceNode>, edges: Vec<ServiceRelationship>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
