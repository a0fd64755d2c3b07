//! Servicemap Core - Service topology data model
//!
//! This crate defines the records that describe a service topology:
//! services (nodes), the directed relationships between them (edges),
//! and the snapshot that bundles both for the analysis engine.
//!
//! Everything here is plain data. The analysis engine only reads it.
//!
//! # Example
//!
//! ```
//! use servicemap_core::{Criticality, ServiceNode, ServiceRelationship, TopologySnapshot};
//!
//! let api = ServiceNode::new("api", "service").with_criticality(Criticality::Critical);
//! let db = ServiceNode::new("db", "database");
//! let edge = ServiceRelationship::new("e1", "api", "db", "reads").with_latency(40.0);
//!
//! let snapshot = TopologySnapshot::new(vec![api, db], vec![edge]);
//! assert_eq!(snapshot.nodes.len(), 2);
//! ```

mod node;
mod relationship;
mod snapshot;

pub use node::{Criticality, HealthStatus, ServiceNode};
pub use relationship::ServiceRelationship;
pub use snapshot::TopologySnapshot;
