//! Service nodes and the tags attached to them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Business importance of a service.
///
/// Ordered from most to least important so sorting puts critical
/// services first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Criticality {
    Critical,
    High,
    Medium,
    Low,
    Minimal,
}

impl Criticality {
    /// Weight of this level in risk scoring.
    pub fn weight(self) -> f64 {
        match self {
            Criticality::Critical => 10.0,
            Criticality::High => 7.0,
            Criticality::Medium => 5.0,
            Criticality::Low => 3.0,
            Criticality::Minimal => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Criticality::Critical => "CRITICAL",
            Criticality::High => "HIGH",
            Criticality::Medium => "MEDIUM",
            Criticality::Low => "LOW",
            Criticality::Minimal => "MINIMAL",
        }
    }
}

impl std::fmt::Display for Criticality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Last observed health of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A service in the topology.
///
/// `criticality` and `health` are optional because catalogs often leave
/// them unset. Consumers decide what an absent value means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceNode {
    /// Unique, stable identifier.
    pub id: String,

    /// Type or category, e.g. "service", "database", "queue".
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criticality: Option<Criticality>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthStatus>,

    /// Free-form attributes carried through untouched.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ServiceNode {
    /// Creates a node with no criticality, health or metadata.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            criticality: None,
            health: None,
            metadata: Map::new(),
        }
    }

    pub fn with_criticality(mut self, criticality: Criticality) -> Self {
        self.criticality = Some(criticality);
        self
    }

    pub fn with_health(mut self, health: HealthStatus) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Criticality, or `fallback` when the catalog left it unset.
    pub fn criticality_or(&self, fallback: Criticality) -> Criticality {
        self.criticality.unwrap_or(fallback)
    }
}
