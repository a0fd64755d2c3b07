//! Directed relationships between services.

use serde::{Deserialize, Serialize};

/// A directed edge: `source` depends on or calls `target`.
///
/// The optional measurements feed the edge cost model used for path
/// finding. They are kept raw here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRelationship {
    pub id: String,
    pub source: String,
    pub target: String,

    /// Relationship type, e.g. "http", "grpc", "reads".
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Observed latency in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,

    /// Fraction of failed calls, 0 to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_rate: Option<f64>,

    /// Request count over the catalog's sampling window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_volume: Option<f64>,
}

impl ServiceRelationship {
    /// Creates an edge without measurements.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind: kind.into(),
            latency: None,
            error_rate: None,
            traffic_volume: None,
        }
    }

    pub fn with_latency(mut self, latency_ms: f64) -> Self {
        self.latency = Some(latency_ms);
        self
    }

    pub fn with_error_rate(mut self, error_rate: f64) -> Self {
        self.error_rate = Some(error_rate);
        self
    }

    pub fn with_traffic_volume(mut self, traffic_volume: f64) -> Self {
        self.traffic_volume = Some(traffic_volume);
        self
    }
}
