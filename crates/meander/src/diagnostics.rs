//! Run diagnostics: graph audits and timing metrics.
//!
//! These are permanent instrumentation, collected on every run. The audit
//! mirrors the post-construction invariant (a single 2-regular cycle); the
//! metrics separate the core algorithm from dispatch overhead (dtype
//! normalization, validation, alignment bookkeeping).
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Dimensions;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom("duration seconds must be finite and non-negative")
        })
    }
}

/// Wall-clock spans for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMetrics {
    /// Curve construction (and alignment, for multi-frame runs) only.
    #[serde(with = "duration_serde")]
    pub core: Duration,
    /// The whole dispatch, including validation and dtype normalization.
    #[serde(with = "duration_serde")]
    pub total: Duration,
}

/// Structural audit of the pixel graph after construction.
///
/// A correct run reports degree bounds `2/2` and a single component. The
/// audit is logged at debug level and checked against
/// [`CurveError::InvariantViolation`](crate::CurveError::InvariantViolation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphAudit {
    /// Pixel grid dimensions.
    pub dimensions: Dimensions,
    /// Number of super-nodes absorbed into the spanning tree.
    pub selected_nodes: usize,
    /// Smallest vertex degree observed.
    pub degree_min: usize,
    /// Largest vertex degree observed.
    pub degree_max: usize,
    /// Connected component count.
    pub components: usize,
}

impl GraphAudit {
    /// Whether the graph satisfies the single-cycle post-condition.
    #[must_use]
    pub const fn is_single_cycle(&self) -> bool {
        self.degree_min == 2 && self.degree_max == 2 && self.components == 1
    }
}

impl fmt::Display for GraphAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "grid {}: {} super-nodes selected, degree {}/{}, {} component(s)",
            self.dimensions,
            self.selected_nodes,
            self.degree_min,
            self.degree_max,
            self.components
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_single_cycle_requires_two_regular_and_connected() {
        let audit = GraphAudit {
            dimensions: Dimensions { rows: 4, cols: 4 },
            selected_nodes: 4,
            degree_min: 2,
            degree_max: 2,
            components: 1,
        };
        assert!(audit.is_single_cycle());
        assert!(!GraphAudit { components: 2, ..audit }.is_single_cycle());
        assert!(!GraphAudit { degree_max: 3, ..audit }.is_single_cycle());
        assert!(!GraphAudit { degree_min: 1, ..audit }.is_single_cycle());
    }

    #[test]
    fn metrics_serialize_durations_as_seconds() {
        let metrics = BuildMetrics {
            core: Duration::from_millis(250),
            total: Duration::from_millis(400),
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["core"], 0.25);
        assert_eq!(json["total"], 0.4);
    }
}
