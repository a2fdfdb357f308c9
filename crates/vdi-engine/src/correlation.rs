//! Correlation validator
//!
//! Checks whether two related parameters maintain their expected
//! statistical relationship, gated by driving-condition predicates.
//! Windowed kinds use a Pearson coefficient over the recent paired-sample
//! window; conditional/complex kinds use an instantaneous ratio between
//! the two current values.

use vdi_core::{CorrelationRule, GateCondition};

use crate::condition::{compare_scalar, EQ_EPSILON};
use crate::config::EngineConfig;
use crate::rule::Snapshot;
use crate::store::SampleStore;

/// Result of validating one correlation
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationOutcome {
    /// Whether the correlation was evaluated at all (gates held and the
    /// window was sufficient)
    pub applicable: bool,
    /// Observed coefficient or ratio
    pub observed: f64,
    /// `|observed − expected|`
    pub deviation: f64,
    /// Whether the deviation exceeds the rule's tolerance
    pub anomalous: bool,
}

impl CorrelationOutcome {
    fn not_applicable() -> Self {
        Self {
            applicable: false,
            observed: 0.0,
            deviation: 0.0,
            anomalous: false,
        }
    }
}

/// Evaluate one correlation rule against the session's current state
pub fn evaluate(
    rule: &CorrelationRule,
    snapshot: &Snapshot,
    store: &SampleStore,
    config: &EngineConfig,
) -> CorrelationOutcome {
    // All gates must hold before anything is computed
    if !rule.gates.iter().all(|g| gate_holds(g, snapshot)) {
        return CorrelationOutcome::not_applicable();
    }

    let observed = if rule.kind.uses_coefficient() {
        let pairs = store.paired_window(&rule.pid_a, &rule.pid_b, config.correlation_window);
        if pairs.len() < config.min_correlation_samples {
            // Insufficient window: never a computed false anomaly
            return CorrelationOutcome::not_applicable();
        }
        match pearson(&pairs) {
            Some(r) => r,
            // Zero variance on either side: coefficient undefined
            None => return CorrelationOutcome::not_applicable(),
        }
    } else {
        // Conditional/complex kinds: instantaneous ratio a/b against the
        // expected coefficient
        let (Some(&a), Some(&b)) = (snapshot.get(&rule.pid_a), snapshot.get(&rule.pid_b)) else {
            return CorrelationOutcome::not_applicable();
        };
        if b.abs() < EQ_EPSILON {
            return CorrelationOutcome::not_applicable();
        }
        a / b
    };

    let deviation = (observed - rule.expected_coefficient).abs();
    CorrelationOutcome {
        applicable: true,
        observed,
        deviation,
        anomalous: deviation > rule.tolerance,
    }
}

/// Gates are plain snapshot comparisons; a missing parameter fails the
/// gate (the correlation is simply not applicable yet)
fn gate_holds(gate: &GateCondition, snapshot: &Snapshot) -> bool {
    snapshot
        .get(&gate.pid)
        .and_then(|&current| compare_scalar(gate.op, current, gate.value))
        .unwrap_or(false)
}

/// Pearson correlation coefficient over value pairs
///
/// Returns `None` when either series has zero variance.
fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (a, b) in pairs {
        let da = a - mean_a;
        let db = b - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom < EQ_EPSILON {
        return None;
    }
    Some(cov / denom)
}
