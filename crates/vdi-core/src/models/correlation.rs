//! Cross-parameter correlation models

use std::fmt;

use serde::{Deserialize, Serialize};

use super::CompareOp;

/// Expected statistical relationship between two parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationKind {
    /// Parameters rise and fall together (Pearson coefficient near +1)
    Positive,
    /// One rises as the other falls (coefficient near -1)
    Negative,
    /// Linearly proportional (coefficient near the expected value)
    Proportional,
    /// Inversely proportional
    Inverse,
    /// Relationship holds only under specific conditions; checked as an
    /// instantaneous ratio between the two current values
    Conditional,
    /// Non-linear relationship; checked as an instantaneous ratio
    Complex,
}

impl CorrelationKind {
    /// Whether this kind is validated with a windowed Pearson coefficient
    /// (as opposed to an instantaneous ratio check)
    pub fn uses_coefficient(&self) -> bool {
        matches!(
            self,
            CorrelationKind::Positive
                | CorrelationKind::Negative
                | CorrelationKind::Proportional
                | CorrelationKind::Inverse
        )
    }
}

/// A simple comparison gating whether a correlation is evaluated
///
/// Gates have no duration or rate-of-change semantics; they are plain
/// snapshot comparisons (e.g. "engine_rpm > 1500" before trusting a
/// MAF/RPM correlation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateCondition {
    pub pid: String,
    pub op: CompareOp,
    pub value: f64,
}

impl fmt::Display for GateCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.pid, self.op, self.value)
    }
}

/// Expected relationship between a pair of parameters
///
/// Immutable reference data, validated each cycle while all gates hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationRule {
    /// Stable correlation id (e.g. "maf_vs_rpm")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// First parameter of the pair
    pub pid_a: String,
    /// Second parameter of the pair
    pub pid_b: String,
    /// Kind of relationship expected
    pub kind: CorrelationKind,
    /// Expected coefficient (Pearson for windowed kinds, ratio a/b for
    /// conditional/complex kinds)
    pub expected_coefficient: f64,
    /// Allowed absolute deviation from the expected coefficient
    pub tolerance: f64,
    /// All gates must hold for the correlation to be evaluated
    #[serde(default)]
    pub gates: Vec<GateCondition>,
    /// Diagnostic weight, 1 (low) to 10 (high)
    pub weight: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windowed_kinds() {
        assert!(CorrelationKind::Positive.uses_coefficient());
        assert!(CorrelationKind::Inverse.uses_coefficient());
        assert!(!CorrelationKind::Conditional.uses_coefficient());
        assert!(!CorrelationKind::Complex.uses_coefficient());
    }
}
