//! Diagnostic rule and condition models

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Severity;

/// Comparison operator for a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Equal,
    NotEqual,
    /// Inclusive range test against a `[low, high]` pair
    Between,
    /// Strictly below `low` or above `high`
    Outside,
    /// Absolute rate of change in units/second against the previous sample
    RateOfChange,
}

impl CompareOp {
    /// Operators that need a `[low, high]` pair rather than a scalar
    pub fn needs_range(&self) -> bool {
        matches!(self, CompareOp::Between | CompareOp::Outside)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::GreaterThan => ">",
            CompareOp::LessThan => "<",
            CompareOp::GreaterOrEqual => ">=",
            CompareOp::LessOrEqual => "<=",
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
            CompareOp::Between => "between",
            CompareOp::Outside => "outside",
            CompareOp::RateOfChange => "rate_of_change",
        };
        f.write_str(s)
    }
}

/// Threshold a condition compares against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    /// Single comparison value
    Scalar(f64),
    /// `[low, high]` pair for between/outside
    Range { low: f64, high: f64 },
}

impl Threshold {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Threshold::Scalar(v) => Some(*v),
            Threshold::Range { .. } => None,
        }
    }

    pub fn as_range(&self) -> Option<(f64, f64)> {
        match self {
            Threshold::Scalar(_) => None,
            Threshold::Range { low, high } => Some((*low, *high)),
        }
    }
}

/// One atomic test within a diagnostic rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Parameter under test
    pub pid: String,
    /// Comparison operator
    pub op: CompareOp,
    /// Threshold (scalar, or pair for between/outside)
    pub threshold: Threshold,
    /// Seconds the condition must hold *continuously* before it counts
    /// as matched; `None` means it matches instantaneously
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl Condition {
    /// Instantaneous condition with a scalar threshold
    pub fn new(pid: impl Into<String>, op: CompareOp, value: f64) -> Self {
        Self {
            pid: pid.into(),
            op,
            threshold: Threshold::Scalar(value),
            duration_secs: None,
        }
    }

    /// Range condition (between/outside)
    pub fn range(pid: impl Into<String>, op: CompareOp, low: f64, high: f64) -> Self {
        Self {
            pid: pid.into(),
            op,
            threshold: Threshold::Range { low, high },
            duration_secs: None,
        }
    }

    /// Require the condition to hold for `secs` continuous seconds
    pub fn sustained(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.threshold {
            Threshold::Scalar(v) => write!(f, "{} {} {}", self.pid, self.op, v)?,
            Threshold::Range { low, high } => {
                write!(f, "{} {} [{}, {}]", self.pid, self.op, low, high)?
            }
        }
        if let Some(secs) = self.duration_secs {
            write!(f, " for {}s", secs)?;
        }
        Ok(())
    }
}

/// How a rule combines its condition results
///
/// `Custom` names an externally registered predicate (keyed by rule id)
/// that operates on the full parameter snapshot; when a rule uses it, the
/// rule's own condition list is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleLogic {
    /// Every condition must match
    AllOf,
    /// At least one condition must match
    AnyOf,
    /// Predicate resolved through the host-supplied registry by rule id
    Custom,
}

/// A diagnostic rule: conditions plus combination logic and metadata
///
/// Immutable reference data, evaluated repeatedly against live session
/// state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticRule {
    /// Stable rule id (e.g. "lean_condition_bank1")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Category/domain (e.g. "fuel_trim", "misfire")
    pub category: String,
    /// Severity when matched
    pub severity: Severity,
    /// Ordered condition list (ignored when `logic` is `Custom`)
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Combination logic
    pub logic: RuleLogic,
    /// Confidence reported on a full match, 0–100
    pub base_confidence: f64,
    /// Fault codes associated with this diagnosis
    #[serde(default)]
    pub dtcs: Vec<String>,
    /// Repair priority, 1 (highest) to 5 (lowest)
    #[serde(default = "default_priority")]
    pub priority: u8,
}

fn default_priority() -> u8 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn condition_display_reads_naturally() {
        let c = Condition::new("coolant_temp", CompareOp::GreaterThan, 105.0);
        assert_eq!(c.to_string(), "coolant_temp > 105");

        let c = Condition::range("stft_b1", CompareOp::Outside, -10.0, 10.0).sustained(5.0);
        assert_eq!(c.to_string(), "stft_b1 outside [-10, 10] for 5s");
    }

    #[test]
    fn threshold_accessors() {
        assert_eq!(Threshold::Scalar(3.5).as_scalar(), Some(3.5));
        assert_eq!(Threshold::Scalar(3.5).as_range(), None);
        let range = Threshold::Range {
            low: 1.0,
            high: 2.0,
        };
        assert_eq!(range.as_range(), Some((1.0, 2.0)));
    }

    #[test]
    fn rule_roundtrips_through_yaml() {
        let rule = DiagnosticRule {
            id: "overheat".into(),
            name: "Engine overheating".into(),
            category: "cooling".into(),
            severity: Severity::Critical,
            conditions: vec![Condition::new("coolant_temp", CompareOp::GreaterThan, 110.0)],
            logic: RuleLogic::AllOf,
            base_confidence: 90.0,
            dtcs: vec!["P0217".into()],
            priority: 1,
        };
        let yaml = serde_yaml::to_string(&rule).unwrap();
        let back: DiagnosticRule = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.id, rule.id);
        assert_eq!(back.conditions.len(), 1);
    }
}
