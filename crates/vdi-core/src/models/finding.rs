//! Finding models (output of one evaluation cycle)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Severity;

/// What produced a finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FindingSource {
    /// A diagnostic rule
    Rule { id: String },
    /// A correlation anomaly
    Correlation { id: String },
}

impl FindingSource {
    pub fn id(&self) -> &str {
        match self {
            FindingSource::Rule { id } => id,
            FindingSource::Correlation { id } => id,
        }
    }
}

/// Result of evaluating one rule or correlation in the current cycle
///
/// Findings are ephemeral: recomputed every cycle, never persisted by the
/// engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Originating rule or correlation
    pub source: FindingSource,
    /// Whether the rule fully matched (near-miss findings carry `false`)
    pub matched: bool,
    /// Severity of the diagnosis
    pub severity: Severity,
    /// Ranking score on a 0–100 scale: rule confidence, or correlation
    /// weight × 10
    pub score: f64,
    /// Absolute deviation from the expected coefficient (correlations only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation: Option<f64>,
    /// Descriptions of the conditions that matched
    #[serde(default)]
    pub evidence: Vec<String>,
    /// Associated fault codes
    #[serde(default)]
    pub dtcs: Vec<String>,
    /// Repair priority, 1 (highest) to 5 (lowest)
    pub priority: u8,
    /// When this finding was produced
    pub timestamp: DateTime<Utc>,
}

/// A rule that could not be evaluated this cycle
///
/// One bad rule must never blank out a whole cycle; failures are surfaced
/// next to the findings instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFailure {
    /// Rule that failed to evaluate
    pub rule_id: String,
    /// What went wrong
    pub message: String,
}

/// Output of one full evaluation cycle for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Session this report belongs to
    pub session_id: String,
    /// Ranked, deduplicated findings (may be empty; an empty list is a valid,
    /// successful result)
    pub findings: Vec<Finding>,
    /// Rules excluded from this cycle because evaluation failed
    #[serde(default)]
    pub failures: Vec<RuleFailure>,
    /// When the cycle ran
    pub generated_at: DateTime<Utc>,
}
