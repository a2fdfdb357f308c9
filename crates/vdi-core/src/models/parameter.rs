//! Parameter definition models

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Driving mode a vehicle can be in when a sample is taken
///
/// Expected parameter ranges differ per mode (idle RPM vs. wide-open
/// throttle RPM are different worlds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivingMode {
    /// Engine running, vehicle stationary
    Idle,
    /// Steady-state driving
    Cruise,
    /// Wide-open throttle / full load
    WideOpenThrottle,
    /// Deceleration / overrun
    Decel,
}

/// Expected numeric range for a parameter in one driving mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedRange {
    pub min: f64,
    pub max: f64,
}

impl ExpectedRange {
    /// Whether a value falls inside this range (inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A known way this parameter's subsystem fails
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureMode {
    /// Trigger condition, human-readable (e.g. "LTFT above +10% at idle")
    pub condition: String,
    /// Observable symptom
    pub symptom: String,
    /// Likely root causes, most common first
    #[serde(default)]
    pub causes: Vec<String>,
    /// Severity of this failure mode
    pub severity: Severity,
    /// Fault codes typically set alongside
    #[serde(default)]
    pub dtcs: Vec<String>,
}

/// Definition of one measurable vehicle signal
///
/// Immutable reference data: loaded once at startup, owned by the
/// [`ParameterCatalog`](crate::catalog::ParameterCatalog), never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Stable parameter id (e.g. "engine_rpm", "stft_b1")
    pub pid: String,
    /// Human-readable name
    pub name: String,
    /// Unit of measurement (e.g. "rpm", "°C", "%")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Category/domain (e.g. "fuel", "ignition", "emissions")
    pub category: String,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Valid numeric domain; samples outside are still stored but flagged
    /// as implausible by range checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_range: Option<ExpectedRange>,
    /// Expected range per driving mode
    #[serde(default)]
    pub expected_ranges: HashMap<DrivingMode, ExpectedRange>,
    /// Value beyond which the parameter is considered in warning territory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_threshold: Option<f64>,
    /// Value beyond which the parameter is considered critical
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_threshold: Option<f64>,
    /// Whether this parameter is diagnostically critical (monitored first)
    #[serde(default)]
    pub critical: bool,
    /// Pids of physically related parameters (e.g. MAF ↔ RPM)
    #[serde(default)]
    pub related: Vec<String>,
    /// Known failure modes of the subsystem this parameter observes
    #[serde(default)]
    pub failure_modes: Vec<FailureMode>,
}

/// Severity levels shared by rules, failure modes, and findings
///
/// Ordering is diagnostic urgency: `Critical > Warning > Info`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only
    #[default]
    Info,
    /// Warning condition, service soon
    Warning,
    /// Critical failure, immediate attention
    Critical,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_urgency() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn expected_range_is_inclusive() {
        let range = ExpectedRange {
            min: 700.0,
            max: 900.0,
        };
        assert!(range.contains(700.0));
        assert!(range.contains(900.0));
        assert!(!range.contains(699.9));
    }
}
