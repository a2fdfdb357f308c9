//! Condition evaluator
//!
//! Evaluates one atomic rule condition against the current sample,
//! including rate-of-change and duration gating. All temporal reasoning
//! runs on sample-carried timestamps, never the evaluator's wall clock,
//! so replayed streams produce identical results.

use vdi_core::{CompareOp, Condition, Threshold};

use crate::state::EvaluationState;
use crate::store::Sample;

/// Tolerance for equality comparisons on f64 samples
pub(crate) const EQ_EPSILON: f64 = 1e-9;

/// Compare a value against a scalar threshold with one of the six plain
/// operators; returns `None` for operators that need more context
pub(crate) fn compare_scalar(op: CompareOp, current: f64, value: f64) -> Option<bool> {
    let matched = match op {
        CompareOp::GreaterThan => current > value,
        CompareOp::LessThan => current < value,
        CompareOp::GreaterOrEqual => current >= value,
        CompareOp::LessOrEqual => current <= value,
        CompareOp::Equal => (current - value).abs() < EQ_EPSILON,
        CompareOp::NotEqual => (current - value).abs() >= EQ_EPSILON,
        CompareOp::Between | CompareOp::Outside | CompareOp::RateOfChange => return None,
    };
    Some(matched)
}

/// Evaluate one condition for one (rule, condition index) occurrence
///
/// * Absent sample → not matched, never an error.
/// * `RateOfChange` compares `|current − previous| / elapsed_secs` against
///   the threshold; the previous-sample entry is updated on every
///   evaluation regardless of outcome, and the first-ever sample can never
///   match.
/// * A `duration_secs` gate requires the base match to hold continuously:
///   the first matching tick records the onset and still reports false; a
///   single false tick resets the clock.
pub fn evaluate(
    condition: &Condition,
    rule_id: &str,
    index: usize,
    current: Option<Sample>,
    now_ms: i64,
    state: &mut EvaluationState,
) -> bool {
    let Some(current) = current else {
        // Parameter never sampled in this session
        return false;
    };

    let base_match = base_match(condition, current, state);

    let Some(duration_secs) = condition.duration_secs else {
        return base_match;
    };

    if !base_match {
        state.clear_onset(rule_id, index);
        return false;
    }

    match state.onset(rule_id, index) {
        None => {
            // First tick of a true stretch starts the clock
            state.record_onset(rule_id, index, now_ms);
            false
        }
        Some(onset_ms) => (now_ms - onset_ms) as f64 / 1_000.0 >= duration_secs,
    }
}

fn base_match(condition: &Condition, current: Sample, state: &mut EvaluationState) -> bool {
    match (condition.op, condition.threshold) {
        (CompareOp::Between, Threshold::Range { low, high }) => {
            current.value >= low && current.value <= high
        }
        (CompareOp::Outside, Threshold::Range { low, high }) => {
            current.value < low || current.value > high
        }
        (CompareOp::RateOfChange, Threshold::Scalar(limit)) => {
            rate_of_change_match(&condition.pid, current, limit, state)
        }
        (op, Threshold::Scalar(value)) => compare_scalar(op, current.value, value).unwrap_or(false),
        // Mismatched operator/threshold shape; defs validation rejects
        // these at load, so a live rule can only get here via hand-built
        // reference data
        _ => false,
    }
}

fn rate_of_change_match(
    pid: &str,
    current: Sample,
    limit: f64,
    state: &mut EvaluationState,
) -> bool {
    let prev = state.prev_sample(pid);
    state.record_sample(pid, current);

    let Some(prev) = prev else {
        // Only one sample ever observed: no rate yet
        return false;
    };

    let elapsed_secs = (current.timestamp_ms - prev.timestamp_ms) as f64 / 1_000.0;
    if elapsed_secs <= 0.0 {
        return false;
    }

    let rate = (current.value - prev.value).abs() / elapsed_secs;
    rate > limit
}
