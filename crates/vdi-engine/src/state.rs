//! Per-session evaluation state
//!
//! Rate-of-change needs the previous sample per parameter; duration gating
//! needs to remember when each condition last became continuously true.
//! Both maps belong to exactly one session and are dropped wholesale on
//! teardown. Sharing them across sessions would let one vehicle's onset
//! timers bleed into another's.

use std::collections::HashMap;

use crate::store::Sample;

/// Key for duration-gating state: one entry per condition occurrence
///
/// Scoped by (rule id, condition index) so the same rule evaluated for two
/// different conditions, or re-ordered conditions, never collide.
pub type OnsetKey = (String, usize);

/// Mutable evaluation state owned by one session
#[derive(Debug, Default)]
pub struct EvaluationState {
    /// Previous sample per parameter, for rate-of-change
    prev_samples: HashMap<String, Sample>,
    /// Timestamp (epoch ms) when a condition last became continuously true
    onsets: HashMap<OnsetKey, i64>,
}

impl EvaluationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Previous sample recorded for a parameter, if any
    pub fn prev_sample(&self, pid: &str) -> Option<Sample> {
        self.prev_samples.get(pid).copied()
    }

    /// Record the sample used in this evaluation as the new previous one
    ///
    /// Called on every rate-of-change evaluation regardless of match
    /// outcome.
    pub fn record_sample(&mut self, pid: &str, sample: Sample) {
        self.prev_samples.insert(pid.to_string(), sample);
    }

    /// When this condition last became continuously true
    pub fn onset(&self, rule_id: &str, index: usize) -> Option<i64> {
        self.onsets.get(&(rule_id.to_string(), index)).copied()
    }

    /// Record the start of a continuously-true stretch
    pub fn record_onset(&mut self, rule_id: &str, index: usize, timestamp_ms: i64) {
        self.onsets.insert((rule_id.to_string(), index), timestamp_ms);
    }

    /// Forget the onset: the condition went false, the clock restarts
    pub fn clear_onset(&mut self, rule_id: &str, index: usize) {
        self.onsets.remove(&(rule_id.to_string(), index));
    }

    /// Drop all state (session start or vehicle disconnect)
    pub fn reset(&mut self) {
        self.prev_samples.clear();
        self.onsets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onset_is_scoped_per_rule_and_index() {
        let mut state = EvaluationState::new();
        state.record_onset("rule_a", 0, 1_000);
        state.record_onset("rule_a", 1, 2_000);
        state.record_onset("rule_b", 0, 3_000);

        assert_eq!(state.onset("rule_a", 0), Some(1_000));
        assert_eq!(state.onset("rule_a", 1), Some(2_000));
        assert_eq!(state.onset("rule_b", 0), Some(3_000));

        state.clear_onset("rule_a", 0);
        assert_eq!(state.onset("rule_a", 0), None);
        assert_eq!(state.onset("rule_a", 1), Some(2_000));
    }

    #[test]
    fn reset_drops_everything() {
        let mut state = EvaluationState::new();
        state.record_sample(
            "engine_rpm",
            Sample {
                value: 800.0,
                timestamp_ms: 1_000,
            },
        );
        state.record_onset("rule_a", 0, 1_000);
        state.reset();
        assert!(state.prev_sample("engine_rpm").is_none());
        assert!(state.onset("rule_a", 0).is_none());
    }
}
