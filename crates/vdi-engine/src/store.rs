//! Sample store - per-session latest values and rolling history
//!
//! Fed push-style by the external telemetry source; never polls and never
//! blocks. One store per session, owned by that session's state.

use std::collections::{HashMap, VecDeque};

/// One timestamped sample of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: f64,
    /// Sample-carried epoch milliseconds (not evaluator wall clock)
    pub timestamp_ms: i64,
}

/// Rolling buffer for one parameter
#[derive(Debug, Default)]
struct ParameterHistory {
    samples: VecDeque<Sample>,
}

/// Per-session buffer of the latest value and short history per parameter
#[derive(Debug)]
pub struct SampleStore {
    history: HashMap<String, ParameterHistory>,
    capacity: usize,
}

impl SampleStore {
    /// Create a store keeping at most `capacity` samples per parameter
    pub fn new(capacity: usize) -> Self {
        Self {
            history: HashMap::new(),
            capacity: capacity.max(2),
        }
    }

    /// Record a sample, evicting the oldest once the buffer is full
    pub fn ingest(&mut self, pid: &str, value: f64, timestamp_ms: i64) {
        let entry = self.history.entry(pid.to_string()).or_default();
        if entry.samples.len() == self.capacity {
            entry.samples.pop_front();
        }
        entry.samples.push_back(Sample {
            value,
            timestamp_ms,
        });
    }

    /// Latest value per parameter ever seen in this session
    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.history
            .iter()
            .filter_map(|(pid, h)| h.samples.back().map(|s| (pid.clone(), s.value)))
            .collect()
    }

    /// Latest sample for one parameter
    pub fn latest(&self, pid: &str) -> Option<Sample> {
        self.history.get(pid).and_then(|h| h.samples.back().copied())
    }

    /// Most recent sample timestamp across all parameters
    ///
    /// Used as the deterministic "now" for duration gating, so replayed
    /// streams evaluate identically to live ones.
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.history
            .values()
            .filter_map(|h| h.samples.back().map(|s| s.timestamp_ms))
            .max()
    }

    /// Most recent value pairs for two parameters, newest last
    ///
    /// Pairs are aligned positionally from the newest sample backwards over
    /// the shorter of the two histories, capped at `max_pairs`.
    pub fn paired_window(&self, pid_a: &str, pid_b: &str, max_pairs: usize) -> Vec<(f64, f64)> {
        let (Some(a), Some(b)) = (self.history.get(pid_a), self.history.get(pid_b)) else {
            return Vec::new();
        };
        let n = a.samples.len().min(b.samples.len()).min(max_pairs);
        let a_skip = a.samples.len() - n;
        let b_skip = b.samples.len() - n;
        a.samples
            .iter()
            .skip(a_skip)
            .zip(b.samples.iter().skip(b_skip))
            .map(|(sa, sb)| (sa.value, sb.value))
            .collect()
    }

    /// Number of samples buffered for one parameter
    pub fn sample_count(&self, pid: &str) -> usize {
        self.history.get(pid).map_or(0, |h| h.samples.len())
    }

    /// Drop everything buffered for this session
    pub fn reset(&mut self) {
        self.history.clear();
    }
}
