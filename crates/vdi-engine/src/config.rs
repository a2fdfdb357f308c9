//! Engine tuning configuration

use serde::{Deserialize, Serialize};

/// Tunable knobs for the evaluation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Findings below this confidence are dropped from reports (near-miss
    /// findings above it are kept with `matched = false`)
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Minimum paired samples before a windowed correlation coefficient is
    /// computed; fewer pairs → not applicable, never a false anomaly
    #[serde(default = "default_min_correlation_samples")]
    pub min_correlation_samples: usize,
    /// Maximum paired samples fed into one coefficient computation
    #[serde(default = "default_correlation_window")]
    pub correlation_window: usize,
    /// Rolling history length per parameter
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_min_confidence() -> f64 {
    30.0
}

fn default_min_correlation_samples() -> usize {
    10
}

fn default_correlation_window() -> usize {
    60
}

fn default_history_capacity() -> usize {
    240
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            min_correlation_samples: default_min_correlation_samples(),
            correlation_window: default_correlation_window(),
            history_capacity: default_history_capacity(),
        }
    }
}
