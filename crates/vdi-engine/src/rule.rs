//! Rule evaluator
//!
//! Composes per-condition results into a match decision and confidence
//! score. `Custom` logic is resolved through a host-supplied predicate
//! registry keyed by rule id; rule-specific code never lives inside the
//! engine.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use vdi_core::{DiagnosticRule, RuleLogic};

use crate::condition;
use crate::state::EvaluationState;
use crate::store::SampleStore;

/// Latest value per parameter, as handed to custom predicates
pub type Snapshot = HashMap<String, f64>;

/// A host-supplied predicate for a rule with `Custom` logic
pub type Predicate = Arc<dyn Fn(&Snapshot) -> bool + Send + Sync>;

/// Registry mapping rule id → custom predicate
///
/// Populated by the host application before the engine is built; the
/// engine refuses to start if a `Custom` rule has no predicate.
#[derive(Default, Clone)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Predicate>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predicate for a rule id (replacing any previous one)
    pub fn register<F>(&mut self, rule_id: impl Into<String>, predicate: F)
    where
        F: Fn(&Snapshot) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(rule_id.into(), Arc::new(predicate));
    }

    pub fn get(&self, rule_id: &str) -> Option<&Predicate> {
        self.predicates.get(rule_id)
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.predicates.contains_key(rule_id)
    }
}

impl std::fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("rule_ids", &self.predicates.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Result of evaluating one rule
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    /// Whether the rule's logic was satisfied
    pub matched: bool,
    /// 0–100; a non-match with partial evidence still carries a heavily
    /// discounted confidence for near-miss surfacing
    pub confidence: f64,
    /// Descriptions of the conditions that matched
    pub matched_conditions: Vec<String>,
}

/// Evidence string reported when a custom predicate fires
const CUSTOM_LOGIC_MARKER: &str = "custom logic matched";

/// Evaluate one rule against the current session state
///
/// Returns `Err` with a human-readable reason when the rule cannot be
/// evaluated at all (missing or panicking custom predicate); the
/// aggregator excludes such rules from the cycle without failing it.
pub fn evaluate(
    rule: &DiagnosticRule,
    snapshot: &Snapshot,
    store: &SampleStore,
    now_ms: i64,
    state: &mut EvaluationState,
    registry: &PredicateRegistry,
) -> Result<RuleOutcome, String> {
    match rule.logic {
        RuleLogic::Custom => evaluate_custom(rule, snapshot, registry),
        RuleLogic::AllOf | RuleLogic::AnyOf => Ok(evaluate_conditions(rule, store, now_ms, state)),
    }
}

/// Custom predicates replace the rule's condition list entirely; no
/// per-condition duration or rate state is touched on this path.
fn evaluate_custom(
    rule: &DiagnosticRule,
    snapshot: &Snapshot,
    registry: &PredicateRegistry,
) -> Result<RuleOutcome, String> {
    let Some(predicate) = registry.get(&rule.id) else {
        return Err(format!("no predicate registered for '{}'", rule.id));
    };

    let matched = catch_unwind(AssertUnwindSafe(|| predicate(snapshot)))
        .map_err(|_| format!("predicate for '{}' panicked", rule.id))?;

    if matched {
        Ok(RuleOutcome {
            matched: true,
            confidence: rule.base_confidence,
            matched_conditions: vec![CUSTOM_LOGIC_MARKER.to_string()],
        })
    } else {
        Ok(RuleOutcome {
            matched: false,
            confidence: 0.0,
            matched_conditions: vec![],
        })
    }
}

fn evaluate_conditions(
    rule: &DiagnosticRule,
    store: &SampleStore,
    now_ms: i64,
    state: &mut EvaluationState,
) -> RuleOutcome {
    let mut matched_conditions = Vec::new();
    let mut matched_count = 0usize;

    for (index, cond) in rule.conditions.iter().enumerate() {
        let current = store.latest(&cond.pid);
        if condition::evaluate(cond, &rule.id, index, current, now_ms, state) {
            matched_count += 1;
            matched_conditions.push(cond.to_string());
        }
    }

    let total = rule.conditions.len();
    let matched = match rule.logic {
        RuleLogic::AllOf => total > 0 && matched_count == total,
        RuleLogic::AnyOf => matched_count > 0,
        RuleLogic::Custom => unreachable!("custom logic handled separately"),
    };

    let confidence = if matched {
        rule.base_confidence
    } else if total > 0 {
        // Partial evidence: discounted, not suppressed, so the aggregator
        // can surface near-misses
        rule.base_confidence * (matched_count as f64 / total as f64) * 0.5
    } else {
        0.0
    };

    RuleOutcome {
        matched,
        confidence,
        matched_conditions,
    }
}
