//! Diagnostic engine - aggregation façade
//!
//! Owns the immutable reference data (catalog, rules, correlations,
//! predicate registry) and the session registry, validates the reference
//! data up front, and runs full evaluation cycles per session.

use std::collections::{BTreeSet, HashSet};

use chrono::Utc;
use tracing::{debug, warn};

use vdi_core::{
    CompareOp, CorrelationRule, DiagnosticReport, DiagnosticRule, EngineError, EngineResult,
    Finding, FindingSource, ParameterCatalog, RuleFailure, RuleLogic, Severity,
};

use crate::config::EngineConfig;
use crate::correlation;
use crate::rule::{self, PredicateRegistry};
use crate::session::SessionRegistry;

/// Engine defaults for correlation findings, which carry no severity or
/// priority of their own in the reference data
const CORRELATION_SEVERITY: Severity = Severity::Warning;
const CORRELATION_PRIORITY: u8 = 3;

/// The rule & correlation evaluation engine
///
/// Reference data is immutable after construction; all mutable state is
/// session-scoped behind the session registry.
#[derive(Debug)]
pub struct DiagnosticEngine {
    catalog: ParameterCatalog,
    rules: Vec<DiagnosticRule>,
    correlations: Vec<CorrelationRule>,
    registry: PredicateRegistry,
    config: EngineConfig,
    sessions: SessionRegistry,
}

impl DiagnosticEngine {
    /// Build an engine, refusing to start on invalid reference data
    ///
    /// A malformed rule set fails here, at load time, rather than partway
    /// through a cycle.
    pub fn new(
        catalog: ParameterCatalog,
        rules: Vec<DiagnosticRule>,
        correlations: Vec<CorrelationRule>,
        registry: PredicateRegistry,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        validate_rules(&catalog, &rules, &registry)?;
        validate_correlations(&catalog, &correlations)?;
        debug!(
            parameters = catalog.len(),
            rules = rules.len(),
            correlations = correlations.len(),
            "Diagnostic engine ready"
        );
        Ok(Self {
            catalog,
            rules,
            correlations,
            registry,
            config,
            sessions: SessionRegistry::new(),
        })
    }

    pub fn catalog(&self) -> &ParameterCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a diagnostic session (resets any prior state under this id)
    pub fn start_session(&self, session_id: &str) {
        self.sessions.start(session_id, self.config.history_capacity);
    }

    /// End a session, discarding its sample store and evaluation state
    pub fn end_session(&self, session_id: &str) -> EngineResult<()> {
        self.sessions.end(session_id)
    }

    /// Ids of currently active sessions
    pub fn active_sessions(&self) -> Vec<String> {
        self.sessions.active()
    }

    /// Push one sample into a session
    ///
    /// Samples must arrive in order per session; duration and
    /// rate-of-change semantics are timestamp-sensitive. Unknown
    /// parameters are stored anyway (rules simply never reference them)
    /// and logged at debug level.
    pub fn ingest(
        &self,
        session_id: &str,
        pid: &str,
        value: f64,
        timestamp_ms: i64,
    ) -> EngineResult<()> {
        if !self.catalog.contains(pid) {
            debug!(session_id, pid, "Sample for uncatalogued parameter");
        }
        let session = self.sessions.get(session_id)?;
        session.lock().store.ingest(pid, value, timestamp_ms);
        Ok(())
    }

    /// Run one full evaluation cycle for a session
    ///
    /// Pure function of the session's current state: identical inputs
    /// yield an identical (ranked, deduplicated) finding list. An empty
    /// list is a valid, successful result.
    pub fn run_cycle(&self, session_id: &str) -> EngineResult<DiagnosticReport> {
        let session = self.sessions.get(session_id)?;
        let mut guard = session.lock();
        // Split the guard so the store stays readable while the
        // evaluation state is mutated
        let crate::session::SessionState { store, eval } = &mut *guard;

        let snapshot = store.snapshot();
        // Sample-carried time, deterministic under replay
        let now_ms = store.latest_timestamp().unwrap_or(0);
        let generated_at = Utc::now();

        let mut findings = Vec::new();
        let mut failures = Vec::new();

        for r in &self.rules {
            let outcome = rule::evaluate(r, &snapshot, store, now_ms, eval, &self.registry);
            match outcome {
                Ok(outcome) => {
                    if outcome.confidence >= self.config.min_confidence {
                        findings.push(Finding {
                            source: FindingSource::Rule { id: r.id.clone() },
                            matched: outcome.matched,
                            severity: r.severity,
                            score: outcome.confidence,
                            deviation: None,
                            evidence: outcome.matched_conditions,
                            dtcs: r.dtcs.clone(),
                            priority: r.priority,
                            timestamp: generated_at,
                        });
                    }
                }
                Err(message) => {
                    warn!(session_id, rule_id = %r.id, %message, "Rule excluded from cycle");
                    failures.push(RuleFailure {
                        rule_id: r.id.clone(),
                        message,
                    });
                }
            }
        }

        for c in &self.correlations {
            let outcome = correlation::evaluate(c, &snapshot, store, &self.config);
            if outcome.applicable && outcome.anomalous {
                findings.push(Finding {
                    source: FindingSource::Correlation { id: c.id.clone() },
                    matched: true,
                    severity: CORRELATION_SEVERITY,
                    score: f64::from(c.weight) * 10.0,
                    deviation: Some(outcome.deviation),
                    evidence: vec![format!(
                        "{} vs {}: observed {:.3}, expected {:.3} ± {:.3}",
                        c.pid_a, c.pid_b, outcome.observed, c.expected_coefficient, c.tolerance
                    )],
                    dtcs: Vec::new(),
                    priority: CORRELATION_PRIORITY,
                    timestamp: generated_at,
                });
            }
        }

        rank(&mut findings);
        let findings = dedup_by_dtc_set(findings);

        debug!(
            session_id,
            findings = findings.len(),
            failures = failures.len(),
            "Cycle complete"
        );

        Ok(DiagnosticReport {
            session_id: session_id.to_string(),
            findings,
            failures,
            generated_at,
        })
    }
}

/// Sort: severity desc, score desc, repair priority asc (1 first)
fn rank(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| a.priority.cmp(&b.priority))
    });
}

/// Drop lower-ranked findings whose DTC set matches a higher-ranked one
///
/// Only non-empty sets deduplicate. Correlation findings carry no DTCs
/// and must not collapse into one another.
fn dedup_by_dtc_set(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen: HashSet<BTreeSet<String>> = HashSet::new();
    findings
        .into_iter()
        .filter(|f| {
            if f.dtcs.is_empty() {
                return true;
            }
            let key: BTreeSet<String> = f.dtcs.iter().cloned().collect();
            seen.insert(key)
        })
        .collect()
}

fn validate_rules(
    catalog: &ParameterCatalog,
    rules: &[DiagnosticRule],
    registry: &PredicateRegistry,
) -> EngineResult<()> {
    let mut ids = HashSet::new();
    for r in rules {
        if !ids.insert(r.id.as_str()) {
            return Err(EngineError::DuplicateRuleId(r.id.clone()));
        }
        if !(0.0..=100.0).contains(&r.base_confidence) {
            return Err(EngineError::InvalidRule {
                id: r.id.clone(),
                reason: format!("base confidence {} outside 0-100", r.base_confidence),
            });
        }
        if !(1..=5).contains(&r.priority) {
            return Err(EngineError::InvalidRule {
                id: r.id.clone(),
                reason: format!("priority {} outside 1-5", r.priority),
            });
        }
        match r.logic {
            RuleLogic::Custom => {
                if !registry.contains(&r.id) {
                    return Err(EngineError::MissingPredicate(r.id.clone()));
                }
            }
            RuleLogic::AllOf | RuleLogic::AnyOf => {
                if r.conditions.is_empty() {
                    return Err(EngineError::InvalidRule {
                        id: r.id.clone(),
                        reason: "no conditions".into(),
                    });
                }
            }
        }
        for cond in &r.conditions {
            if !catalog.contains(&cond.pid) {
                return Err(EngineError::UnknownParameter {
                    pid: cond.pid.clone(),
                    referrer: format!("rule '{}'", r.id),
                });
            }
            let shape_ok = if cond.op.needs_range() {
                cond.threshold.as_range().is_some()
            } else {
                cond.threshold.as_scalar().is_some()
            };
            if !shape_ok {
                return Err(EngineError::InvalidRule {
                    id: r.id.clone(),
                    reason: format!("operator {} and threshold shape disagree", cond.op),
                });
            }
            if let Some((low, high)) = cond.threshold.as_range() {
                if low > high {
                    return Err(EngineError::InvalidRule {
                        id: r.id.clone(),
                        reason: format!("inverted range [{}, {}]", low, high),
                    });
                }
            }
            if let Some(secs) = cond.duration_secs {
                if secs < 0.0 {
                    return Err(EngineError::InvalidRule {
                        id: r.id.clone(),
                        reason: format!("negative duration {}", secs),
                    });
                }
            }
        }
    }
    Ok(())
}

fn validate_correlations(
    catalog: &ParameterCatalog,
    correlations: &[CorrelationRule],
) -> EngineResult<()> {
    let mut ids = HashSet::new();
    for c in correlations {
        if !ids.insert(c.id.as_str()) {
            return Err(EngineError::DuplicateCorrelationId(c.id.clone()));
        }
        for pid in [&c.pid_a, &c.pid_b] {
            if !catalog.contains(pid) {
                return Err(EngineError::UnknownParameter {
                    pid: pid.clone(),
                    referrer: format!("correlation '{}'", c.id),
                });
            }
        }
        if !(1..=10).contains(&c.weight) {
            return Err(EngineError::InvalidCorrelation {
                id: c.id.clone(),
                reason: format!("weight {} outside 1-10", c.weight),
            });
        }
        if c.tolerance < 0.0 {
            return Err(EngineError::InvalidCorrelation {
                id: c.id.clone(),
                reason: format!("negative tolerance {}", c.tolerance),
            });
        }
        for gate in &c.gates {
            if !catalog.contains(&gate.pid) {
                return Err(EngineError::UnknownParameter {
                    pid: gate.pid.clone(),
                    referrer: format!("correlation '{}' gate", c.id),
                });
            }
            if matches!(
                gate.op,
                CompareOp::Between | CompareOp::Outside | CompareOp::RateOfChange
            ) {
                return Err(EngineError::InvalidCorrelation {
                    id: c.id.clone(),
                    reason: format!("gate operator {} not allowed (simple comparisons only)", gate.op),
                });
            }
        }
    }
    Ok(())
}
