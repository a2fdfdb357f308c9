//! vdi-engine - Rule & correlation evaluation engine
//!
//! Turns per-session streams of timestamped samples into ranked diagnostic
//! findings.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     DiagnosticEngine                         │
//! │  catalog / rules / correlations / predicates (immutable)     │
//! │                                                              │
//! │  sessions: RwLock<HashMap<id, Arc<Mutex<SessionState>>>>     │
//! │                         │                                    │
//! │          ┌──────────────┴──────────────┐                     │
//! │          │        SessionState         │  (one per vehicle)  │
//! │          │  SampleStore + EvalState    │                     │
//! │          └──────────────┬──────────────┘                     │
//! │                         │                                    │
//! │   condition / rule / correlation evaluators (pure logic)     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ingest and `run_cycle` serialize on the session mutex; distinct
//! sessions run fully in parallel with no shared mutable state.

pub mod condition;
pub mod config;
pub mod correlation;
pub mod engine;
pub mod rule;
pub mod session;
pub mod state;
pub mod store;

pub use config::EngineConfig;
pub use engine::DiagnosticEngine;
pub use rule::{PredicateRegistry, RuleOutcome, Snapshot};
pub use store::{Sample, SampleStore};

// Re-export for convenience
pub use vdi_core::{
    CorrelationRule, DiagnosticReport, DiagnosticRule, EngineError, EngineResult, Finding,
    ParameterCatalog, RuleFailure, Severity,
};
