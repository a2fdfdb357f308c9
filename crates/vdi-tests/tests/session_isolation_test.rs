//! Session isolation: concurrent vehicles never share evaluation state

use std::sync::Arc;
use std::thread;

use vdi_core::ParameterCatalog;
use vdi_defs::DefinitionSet;
use vdi_engine::{DiagnosticEngine, EngineConfig, PredicateRegistry};

const PROFILE: &str = r#"
parameters:
  - pid: coolant_temp
    name: Coolant Temperature
    category: cooling
  - pid: boost_psi
    name: Boost Pressure
    category: forced_induction

rules:
  - id: sustained_overheat
    name: Sustained overheat
    category: cooling
    severity: critical
    logic: all_of
    base_confidence: 90
    priority: 1
    dtcs: [P0217]
    conditions:
      - pid: coolant_temp
        op: greater_than
        threshold: 110
        duration_secs: 5

  - id: boost_spike
    name: Boost spike
    category: forced_induction
    severity: warning
    logic: all_of
    base_confidence: 75
    priority: 2
    conditions:
      - pid: boost_psi
        op: rate_of_change
        threshold: 8
"#;

fn build_engine() -> DiagnosticEngine {
    let defs = DefinitionSet::from_yaml(PROFILE).unwrap();
    let catalog = ParameterCatalog::new(defs.parameters).unwrap();
    DiagnosticEngine::new(
        catalog,
        defs.rules,
        defs.correlations,
        PredicateRegistry::new(),
        EngineConfig::default(),
    )
    .unwrap()
}

fn fires(engine: &DiagnosticEngine, session: &str, rule: &str) -> bool {
    engine
        .run_cycle(session)
        .unwrap()
        .findings
        .iter()
        .any(|f| f.source.id() == rule && f.matched)
}

/// Vehicle 1's onset timer must be unaffected by vehicle 2 reaching the
/// same condition later
#[test]
fn duration_onsets_are_per_session() {
    let engine = build_engine();
    engine.start_session("veh-1");
    engine.start_session("veh-2");

    // veh-1 runs hot from t=0
    for t in 0..5i64 {
        engine.ingest("veh-1", "coolant_temp", 118.0, t * 1_000).unwrap();
        engine.run_cycle("veh-1").unwrap();
    }
    // veh-2 only gets hot at t=4 (its own t=0)
    engine.ingest("veh-2", "coolant_temp", 118.0, 4_000).unwrap();
    engine.run_cycle("veh-2").unwrap();

    // veh-1 matures at its t=5; veh-2 is one second into its stretch
    engine.ingest("veh-1", "coolant_temp", 118.0, 5_000).unwrap();
    engine.ingest("veh-2", "coolant_temp", 118.0, 5_000).unwrap();
    assert!(fires(&engine, "veh-1", "sustained_overheat"));
    assert!(!fires(&engine, "veh-2", "sustained_overheat"));

    // veh-2 matures five seconds after its own onset
    engine.ingest("veh-2", "coolant_temp", 118.0, 9_000).unwrap();
    assert!(fires(&engine, "veh-2", "sustained_overheat"));
}

/// Rate-of-change previous samples are per session too
#[test]
fn rate_state_is_per_session() {
    let engine = build_engine();
    engine.start_session("veh-1");
    engine.start_session("veh-2");

    engine.ingest("veh-1", "boost_psi", 5.0, 0).unwrap();
    engine.run_cycle("veh-1").unwrap();
    engine.ingest("veh-1", "boost_psi", 25.0, 1_000).unwrap();
    assert!(fires(&engine, "veh-1", "boost_spike"));

    // veh-2 sees 25 psi as its *first* sample: no previous sample, no rate
    engine.ingest("veh-2", "boost_psi", 25.0, 1_000).unwrap();
    assert!(!fires(&engine, "veh-2", "boost_spike"));
}

/// Ending a session discards state; restarting under the same id begins
/// from scratch
#[test]
fn teardown_discards_state() {
    let engine = build_engine();
    engine.start_session("veh-1");

    for t in 0..6i64 {
        engine.ingest("veh-1", "coolant_temp", 118.0, t * 1_000).unwrap();
        engine.run_cycle("veh-1").unwrap();
    }
    assert!(fires(&engine, "veh-1", "sustained_overheat"));

    engine.end_session("veh-1").unwrap();
    engine.start_session("veh-1");

    // Same id, fresh state: the onset clock starts over
    engine.ingest("veh-1", "coolant_temp", 118.0, 10_000).unwrap();
    assert!(!fires(&engine, "veh-1", "sustained_overheat"));
}

/// Identical streams into many parallel sessions produce identical,
/// independent reports
#[test]
fn parallel_sessions_do_not_interfere() {
    let engine = Arc::new(build_engine());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let session = format!("veh-{}", i);
                engine.start_session(&session);
                for t in 0..6i64 {
                    engine
                        .ingest(&session, "coolant_temp", 118.0, t * 1_000)
                        .unwrap();
                    engine.run_cycle(&session).unwrap();
                }
                let report = engine.run_cycle(&session).unwrap();
                engine.end_session(&session).unwrap();
                report
            })
        })
        .collect();

    for handle in handles {
        let report = handle.join().unwrap();
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].source.id(), "sustained_overheat");
    }
    assert!(engine.active_sessions().is_empty());
}
