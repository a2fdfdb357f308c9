//! vdid - VDI Daemon
//!
//! Replays a telemetry stream (NDJSON samples from a file or stdin)
//! through the diagnostic engine and logs ranked findings.
//!
//! Usage:
//!   vdid [OPTIONS] [config.toml]
//!
//! Options:
//!   --definitions <path>  Load parameter/rule/correlation definitions
//!                         from a YAML/JSON file or directory (repeatable)
//!   --replay <file>       NDJSON sample stream ("-" for stdin)
//!
//! Sample lines look like:
//!   {"pid": "coolant_temp", "value": 98.5, "timestamp_ms": 1000}

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vdi_core::{DiagnosticReport, ParameterCatalog};
use vdi_defs::{load_definitions, DefinitionSet};
use vdi_engine::{DiagnosticEngine, EngineConfig, PredicateRegistry};

/// Parsed command-line arguments
struct Args {
    /// Daemon config file (TOML)
    config_path: Option<String>,
    /// Definition files/directories
    definitions: Vec<String>,
    /// Replay source ("-" for stdin)
    replay: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut result = Args {
        config_path: None,
        definitions: Vec::new(),
        replay: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--definitions" | "-d" => {
                if i + 1 < args.len() {
                    result.definitions.push(args[i + 1].clone());
                    i += 2;
                } else {
                    tracing::error!("Missing argument for --definitions");
                    i += 1;
                }
            }
            "--replay" | "-r" => {
                if i + 1 < args.len() {
                    result.replay = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    tracing::error!("Missing argument for --replay");
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                // Positional argument = config file
                result.config_path = Some(arg.to_string());
                i += 1;
            }
            _ => {
                tracing::warn!("Unknown argument: {}", args[i]);
                i += 1;
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"vdid - VDI Daemon

Replays a telemetry stream through the diagnostic engine.

USAGE:
    vdid [OPTIONS] [config.toml]

OPTIONS:
    -d, --definitions <path>   Definition file or directory (repeatable)
    -r, --replay <file>        NDJSON sample stream, "-" for stdin
    -h, --help                 Show this help
"#
    );
}

/// Daemon configuration (TOML)
#[derive(Debug, Deserialize)]
struct DaemonConfig {
    /// Definition files/directories (merged with --definitions)
    #[serde(default)]
    definitions: Vec<String>,
    /// Session id for the replay (defaults to a fresh UUID)
    session_id: Option<String>,
    /// How often to run an evaluation cycle during replay
    #[serde(default = "default_cycle_interval_ms")]
    cycle_interval_ms: u64,
    /// Engine tuning
    #[serde(default)]
    engine: Option<EngineConfig>,
}

fn default_cycle_interval_ms() -> u64 {
    1_000
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            definitions: Vec::new(),
            session_id: None,
            cycle_interval_ms: default_cycle_interval_ms(),
            engine: None,
        }
    }
}

/// One NDJSON sample line
#[derive(Debug, Deserialize)]
struct SampleRecord {
    pid: String,
    value: f64,
    timestamp_ms: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vdid=info,vdi_engine=info,vdi_defs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting vdid (VDI Daemon)");

    let args = parse_args();

    let config: DaemonConfig = match &args.config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path))?;
            toml::from_str(&content).with_context(|| format!("parsing config {}", path))?
        }
        None => DaemonConfig::default(),
    };

    let mut defs = DefinitionSet::default();
    for path in config.definitions.iter().chain(args.definitions.iter()) {
        defs.merge(load_definitions(path).with_context(|| format!("loading definitions {}", path))?);
    }
    if defs.is_empty() {
        bail!("no definitions loaded; pass --definitions or set them in the config");
    }

    let catalog = ParameterCatalog::new(defs.parameters).context("building parameter catalog")?;
    // The replay daemon hosts no custom predicates; definition sets with
    // custom-logic rules need an embedding application
    let engine = DiagnosticEngine::new(
        catalog,
        defs.rules,
        defs.correlations,
        PredicateRegistry::new(),
        config.engine.unwrap_or_default(),
    )
    .context("building diagnostic engine")?;

    let session_id = config
        .session_id
        .unwrap_or_else(|| format!("replay-{}", uuid::Uuid::new_v4()));
    engine.start_session(&session_id);
    tracing::info!(%session_id, "Replay session started");

    let result = replay(
        &engine,
        &session_id,
        args.replay.as_deref().unwrap_or("-"),
        Duration::from_millis(config.cycle_interval_ms),
    )
    .await;

    engine.end_session(&session_id).ok();
    result
}

/// Feed samples into the engine, running a cycle every `interval` and a
/// final one at end of stream
async fn replay(
    engine: &DiagnosticEngine,
    session_id: &str,
    source: &str,
    interval: Duration,
) -> Result<()> {
    let reader: Box<dyn tokio::io::AsyncRead + Unpin> = if source == "-" {
        Box::new(tokio::io::stdin())
    } else {
        Box::new(
            tokio::fs::File::open(source)
                .await
                .with_context(|| format!("opening replay source {}", source))?,
        )
    };
    let mut lines = BufReader::new(reader).lines();
    let mut ticker = tokio::time::interval(interval);
    // The first tick fires immediately; skip it so the first cycle sees data
    ticker.tick().await;

    let mut ingested = 0u64;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => {
                        match serde_json::from_str::<SampleRecord>(&line) {
                            Ok(sample) => {
                                engine.ingest(session_id, &sample.pid, sample.value, sample.timestamp_ms)?;
                                ingested += 1;
                            }
                            Err(e) => {
                                // Malformed sample: treated as absent, not fatal
                                tracing::warn!(error = %e, "Skipping malformed sample line");
                            }
                        }
                    }
                    None => break,
                }
            }
            _ = ticker.tick() => {
                report_cycle(engine, session_id)?;
            }
        }
    }

    tracing::info!(ingested, "Replay stream ended, running final cycle");
    let report = report_cycle(engine, session_id)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn report_cycle(
    engine: &DiagnosticEngine,
    session_id: &str,
) -> Result<DiagnosticReport> {
    let report = engine.run_cycle(session_id)?;
    for finding in &report.findings {
        tracing::info!(
            source = finding.source.id(),
            matched = finding.matched,
            severity = ?finding.severity,
            score = finding.score,
            dtcs = ?finding.dtcs,
            "Finding"
        );
    }
    for failure in &report.failures {
        tracing::warn!(rule_id = %failure.rule_id, message = %failure.message, "Rule failed");
    }
    Ok(report)
}
