//! vdi-defs - Reference-data loading for the VDI diagnostic engine
//!
//! Loads parameter, rule, and correlation definitions from YAML or JSON
//! files (or a directory of them). Definition *content* is external
//! configuration data; this crate only parses and merges it. Structural
//! cross-validation (unknown pids, duplicate ids, range checks) happens
//! when the engine is built, so every problem is fatal before the first
//! evaluation cycle.
//!
//! # Definition files
//!
//! ```yaml
//! meta:
//!   name: Demo vehicle profile
//!   version: "1.0"
//!
//! parameters:
//!   - pid: coolant_temp
//!     name: Coolant Temperature
//!     unit: °C
//!     category: cooling
//!     critical: true
//!     warning_threshold: 105
//!     critical_threshold: 115
//!
//! rules:
//!   - id: overheat
//!     name: Engine overheating
//!     category: cooling
//!     severity: critical
//!     logic: all_of
//!     base_confidence: 90
//!     priority: 1
//!     dtcs: [P0217]
//!     conditions:
//!       - pid: coolant_temp
//!         op: greater_than
//!         threshold: 110
//!         duration_secs: 10
//!
//! correlations:
//!   - id: maf_vs_rpm
//!     name: MAF tracks RPM
//!     pid_a: maf
//!     pid_b: engine_rpm
//!     kind: positive
//!     expected_coefficient: 0.88
//!     tolerance: 0.12
//!     weight: 7
//!     gates:
//!       - pid: engine_rpm
//!         op: greater_than
//!         value: 1000
//! ```

mod error;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vdi_core::{CorrelationRule, DiagnosticRule, ParameterDefinition};

pub use error::{DefsError, DefsResult};

/// Metadata about a definition file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefsMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One parsed definition file, or several merged together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionSet {
    #[serde(default)]
    pub meta: DefsMeta,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
    #[serde(default)]
    pub rules: Vec<DiagnosticRule>,
    #[serde(default)]
    pub correlations: Vec<CorrelationRule>,
}

impl DefinitionSet {
    /// Parse a YAML definition document
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse a JSON definition document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Append another set's contents (duplicates are caught later, when
    /// the engine validates)
    pub fn merge(&mut self, other: DefinitionSet) {
        self.parameters.extend(other.parameters);
        self.rules.extend(other.rules);
        self.correlations.extend(other.correlations);
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.rules.is_empty() && self.correlations.is_empty()
    }
}

/// Load definitions from a file or a directory of files
///
/// Accepts `.yaml`/`.yml`/`.json`; for a directory, every definition file
/// directly inside it is loaded and merged (non-recursive, sorted by name
/// for deterministic order). Any unreadable or unparsable file aborts the
/// whole load.
pub fn load_definitions(path: impl AsRef<Path>) -> DefsResult<DefinitionSet> {
    let path = path.as_ref();
    if path.is_dir() {
        load_directory(path)
    } else {
        load_file(path)
    }
}

fn load_file(path: &Path) -> DefsResult<DefinitionSet> {
    let content = std::fs::read_to_string(path).map_err(|source| DefsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let set = match ext.as_deref() {
        Some("yaml") | Some("yml") => {
            DefinitionSet::from_yaml(&content).map_err(|source| DefsError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        }
        Some("json") => DefinitionSet::from_json(&content).map_err(|source| DefsError::Json {
            path: path.to_path_buf(),
            source,
        })?,
        _ => return Err(DefsError::UnsupportedFormat(path.to_path_buf())),
    };

    debug!(
        path = %path.display(),
        parameters = set.parameters.len(),
        rules = set.rules.len(),
        correlations = set.correlations.len(),
        "Loaded definition file"
    );
    Ok(set)
}

fn load_directory(dir: &Path) -> DefsResult<DefinitionSet> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .map_err(|source| DefsError::Io {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml") | Some("json")
                )
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(DefsError::Empty(dir.to_path_buf()));
    }

    let mut merged = DefinitionSet::default();
    for file in &files {
        merged.merge(load_file(file)?);
    }

    info!(
        dir = %dir.display(),
        files = files.len(),
        parameters = merged.parameters.len(),
        rules = merged.rules.len(),
        correlations = merged.correlations.len(),
        "Loaded definition directory"
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use vdi_core::{CompareOp, RuleLogic, Severity, Threshold};

    const DEMO_YAML: &str = r#"
meta:
  name: Test profile
  version: "1.0"

parameters:
  - pid: coolant_temp
    name: Coolant Temperature
    unit: °C
    category: cooling
    critical: true
    warning_threshold: 105
  - pid: engine_rpm
    name: Engine RPM
    unit: rpm
    category: engine
    related: [maf]
  - pid: maf
    name: Mass Air Flow
    unit: g/s
    category: intake

rules:
  - id: overheat
    name: Engine overheating
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
        duration_secs: 10
      - pid: engine_rpm
        op: between
        threshold: { low: 500, high: 8000 }

correlations:
  - id: maf_vs_rpm
    name: MAF tracks RPM
    pid_a: maf
    pid_b: engine_rpm
    kind: positive
    expected_coefficient: 0.88
    tolerance: 0.12
    weight: 7
    gates:
      - pid: engine_rpm
        op: greater_than
        value: 1000
"#;

    #[test]
    fn parses_full_yaml_document() {
        let set = DefinitionSet::from_yaml(DEMO_YAML).unwrap();
        assert_eq!(set.meta.name.as_deref(), Some("Test profile"));
        assert_eq!(set.parameters.len(), 3);
        assert_eq!(set.rules.len(), 1);
        assert_eq!(set.correlations.len(), 1);

        let rule = &set.rules[0];
        assert_eq!(rule.severity, Severity::Critical);
        assert_eq!(rule.logic, RuleLogic::AllOf);
        assert_eq!(rule.conditions[0].op, CompareOp::GreaterThan);
        assert_eq!(rule.conditions[0].threshold, Threshold::Scalar(110.0));
        assert_eq!(rule.conditions[0].duration_secs, Some(10.0));
        assert_eq!(
            rule.conditions[1].threshold,
            Threshold::Range {
                low: 500.0,
                high: 8000.0
            }
        );

        let corr = &set.correlations[0];
        assert_eq!(corr.weight, 7);
        assert_eq!(corr.gates.len(), 1);
    }

    #[test]
    fn loads_yaml_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defs.yaml");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(DEMO_YAML.as_bytes())
            .unwrap();

        let set = load_definitions(&path).unwrap();
        assert_eq!(set.parameters.len(), 3);
    }

    #[test]
    fn loads_and_merges_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a_params.yaml"),
            "parameters:\n  - pid: coolant_temp\n    name: Coolant\n    category: cooling\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b_rules.yaml"),
            concat!(
                "rules:\n",
                "  - id: overheat\n",
                "    name: Overheat\n",
                "    category: cooling\n",
                "    severity: warning\n",
                "    logic: any_of\n",
                "    base_confidence: 70\n",
                "    conditions:\n",
                "      - pid: coolant_temp\n",
                "        op: greater_than\n",
                "        threshold: 105\n",
            ),
        )
        .unwrap();
        // Unrelated file is ignored
        std::fs::write(dir.path().join("notes.txt"), "not definitions").unwrap();

        let set = load_definitions(dir.path()).unwrap();
        assert_eq!(set.parameters.len(), 1);
        assert_eq!(set.rules.len(), 1);
    }

    #[test]
    fn empty_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_definitions(dir.path()),
            Err(DefsError::Empty(_))
        ));
    }

    #[test]
    fn unsupported_extension_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defs.toml");
        std::fs::write(&path, "parameters = []").unwrap();
        assert!(matches!(
            load_definitions(&path),
            Err(DefsError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn malformed_yaml_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "rules:\n  - id: [unclosed").unwrap();
        assert!(matches!(load_definitions(&path), Err(DefsError::Yaml { .. })));
    }

    #[test]
    fn json_documents_parse_too() {
        let json = r#"{
            "parameters": [
                {"pid": "lambda", "name": "Lambda", "category": "fuel"}
            ]
        }"#;
        let set = DefinitionSet::from_json(json).unwrap();
        assert_eq!(set.parameters[0].pid, "lambda");
    }
}
