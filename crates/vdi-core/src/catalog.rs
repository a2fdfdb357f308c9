//! Parameter catalog - read-only lookup of parameter definitions
//!
//! Built once at startup from externally loaded reference data and never
//! mutated afterwards, so lookups need no locking.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::models::ParameterDefinition;

/// Read-only container for parameter definitions
///
/// Indexed by pid and by category. Missing parameters are answered with
/// `None`/empty results, never a panic.
#[derive(Debug, Default)]
pub struct ParameterCatalog {
    /// pid → definition
    definitions: HashMap<String, ParameterDefinition>,
    /// category → pids in insertion order
    by_category: HashMap<String, Vec<String>>,
}

impl ParameterCatalog {
    /// Build a catalog from a list of definitions
    ///
    /// Fails on duplicate pids: reference data with duplicates is invalid
    /// and the engine must refuse to start with it.
    pub fn new(definitions: Vec<ParameterDefinition>) -> EngineResult<Self> {
        let mut catalog = Self::default();
        for def in definitions {
            if catalog.definitions.contains_key(&def.pid) {
                return Err(EngineError::DuplicateParameter(def.pid));
            }
            catalog
                .by_category
                .entry(def.category.clone())
                .or_default()
                .push(def.pid.clone());
            catalog.definitions.insert(def.pid.clone(), def);
        }
        tracing::debug!(parameters = catalog.definitions.len(), "Catalog built");
        Ok(catalog)
    }

    /// Look up a definition by pid
    pub fn get(&self, pid: &str) -> Option<&ParameterDefinition> {
        self.definitions.get(pid)
    }

    /// Whether the catalog knows this pid
    pub fn contains(&self, pid: &str) -> bool {
        self.definitions.contains_key(pid)
    }

    /// All definitions in a category (empty for unknown categories)
    pub fn by_category(&self, category: &str) -> Vec<&ParameterDefinition> {
        self.by_category
            .get(category)
            .map(|pids| pids.iter().filter_map(|p| self.definitions.get(p)).collect())
            .unwrap_or_default()
    }

    /// Definitions related to the given pid
    ///
    /// Resolves the parameter's `related` list; ids the catalog does not
    /// know are skipped silently.
    pub fn related(&self, pid: &str) -> Vec<&ParameterDefinition> {
        self.get(pid)
            .map(|def| {
                def.related
                    .iter()
                    .filter_map(|p| self.definitions.get(p))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Definitions marked diagnostically critical
    pub fn critical_only(&self) -> Vec<&ParameterDefinition> {
        self.definitions.values().filter(|d| d.critical).collect()
    }

    /// Number of definitions in the catalog
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(pid: &str, category: &str, critical: bool, related: &[&str]) -> ParameterDefinition {
        ParameterDefinition {
            pid: pid.into(),
            name: pid.replace('_', " "),
            unit: None,
            category: category.into(),
            description: None,
            valid_range: None,
            expected_ranges: Default::default(),
            warning_threshold: None,
            critical_threshold: None,
            critical,
            related: related.iter().map(|s| s.to_string()).collect(),
            failure_modes: vec![],
        }
    }

    #[test]
    fn lookup_by_pid_and_category() {
        let catalog = ParameterCatalog::new(vec![
            param("engine_rpm", "engine", true, &["maf"]),
            param("maf", "intake", false, &["engine_rpm"]),
            param("coolant_temp", "engine", true, &[]),
        ])
        .unwrap();

        assert_eq!(catalog.len(), 3);
        assert!(catalog.get("maf").is_some());
        assert!(catalog.get("nonexistent").is_none());
        assert_eq!(catalog.by_category("engine").len(), 2);
        assert!(catalog.by_category("bodywork").is_empty());
    }

    #[test]
    fn related_skips_unknown_ids() {
        let catalog = ParameterCatalog::new(vec![param("maf", "intake", false, &["engine_rpm"])])
            .unwrap();
        // engine_rpm is referenced but not defined
        assert!(catalog.related("maf").is_empty());
        assert!(catalog.related("nonexistent").is_empty());
    }

    #[test]
    fn critical_only_filters() {
        let catalog = ParameterCatalog::new(vec![
            param("engine_rpm", "engine", true, &[]),
            param("maf", "intake", false, &[]),
        ])
        .unwrap();
        let critical = catalog.critical_only();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].pid, "engine_rpm");
    }

    #[test]
    fn duplicate_pid_is_fatal() {
        let err = ParameterCatalog::new(vec![
            param("maf", "intake", false, &[]),
            param("maf", "intake", false, &[]),
        ])
        .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateParameter(p) if p == "maf"));
    }
}
