//! vdi-core - Core types for the VDI diagnostic inference engine
//!
//! This crate provides the shared data model (parameters, rules,
//! correlations, findings) and the read-only parameter catalog that the
//! evaluation engine in `vdi-engine` operates on.

pub mod catalog;
pub mod error;
pub mod models;

pub use catalog::ParameterCatalog;
pub use error::{EngineError, EngineResult};
pub use models::*;
