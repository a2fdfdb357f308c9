//! Integration tests for the VDI diagnostic engine
//!
//! This crate exercises the whole pipeline: definition loading, engine
//! construction, per-session sample ingestion, and full evaluation
//! cycles.
//!
//! # Test Structure
//!
//! - `engine_cycle_test.rs` - end-to-end cycles over a loaded profile
//! - `session_isolation_test.rs` - concurrent multi-vehicle isolation

// This crate only contains tests, no library code
