//! Shared data models for the diagnostic engine

mod correlation;
mod finding;
mod parameter;
mod rule;

pub use correlation::*;
pub use finding::*;
pub use parameter::*;
pub use rule::*;
