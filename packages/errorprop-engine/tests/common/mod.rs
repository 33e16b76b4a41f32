//! Common test utilities for errorprop-engine
//!
//! Shared fixtures, assertions and builders for the unit and integration
//! test binaries. Each binary uses a subset, hence the dead_code allowance.

#![allow(dead_code)]

mod assertions;
mod builders;
mod fixtures;

// Re-export all utilities
pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
