/*
 * errorprop-engine - Affine error propagation for fixed-point precision tuning
 *
 * Feature-First Architecture:
 * - shared/      : Numeric models (AffineForm, FPInterval) and the host program model
 * - features/    : Vertical slices (range store → struct trees → memory → flow → propagation → loops → calls)
 * - pipeline/    : Module driver and report
 * - config/      : One configuration value read at analysis start
 *
 * Execution is single-threaded; the only fuel limits are the recursion bound
 * and the loop unroll count.
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Transfer functions take the whole activation context
#![allow(clippy::type_complexity)] // Store entry iterators
#![allow(clippy::needless_range_loop)] // Matrix routines index rows and columns
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::unnecessary_map_or)] // map_or style for compatibility

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models and the host program model
pub mod shared;

/// Feature modules (store, struct trees, memory, flow, propagation, loops, calls)
pub mod features;

/// Module-level driver and report
pub mod pipeline;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{ErrorPropConfig, ReportMode};
pub use errors::{ErrorPropError, Result};
pub use pipeline::{ErrorPropagator, ErrorReport};
pub use shared::ir::{Module, ModuleBuilder, Value, ValueKey};
pub use shared::models::{AffineForm, FPInterval, FixedPointFormat, RangeError};
