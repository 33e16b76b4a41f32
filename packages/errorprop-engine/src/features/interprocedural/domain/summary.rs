//! Per-function summary kept for the whole run

use std::sync::Arc;

use crate::features::flow_graph::UnrolledSchedule;
use crate::shared::models::{AffineForm, RangeError};

#[derive(Debug, Clone, Default)]
pub struct FunctionSummary {
    /// Worst returned value over every return site and call context
    pub error: Option<RangeError>,
    /// Activations currently on the analysis stack
    pub recursion: u32,
    /// Deepest nesting reached
    pub peak_recursion: u32,
    pub activations: u32,
    /// Calls skipped because the recursion bound was reached
    pub skipped_calls: u32,
    /// Unrolled visitation plan, built on first activation
    pub schedule: Option<Arc<UnrolledSchedule>>,
}

impl FunctionSummary {
    pub fn abs_error(&self) -> Option<f64> {
        self.error.as_ref().and_then(RangeError::abs_error)
    }

    pub fn affine_error(&self) -> Option<AffineForm> {
        self.error.as_ref().and_then(|re| re.error.clone())
    }

    /// Keep `candidate` when it has a larger error than the current summary
    pub fn raise(&mut self, candidate: &RangeError) -> bool {
        let Some(new_bound) = candidate.abs_error() else {
            return false;
        };
        if self.abs_error().map_or(false, |old| old >= new_bound) {
            return false;
        }
        self.error = Some(candidate.clone());
        true
    }

    /// Count one more nested activation; returns the count to restore
    pub fn enter(&mut self) -> u32 {
        let previous = self.recursion;
        self.recursion += 1;
        self.peak_recursion = self.peak_recursion.max(self.recursion);
        self.activations += 1;
        previous
    }

    pub fn leave(&mut self, previous: u32) {
        self.recursion = previous;
    }
}
