//! Casts: extensions and int/float widenings keep the operand error,
//! float-to-int and `fptrunc` add the result format's rounding error.

use tracing::debug;

use super::context::{ActivationState, InstructionPropagator};
use crate::errors::{ErrorPropError, Result};
use crate::shared::ir::{CastOp, InstKind, Instruction};
use crate::shared::models::{AffineForm, RangeError};

/// Whether the conversion rounds to the result format
pub fn is_truncating(op: CastOp) -> bool {
    matches!(op, CastOp::FpToUi | CastOp::FpToSi | CastOp::FpTrunc)
}

impl<'a> InstructionPropagator<'a> {
    pub(crate) fn propagate_cast(&self, state: &mut ActivationState, inst: &Instruction) -> Result<bool> {
        let InstKind::Cast { op, operand } = &inst.kind else {
            return Err(ErrorPropError::malformed(format!(
                "{}: instruction {} is not a cast",
                self.func.name, inst.id.0
            )));
        };
        let result_range = self.result_range(&state.store, inst);
        let format = result_range
            .map(|r| r.format)
            .or_else(|| self.format_of(&state.store, *operand));
        let Some(source) = self.operand(&state.store, *operand, format) else {
            debug!(inst = %inst.name, op = ?op, "cast: no data");
            return Ok(false);
        };

        let error = if is_truncating(*op) {
            let rounding = result_range.map_or(0.0, |r| r.rounding_error());
            &source.error + &AffineForm::with_error(0.0, rounding)
        } else {
            source.error
        };

        match result_range {
            Some(_) => {
                self.write(state, inst, error);
            }
            None => {
                // No range of its own: the conversion keeps the operand's
                state
                    .store
                    .set_range_error(self.key(inst), RangeError::with_error(source.range, error));
            }
        }
        Ok(true)
    }
}
