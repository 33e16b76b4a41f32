//! Comparison soundness check
//!
//! Errors shared by both operands cancel out in `E1 - E2`; what remains is
//! compared against the distance separating the two ranges (floored at the
//! smaller rounding error). A comparison whose operands may move by at least
//! that much may flip its outcome.

use tracing::debug;

use super::context::{ActivationState, InstructionPropagator, Operand};
use crate::errors::{ErrorPropError, Result};
use crate::shared::ir::{InstKind, Instruction, Value};
use crate::shared::models::CmpErrorInfo;

/// Tolerance and "may be wrong" flag of a comparison between two operands.
///
/// `threshold` is a percentage of relative error below which a possible
/// flip is not reported; 0 reports every possible flip.
pub fn check_comparison(o1: &Operand, o2: &Operand, threshold: u32) -> CmpErrorInfo {
    let abs_error = (&o1.error - &o2.error).noise_bound();
    let rounding = o1.range.rounding_error().min(o2.range.rounding_error());
    let tolerance = o1.range.min_distance(&o2.range).max(rounding);

    let may_be_wrong = abs_error >= tolerance
        && (threshold == 0 || {
            let relative = abs_error / o1.range.max.max(o2.range.max);
            relative * 100.0 >= f64::from(threshold)
        });
    CmpErrorInfo::new(tolerance, may_be_wrong)
}

impl<'a> InstructionPropagator<'a> {
    pub(crate) fn check_cmp(&self, state: &mut ActivationState, inst: &Instruction) -> Result<bool> {
        let (lhs, rhs) = match &inst.kind {
            InstKind::ICmp { lhs, rhs, .. } | InstKind::FCmp { lhs, rhs, .. } => (*lhs, *rhs),
            _ => {
                return Err(ErrorPropError::malformed(format!(
                    "{}: instruction {} is not a comparison",
                    self.func.name, inst.id.0
                )))
            }
        };
        let (Some(o1), Some(o2)) = self.comparison_operands(state, lhs, rhs) else {
            debug!(inst = %inst.name, "comparison: no data");
            return Ok(false);
        };

        let info = check_comparison(&o1, &o2, self.config.cmp_error_threshold);
        debug!(
            inst = %inst.name,
            tolerance = info.tolerance,
            may_be_wrong = info.may_be_wrong,
            "comparison checked"
        );
        state.cmp.insert(inst.id, info);
        Ok(true)
    }

    /// Constants are read in the format of the other operand
    fn comparison_operands(&self, state: &ActivationState, lhs: Value, rhs: Value) -> (Option<Operand>, Option<Operand>) {
        let store = &state.store;
        let lhs_format = self.format_of(store, rhs);
        let rhs_format = self.format_of(store, lhs);
        (
            self.operand(store, lhs, lhs_format),
            self.operand(store, rhs, rhs_format),
        )
    }
}
