//! Binary arithmetic
//!
//! With `E` the error of an operand and `AF(R)` the affine form spanning its
//! range:
//!
//! ```text
//!   x ± y : E1 ± E2
//!   x * y : AF(R1)·E2 + AF(R2)·E1 + E1·E2
//!   x / y : AF(R1)·E(1/y) + AF(1/R2)·E1 + E1·E(1/y)   [+ rounding if truncating]
//!   x << n: E1
//!   x >> n: E1 + rounding(result)
//! ```

use tracing::debug;

use super::context::{ActivationState, InstructionPropagator, Operand};
use crate::errors::{ErrorPropError, Result};
use crate::shared::ir::{BinaryOp, InstKind, Instruction, Value};
use crate::shared::models::{AffineForm, FPInterval, MonotonicFn};

pub fn propagate_add(e1: &AffineForm, e2: &AffineForm) -> AffineForm {
    e1 + e2
}

pub fn propagate_sub(e1: &AffineForm, e2: &AffineForm) -> AffineForm {
    e1 - e2
}

pub fn propagate_mul(r1: &FPInterval, e1: &AffineForm, r2: &FPInterval, e2: &AffineForm) -> AffineForm {
    let a1 = AffineForm::from_interval(r1);
    let a2 = AffineForm::from_interval(r2);
    &(&(&a1 * e2) + &(&a2 * e1)) + &(e1 * e2)
}

/// Error of `x / y` without truncation; `None` when `y`'s range touches zero
pub fn propagate_div(r1: &FPInterval, e1: &AffineForm, r2: &FPInterval, e2: &AffineForm) -> Option<AffineForm> {
    let inverse_range = r2.reciprocal()?;
    let inverse_error = MonotonicFn::Reciprocal.linearize_error(r2, e2)?;
    let a1 = AffineForm::from_interval(r1);
    let a_inv = AffineForm::from_interval(&inverse_range);
    Some(&(&(&a1 * &inverse_error) + &(&a_inv * e1)) + &(e1 * &inverse_error))
}

impl<'a> InstructionPropagator<'a> {
    pub(crate) fn propagate_binary(&self, state: &mut ActivationState, inst: &Instruction) -> Result<bool> {
        let InstKind::Binary { op, lhs, rhs } = &inst.kind else {
            return Err(ErrorPropError::malformed(format!(
                "{}: instruction {} is not a binary operation",
                self.func.name, inst.id.0
            )));
        };
        let store = &state.store;
        let result_range = self.result_range(store, inst);
        let result_format = result_range.map(|r| r.format);

        // A constant dividend of a fixed-point division carries twice the result's fractional bits
        let lhs_format = match (op, lhs, result_format) {
            (BinaryOp::SDiv | BinaryOp::UDiv, Value::ConstInt(_), Some(fmt)) => {
                Some(fmt.with_frac_bits(fmt.frac_bits * 2))
            }
            _ => result_format,
        };
        let Some(o1) = self.operand(store, *lhs, lhs_format) else {
            return Ok(self.no_data(inst));
        };
        let second = || self.operand(store, *rhs, result_format);

        let error = match op {
            BinaryOp::Add | BinaryOp::FAdd => {
                let Some(o2) = second() else {
                    return Ok(self.no_data(inst));
                };
                propagate_add(&o1.error, &o2.error)
            }
            BinaryOp::Sub | BinaryOp::FSub => {
                let Some(o2) = second() else {
                    return Ok(self.no_data(inst));
                };
                propagate_sub(&o1.error, &o2.error)
            }
            BinaryOp::Mul | BinaryOp::FMul => {
                let Some(o2) = second() else {
                    return Ok(self.no_data(inst));
                };
                propagate_mul(&o1.range, &o1.error, &o2.range, &o2.error)
            }
            BinaryOp::SDiv | BinaryOp::UDiv | BinaryOp::FDiv => {
                let Some(o2) = second() else {
                    return Ok(self.no_data(inst));
                };
                let Some(error) = self.division_error(*op, &o1, &o2, result_range) else {
                    debug!(inst = %inst.name, "division: divisor range contains zero");
                    return Ok(false);
                };
                error
            }
            // Shift amounts carry no error of their own
            BinaryOp::Shl => o1.error,
            BinaryOp::LShr | BinaryOp::AShr => {
                let Some(range) = result_range else {
                    return Ok(self.no_data(inst));
                };
                &o1.error + &AffineForm::with_error(0.0, range.rounding_error())
            }
            BinaryOp::SRem
            | BinaryOp::URem
            | BinaryOp::FRem
            | BinaryOp::And
            | BinaryOp::Or
            | BinaryOp::Xor => {
                debug!(inst = %inst.name, op = ?op, "unsupported binary operation");
                return Ok(false);
            }
        };
        Ok(self.write(state, inst, error))
    }

    fn division_error(&self, op: BinaryOp, o1: &Operand, o2: &Operand, result: Option<FPInterval>) -> Option<AffineForm> {
        let error = propagate_div(&o1.range, &o1.error, &o2.range, &o2.error)?;
        if matches!(op, BinaryOp::FDiv) {
            return Some(error);
        }
        let rounding = result.map_or(o1.range.rounding_error(), |r| r.rounding_error());
        Some(&error + &AffineForm::with_error(0.0, rounding))
    }

    /// Record a computed error for `inst`
    pub(crate) fn write(&self, state: &mut ActivationState, inst: &Instruction, error: AffineForm) -> bool {
        debug!(inst = %inst.name, error = error.noise_bound(), "error computed");
        state.store.set_error(self.key(inst), error);
        true
    }

    pub(crate) fn no_data(&self, inst: &Instruction) -> bool {
        debug!(inst = %inst.name, opcode = ?inst.opcode(), "ignored (no data)");
        false
    }
}
