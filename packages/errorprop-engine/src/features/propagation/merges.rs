//! Select and phi: the result error is the largest operand error.
//!
//! A select needs data for both arms. A phi reads the incoming values
//! visible on the current visit and skips those without data.
//!
//! Branch correlation is not tracked, so the result gets one fresh noise
//! term instead of reusing any operand's symbols.

use tracing::debug;

use super::context::{ActivationState, InstructionPropagator, Operand};
use crate::errors::{ErrorPropError, Result};
use crate::features::flow_graph::PhiMode;
use crate::shared::ir::{BlockId, InstKind, Instruction, Value};
use crate::shared::models::{AffineForm, FPInterval, RangeError};

/// Largest absolute error among operands with data
pub fn max_abs_error<'o>(operands: impl IntoIterator<Item = &'o Operand>) -> Option<f64> {
    operands
        .into_iter()
        .map(Operand::abs_error)
        .fold(None, |acc: Option<f64>, e| Some(acc.map_or(e, |m| m.max(e))))
}

impl<'a> InstructionPropagator<'a> {
    pub(crate) fn propagate_select(&self, state: &mut ActivationState, inst: &Instruction) -> Result<bool> {
        let InstKind::Select {
            if_true, if_false, ..
        } = &inst.kind
        else {
            return Err(ErrorPropError::malformed(format!(
                "{}: instruction {} is not a select",
                self.func.name, inst.id.0
            )));
        };
        let format = self.result_range(&state.store, inst).map(|r| r.format);
        // Either arm may be taken: both must be known
        let (Some(t), Some(f)) = (
            self.operand(&state.store, *if_true, format),
            self.operand(&state.store, *if_false, format),
        ) else {
            debug!(inst = %inst.name, "select: no data");
            return Ok(false);
        };
        let max = t.abs_error().max(f.abs_error());
        Ok(self.write(state, inst, AffineForm::with_error(0.0, max)))
    }

    pub(crate) fn propagate_phi(&self, state: &mut ActivationState, inst: &Instruction, mode: PhiMode) -> Result<bool> {
        let InstKind::Phi { incoming } = &inst.kind else {
            return Err(ErrorPropError::malformed(format!(
                "{}: instruction {} is not a phi",
                self.func.name, inst.id.0
            )));
        };
        let prior = self.result_range(&state.store, inst);
        let format = prior.map(|r| r.format);
        let operands: Vec<Operand> = self
            .visible_incoming(inst.block, incoming, mode)
            .filter_map(|v| self.operand(&state.store, v, format))
            .collect();
        let Some(max) = max_abs_error(&operands) else {
            debug!(inst = %inst.name, mode = ?mode, "phi: no data");
            return Ok(false);
        };

        let range = match prior {
            Some(r) if !r.is_uninitialized() => r,
            _ => operands
                .iter()
                .map(|o| o.range)
                .reduce(|a, b| a.union(&b))
                .unwrap_or_else(FPInterval::uninitialized),
        };
        debug!(inst = %inst.name, error = max, "phi error computed");
        state.store.set_range_error(
            self.key(inst),
            RangeError::with_error(range, AffineForm::with_error(0.0, max)),
        );
        Ok(true)
    }

    /// Incoming values read on this visit of the phi's block
    fn visible_incoming<'i>(
        &self,
        block: BlockId,
        incoming: &'i [(Value, BlockId)],
        mode: PhiMode,
    ) -> impl Iterator<Item = Value> + 'i {
        let lp = self
            .loops
            .loop_with_header(block)
            .and_then(|id| self.loops.get(id))
            .cloned();
        incoming
            .iter()
            .filter(move |(_, pred)| match (&lp, mode) {
                (Some(l), PhiMode::Entry) => !l.contains(*pred),
                (Some(l), PhiMode::Latch) => l.contains(*pred),
                _ => true,
            })
            .map(|(v, _)| *v)
    }
}
