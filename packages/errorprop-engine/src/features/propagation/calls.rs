//! Calls, library functions and returns

use tracing::debug;

use super::context::{ActivationState, CallAnalyzer, InstructionPropagator};
use crate::errors::{ErrorPropError, Result};
use crate::shared::ir::{Callee, FunctionId, InstKind, Instruction, Value, ValueKey};
use crate::shared::models::{AffineForm, MonotonicFn, RangeError};

impl<'a> InstructionPropagator<'a> {
    pub(crate) fn propagate_call(
        &self,
        state: &mut ActivationState,
        calls: &mut dyn CallAnalyzer,
        inst: &Instruction,
    ) -> Result<bool> {
        let Some((callee, args)) = inst.call_site() else {
            return Err(ErrorPropError::malformed(format!(
                "{}: instruction {} is not a call",
                self.func.name, inst.id.0
            )));
        };

        if let Some(f) = self.module.callee_name(callee).and_then(MonotonicFn::from_callee_name) {
            return self.propagate_library_fn(state, inst, f, args);
        }

        let Some(target) = self.analyzable_callee(callee) else {
            debug!(inst = %inst.name, "call to a function without a body (no data)");
            return Ok(false);
        };
        calls.analyze_call(self.func, target, args, &mut state.store)?;

        let summary = ValueKey::Function(target);
        let (error, range) = match state.store.get_range_error(&summary) {
            Some(RangeError {
                range,
                error: Some(error),
            }) => (error.clone(), Some(*range)),
            _ => match calls.summary_error(target) {
                Some(error) => (error, None),
                None => return Ok(self.no_data(inst)),
            },
        };

        if self.result_range(&state.store, inst).is_none() {
            if let Some(range) = range {
                state.store.set_range(self.key(inst), range);
            }
        }
        Ok(self.write(state, inst, error))
    }

    /// `sqrt`, `log`, `exp`, `asin` and `acos`: linearized error plus the
    /// result format's rounding error
    fn propagate_library_fn(
        &self,
        state: &mut ActivationState,
        inst: &Instruction,
        f: MonotonicFn,
        args: &[Value],
    ) -> Result<bool> {
        let Some(&arg) = args.first() else {
            return Err(ErrorPropError::malformed(format!(
                "{}: call to {:?} without an argument",
                self.func.name, f
            )));
        };
        let result_range = self.result_range(&state.store, inst);
        let format = result_range
            .map(|r| r.format)
            .or_else(|| self.format_of(&state.store, arg));
        let Some(source) = self.operand(&state.store, arg, format) else {
            return Ok(self.no_data(inst));
        };
        let Some(linearized) = f.linearize_error(&source.range, &source.error) else {
            debug!(inst = %inst.name, function = ?f, "argument range leaves the domain");
            return Ok(false);
        };
        let rounding = result_range.map_or(0.0, |r| r.rounding_error());
        let error = &linearized + &AffineForm::with_error(0.0, rounding);

        match result_range.or_else(|| f.image(&source.range)) {
            Some(range) => {
                debug!(inst = %inst.name, function = ?f, error = error.noise_bound(), "library call");
                state
                    .store
                    .set_range_error(self.key(inst), RangeError::with_error(range, error));
                Ok(true)
            }
            None => Ok(self.write(state, inst, error)),
        }
    }

    /// Attach the returned error and raise the function's summary
    pub(crate) fn propagate_ret(&self, state: &mut ActivationState, inst: &Instruction) -> Result<bool> {
        let InstKind::Ret { value } = &inst.kind else {
            return Err(ErrorPropError::malformed(format!(
                "{}: instruction {} is not a return",
                self.func.name, inst.id.0
            )));
        };
        let Some(returned) = value.and_then(|v| self.operand(&state.store, v, None)) else {
            return Ok(self.no_data(inst));
        };

        state.store.set_error(self.key(inst), returned.error.clone());
        let summary = ValueKey::Function(self.func.id);
        let larger = state
            .store
            .get_error(&summary)
            .map_or(true, |old| returned.abs_error() > old.noise_bound());
        if larger {
            debug!(function = %self.func.name, error = returned.abs_error(), "function error raised");
            state.store.set_range_error(
                summary,
                RangeError::with_error(returned.range, returned.error.flatten()),
            );
        }
        Ok(true)
    }

    fn analyzable_callee(&self, callee: &Callee) -> Option<FunctionId> {
        let id = match callee {
            Callee::Direct(id) | Callee::Indirect(Value::Function(id)) => *id,
            Callee::External(_) | Callee::Indirect(_) => return None,
        };
        self.module
            .function(id)
            .filter(|f| !f.is_declaration())
            .map(|f| f.id)
    }
}
