//! Memory operations: stores, loads, address computations and stack slots

use tracing::debug;

use super::context::{ActivationState, InstructionPropagator};
use crate::errors::{ErrorPropError, Result};
use crate::features::memory_deps::MemoryDependenceResolver;
use crate::shared::ir::{InstKind, Instruction, Type, Value, ValueInfo, ValueKey};
use crate::shared::models::{AffineForm, RangeError};

impl<'a> InstructionPropagator<'a> {
    /// Attach the stored value's error to the store, to the formal it writes
    /// through (if any) and to the struct field it addresses (if any)
    pub(crate) fn propagate_store(&self, state: &mut ActivationState, inst: &Instruction) -> Result<bool> {
        let InstKind::Store { value, ptr } = &inst.kind else {
            return Err(ErrorPropError::malformed(format!(
                "{}: instruction {} is not a store",
                self.func.name, inst.id.0
            )));
        };
        let format = self.format_of(&state.store, *ptr);
        let source = match self.operand(&state.store, *value, format) {
            Some(o) => Some(o.into_range_error()),
            None => self
                .value_key(*ptr)
                .and_then(|k| state.store.get_range_error(&k))
                .filter(|re| re.error.is_some())
                .cloned(),
        };
        let Some(source) = source else {
            return Ok(self.no_data(inst));
        };

        debug!(inst = %inst.name, error = ?source.abs_error(), "store error attached");
        state.store.set_range_error(self.key(inst), source.clone());
        if let Some(idx) = self.formal_destination(*ptr) {
            let formal = ValueKey::Arg(self.func.id, idx);
            if state.store.raise_error(formal, &source) {
                debug!(formal = idx, "formal write error raised");
            }
        }
        state
            .store
            .structs_mut()
            .set_field_error(self.module, self.func, *ptr, source);
        Ok(true)
    }

    /// Read the candidates reaching the load from memory and from the struct
    /// field it addresses; several candidates collapse to the largest error
    pub(crate) fn propagate_load(&self, state: &mut ActivationState, inst: &Instruction) -> Result<bool> {
        let InstKind::Load { ptr } = &inst.kind else {
            return Err(ErrorPropError::malformed(format!(
                "{}: instruction {} is not a load",
                self.func.name, inst.id.0
            )));
        };
        let resolver = MemoryDependenceResolver::new(self.memory, self.func);
        let mut candidates: Vec<RangeError> = resolver
            .resolve(&state.store, inst.id)
            .into_iter()
            .filter(|re| re.error.is_some())
            .collect();
        if let Some(field) = state
            .store
            .structs()
            .get_field_error(self.module, self.func, *ptr)
            .filter(|re| re.error.is_some())
        {
            if !candidates.contains(field) {
                candidates.push(field.clone());
            }
        }

        let own = self
            .result_range(&state.store, inst)
            .filter(|r| !r.is_uninitialized());
        let resolved = match candidates.len() {
            0 => {
                let Some(range) = own else {
                    return Ok(self.no_data(inst));
                };
                RangeError::with_error(range, AffineForm::with_error(0.0, range.rounding_error()))
            }
            1 => {
                let mut only = candidates.remove(0);
                if let (Some(range), true) = (own, only.range.is_uninitialized()) {
                    only.range = range;
                }
                only
            }
            _ => {
                // The merged value takes the load's own range
                let Some(range) = own else {
                    return Ok(self.no_data(inst));
                };
                let max = candidates
                    .iter()
                    .filter_map(RangeError::abs_error)
                    .fold(0.0, f64::max);
                RangeError::with_error(range, AffineForm::with_error(0.0, max))
            }
        };
        debug!(
            inst = %inst.name,
            candidates = candidates.len(),
            error = ?resolved.abs_error(),
            "load resolved"
        );
        state.store.set_range_error(self.key(inst), resolved);
        Ok(true)
    }

    /// Address computations carry the record of their base pointer
    pub(crate) fn propagate_gep(&self, state: &mut ActivationState, inst: &Instruction) -> Result<bool> {
        let InstKind::GetElementPtr { base, .. } = &inst.kind else {
            return Err(ErrorPropError::malformed(format!(
                "{}: instruction {} is not an address computation",
                self.func.name, inst.id.0
            )));
        };
        let Some(record) = self
            .value_key(*base)
            .and_then(|k| state.store.get_range_error(&k))
            .cloned()
        else {
            return Ok(self.no_data(inst));
        };
        state.store.set_range_error(self.key(inst), record);
        Ok(true)
    }

    /// Aggregate stack slots start from their annotation, if they have one
    pub(crate) fn propagate_alloca(&self, state: &mut ActivationState, inst: &Instruction) -> Result<bool> {
        let InstKind::Alloca { allocated } = &inst.kind else {
            return Err(ErrorPropError::malformed(format!(
                "{}: instruction {} is not a stack allocation",
                self.func.name, inst.id.0
            )));
        };
        match (allocated, &inst.info) {
            (Type::Struct(sid), Some(info @ ValueInfo::Struct(_))) => {
                state
                    .store
                    .structs_mut()
                    .seed_from_info(self.module, self.key(inst), *sid, info);
                Ok(true)
            }
            (_, Some(ValueInfo::Struct(_))) => Err(ErrorPropError::malformed(format!(
                "{}: aggregate annotation on non-aggregate slot '{}'",
                self.func.name, inst.name
            ))),
            _ => Ok(false),
        }
    }

    /// Formal parameter a pointer is derived from through address
    /// computations and casts
    fn formal_destination(&self, pointer: Value) -> Option<u32> {
        let mut current = pointer;
        for _ in 0..=self.func.insts.len() {
            match current {
                Value::Arg(idx) => return Some(idx),
                Value::Inst(id) => match &self.func.inst(id)?.kind {
                    InstKind::GetElementPtr { base, .. } => current = *base,
                    InstKind::Cast { operand, .. } => current = *operand,
                    _ => return None,
                },
                _ => return None,
            }
        }
        None
    }
}
