//! Range/error store of one function activation
//!
//! Maps value identities to their range and optional error. Every error write
//! on a labelled value also raises the label's entry in the target
//! aggregator. Missing entries read as `None`: "no data" is never zero.

use ahash::AHashMap as FastHashMap;
use std::sync::Arc;
use tracing::debug;

use super::targets::{TargetErrorAggregator, TargetLabels};
use crate::features::struct_errors::StructErrorMap;
use crate::shared::ir::{Function, FunctionId, InputInfo, Module, Value, ValueInfo, ValueKey};
use crate::shared::models::{AffineForm, FPInterval, RangeError};

#[derive(Debug, Clone, Default)]
pub struct RangeErrorStore {
    entries: FastHashMap<ValueKey, RangeError>,
    labels: Arc<TargetLabels>,
    targets: TargetErrorAggregator,
    structs: StructErrorMap,
}

impl RangeErrorStore {
    pub fn new(labels: Arc<TargetLabels>) -> Self {
        Self {
            labels,
            ..Self::default()
        }
    }

    /// Empty store aware of the module's target labels
    pub fn for_module(module: &Module) -> Self {
        Self::new(Arc::new(TargetLabels::from_module(module)))
    }

    // ========================================================================
    // Basic access
    // ========================================================================

    pub fn get_range(&self, key: &ValueKey) -> Option<&FPInterval> {
        self.entries.get(key).map(|re| &re.range)
    }

    pub fn get_error(&self, key: &ValueKey) -> Option<&AffineForm> {
        self.entries.get(key).and_then(|re| re.error.as_ref())
    }

    pub fn get_range_error(&self, key: &ValueKey) -> Option<&RangeError> {
        self.entries.get(key)
    }

    /// Set the error, creating an uninitialized range entry if none exists
    pub fn set_error(&mut self, key: ValueKey, error: AffineForm) {
        let bound = error.noise_bound();
        self.entries.entry(key).or_default().error = Some(error);
        self.update_target(&key, bound);
    }

    pub fn set_range_error(&mut self, key: ValueKey, value: RangeError) {
        if let Some(bound) = value.abs_error() {
            self.update_target(&key, bound);
        }
        self.entries.insert(key, value);
    }

    /// Set the range, keeping any error already recorded
    pub fn set_range(&mut self, key: ValueKey, range: FPInterval) {
        self.entries.entry(key).or_default().range = range;
    }

    pub fn erase(&mut self, key: &ValueKey) -> Option<RangeError> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &ValueKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ValueKey, &RangeError)> + '_ {
        self.entries.iter()
    }

    /// Raise the error of `key` to `candidate` when the candidate is larger.
    ///
    /// The existing range is kept when the candidate's is uninitialized.
    pub fn raise_error(&mut self, key: ValueKey, candidate: &RangeError) -> bool {
        let Some(new_bound) = candidate.abs_error() else {
            return false;
        };
        let current = self.entries.get(&key);
        if current.and_then(RangeError::abs_error).map_or(false, |old| old >= new_bound) {
            return false;
        }
        let range = match current {
            Some(re) if candidate.range.is_uninitialized() => re.range,
            _ => candidate.range,
        };
        self.set_range_error(key, RangeError::new(range, candidate.error.clone()));
        true
    }

    fn update_target(&mut self, key: &ValueKey, bound: f64) {
        if let Some(label) = self.labels.label_of(key) {
            self.targets.update(label, bound);
        }
    }

    pub fn targets(&self) -> &TargetErrorAggregator {
        &self.targets
    }

    pub fn structs(&self) -> &StructErrorMap {
        &self.structs
    }

    pub fn structs_mut(&mut self) -> &mut StructErrorMap {
        &mut self.structs
    }

    // ========================================================================
    // Seeding from annotations
    // ========================================================================

    /// Range plus optional initial error (as one fresh noise term) from an annotation
    pub fn seed_from_info(&mut self, key: ValueKey, info: &InputInfo) -> bool {
        let range = info
            .interval()
            .unwrap_or_else(|| FPInterval::point(info.format, 0.0));
        let error = info.initial_error.map(|e| AffineForm::with_error(0.0, e));
        let has_error = error.is_some();
        self.set_range_error(key, RangeError::new(range, error));
        has_error
    }

    /// Seed every annotated formal of `func`
    pub fn seed_arguments(&mut self, module: &Module, func: &Function) {
        for (idx, param) in func.params.iter().enumerate() {
            let key = ValueKey::Arg(func.id, idx as u32);
            match &param.info {
                Some(ValueInfo::Scalar(info)) => {
                    self.seed_from_info(key, info);
                }
                Some(info @ ValueInfo::Struct(_)) => {
                    if let Some(sid) = param.ty.pointee_struct() {
                        self.structs.seed_from_info(module, key, sid, info);
                    }
                }
                None => {}
            }
        }
    }

    /// Seed every annotated global, scalar or aggregate
    pub fn seed_globals(&mut self, module: &Module) {
        for global in &module.globals {
            let key = ValueKey::Global(global.id);
            match &global.info {
                Some(ValueInfo::Scalar(info)) => {
                    self.seed_from_info(key, info);
                }
                Some(info @ ValueInfo::Struct(_)) => {
                    if let Some(sid) = global.ty.as_struct() {
                        self.structs.seed_from_info(module, key, sid, info);
                    }
                }
                None => {
                    debug!(global = %global.name, "global ignored (no data)");
                }
            }
        }
    }

    /// Copy the data of each actual argument onto the callee's formal.
    ///
    /// Actuals are operands of `caller` read from `source`, which may be a
    /// snapshot taken before the callee's entries were cleared.
    pub fn apply_argument_errors(
        &mut self,
        source: &RangeErrorStore,
        caller: FunctionId,
        callee: &Function,
        actuals: &[Value],
    ) {
        for (idx, actual) in actuals.iter().enumerate().take(callee.params.len()) {
            let Some(actual_key) = ValueKey::of(caller, *actual) else {
                continue;
            };
            let Some(actual_re) = source.entries.get(&actual_key).cloned() else {
                continue;
            };
            let formal = ValueKey::Arg(callee.id, idx as u32);
            let merged = match self.entries.get(&formal) {
                Some(annotated) => RangeError::new(
                    if actual_re.range.is_uninitialized() {
                        annotated.range
                    } else {
                        actual_re.range
                    },
                    actual_re.error.or_else(|| annotated.error.clone()),
                ),
                None => actual_re,
            };
            debug!(callee = %callee.name, arg = idx, error = ?merged.abs_error(), "argument error applied");
            self.set_range_error(formal, merged);
        }
    }

    // ========================================================================
    // Activation support
    // ========================================================================

    /// Drop every entry owned by `func` (its locals, formals and summary)
    pub fn erase_function(&mut self, func: &Function) {
        let id = func.id;
        self.entries
            .retain(|key, _| key.owner() != Some(id) && *key != ValueKey::Function(id));
        self.structs.erase_locals(func);
    }

    /// Take over every global entry of `other`
    pub fn merge_globals(&mut self, other: &RangeErrorStore) {
        for (key, re) in &other.entries {
            if matches!(key, ValueKey::Global(_)) {
                self.entries.insert(*key, re.clone());
            }
        }
        self.structs.merge_global_trees(&other.structs);
    }

    pub fn merge_targets(&mut self, other: &RangeErrorStore) {
        self.targets.merge(&other.targets);
    }

    /// Copy keeping every range but with all errors, field errors
    /// included, set to zero.
    ///
    /// Propagating through such a store measures the rounding introduced by
    /// the code alone.
    pub fn with_zero_errors(&self) -> RangeErrorStore {
        let entries = self
            .entries
            .iter()
            .map(|(key, re)| {
                let error = re.error.as_ref().map(|_| AffineForm::zero());
                (*key, RangeError::new(re.range, error))
            })
            .collect();
        RangeErrorStore {
            entries,
            labels: Arc::clone(&self.labels),
            targets: TargetErrorAggregator::default(),
            structs: self.structs.with_zero_errors(),
        }
    }
}
