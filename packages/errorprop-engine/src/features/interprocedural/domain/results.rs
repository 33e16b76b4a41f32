//! Results collected across activations
//!
//! A function may be analyzed in several contexts; each value keeps the
//! worst error seen and each comparison is flagged if any context flags it.

use std::collections::BTreeMap;

use crate::features::propagation::ActivationState;
use crate::features::range_store::TargetErrorAggregator;
use crate::shared::ir::{FunctionId, InstId, ValueKey};
use crate::shared::models::{CmpErrorInfo, RangeError};

#[derive(Debug, Clone, Default)]
pub struct AnalysisResults {
    values: BTreeMap<ValueKey, RangeError>,
    comparisons: BTreeMap<(FunctionId, InstId), CmpErrorInfo>,
    targets: TargetErrorAggregator,
}

impl AnalysisResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the instruction results of one activation of `func`
    pub fn absorb(&mut self, func: FunctionId, state: &ActivationState) {
        for (key, re) in state.store.entries() {
            if !matches!(key, ValueKey::Inst(owner, _) if *owner == func) {
                continue;
            }
            let Some(bound) = re.abs_error() else {
                continue;
            };
            let larger = self
                .values
                .get(key)
                .and_then(RangeError::abs_error)
                .map_or(true, |old| bound > old);
            if larger {
                self.values.insert(*key, re.clone());
            }
        }

        for (&inst, info) in &state.cmp {
            self.comparisons
                .entry((func, inst))
                .and_modify(|seen| {
                    seen.may_be_wrong |= info.may_be_wrong;
                    seen.tolerance = seen.tolerance.min(info.tolerance);
                })
                .or_insert(*info);
        }
        self.targets.merge(state.store.targets());
    }

    pub fn value(&self, key: &ValueKey) -> Option<&RangeError> {
        self.values.get(key)
    }

    pub fn error_of(&self, key: &ValueKey) -> Option<f64> {
        self.values.get(key).and_then(RangeError::abs_error)
    }

    pub fn values(&self) -> impl Iterator<Item = (&ValueKey, &RangeError)> + '_ {
        self.values.iter()
    }

    pub fn comparison(&self, func: FunctionId, inst: InstId) -> Option<&CmpErrorInfo> {
        self.comparisons.get(&(func, inst))
    }

    pub fn comparisons(&self) -> impl Iterator<Item = (&(FunctionId, InstId), &CmpErrorInfo)> + '_ {
        self.comparisons.iter()
    }

    pub fn targets(&self) -> &TargetErrorAggregator {
        &self.targets
    }
}
