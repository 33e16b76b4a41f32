//! Closed-form error bound of a simple loop
//!
//! With `K[i][j]` bounding `|∂e_i/∂s_j|` over the symbol ranges and `k` the
//! trip count, the error after the loop is
//!
//! ```text
//!   E = K^k · E0 + R · r
//!   R = (I - K)^-1 (I - K^k)        or Σ_{i<k} K^i when I - K is singular
//! ```
//!
//! where `E0` holds the errors entering the loop and `r` the rounding error
//! one iteration introduces on error-free inputs.

use tracing::debug;

use super::expr_builder::{LoopExprBuilder, LoopSystem};
use super::interval_eval::max_abs;
use super::loop_shape::{recognize, LoopShape};
use crate::features::flow_graph::PhiMode;
use crate::features::lipschitz::domain::{Interval, Matrix};
use crate::features::lipschitz::error::{LipschitzError, LipschitzResult};
use crate::features::propagation::{ActivationState, InstructionPropagator, NoCalls};
use crate::features::range_store::RangeErrorStore;
use crate::shared::ir::{BlockId, InstKind, Value, ValueKey};
use crate::shared::models::{AffineForm, FPInterval};

/// Errors computed for one loop
#[derive(Debug, Clone, PartialEq)]
pub struct LoopBound {
    pub shape: LoopShape,
    pub lipschitz: Matrix,
    /// Symbol keys with their final error, in symbol order
    pub errors: Vec<(ValueKey, f64)>,
    /// Exit-block phis that received an error
    pub exit_values: Vec<ValueKey>,
}

impl LoopBound {
    pub fn error_of(&self, key: &ValueKey) -> Option<f64> {
        self.errors.iter().find(|(k, _)| k == key).map(|(_, e)| *e)
    }
}

pub struct LipschitzLoopAnalyzer<'p, 'a> {
    propagator: &'p InstructionPropagator<'a>,
}

impl<'p, 'a> LipschitzLoopAnalyzer<'p, 'a> {
    pub fn new(propagator: &'p InstructionPropagator<'a>) -> Self {
        Self { propagator }
    }

    /// Bound the errors of the loop headed by `header` after `trip_count`
    /// iterations and pin them in `state`.
    ///
    /// Nothing is written when an error is returned.
    pub fn apply(&self, state: &mut ActivationState, header: BlockId, trip_count: u32) -> LipschitzResult<LoopBound> {
        let shape = recognize(self.propagator.loops, header)?;
        let system = LoopExprBuilder::new(self.propagator, &state.store, shape).build()?;
        if system.is_empty() {
            return Err(LipschitzError::UnsupportedValue(format!("loop at block {} carries no values", header.0)));
        }

        let k = self.lipschitz_matrix(&system, &state.store)?;
        let kk = k.pow(trip_count);
        let roundoff = roundoff_matrix(&k, &kk, trip_count);
        let initial = self.initial_errors(&system, &state.store);
        let rounding = self.rounding_errors(&system, &state.store, &shape)?;
        debug!(header = header.0, k = %k, initial = ?initial, rounding = ?rounding, "closed-form loop inputs");

        let amplified = kk.mul_vec(&initial);
        let accumulated = roundoff.mul_vec(&rounding);
        let totals: Vec<f64> = amplified.iter().zip(&accumulated).map(|(a, b)| a + b).collect();

        let errors: Vec<(ValueKey, f64)> = system.symbols.iter().map(|s| s.key).zip(totals.iter().copied()).collect();
        let exit_values = self.assign(state, &system, &shape, &totals);
        Ok(LoopBound {
            shape,
            lipschitz: k,
            errors,
            exit_values,
        })
    }

    fn lipschitz_matrix(&self, system: &LoopSystem, store: &RangeErrorStore) -> LipschitzResult<Matrix> {
        let n = system.len();
        let lookup = |s: usize| -> LipschitzResult<Interval> {
            let symbol = &system.symbols[s];
            match store.get_range(&symbol.key) {
                Some(range) if *range != FPInterval::uninitialized() => Ok(Interval::from(range)),
                _ => Err(LipschitzError::MissingRange(symbol.name.clone())),
            }
        };

        let mut k = Matrix::zeros(n, n);
        for (r, row) in system.symbols.iter().enumerate() {
            for (c, col) in system.symbols.iter().enumerate() {
                let derivative = row.expr.diff(c);
                let bound = max_abs(&derivative, lookup)?;
                debug!(row = %row.name, col = %col.name, derivative = %derivative, bound, "lipschitz entry");
                k.set(r, c, bound);
            }
        }
        Ok(k)
    }

    /// Error entering the loop for each symbol; 0 without data
    fn initial_errors(&self, system: &LoopSystem, store: &RangeErrorStore) -> Vec<f64> {
        system
            .symbols
            .iter()
            .map(|s| {
                s.initial
                    .and_then(|v| self.propagator.value_key(v))
                    .and_then(|key| store.get_error(&key))
                    .map_or(0.0, AffineForm::noise_bound)
            })
            .collect()
    }

    /// Rounding of one iteration: the loop blocks propagated once over a
    /// copy of the store in which every error is zero
    fn rounding_errors(&self, system: &LoopSystem, store: &RangeErrorStore, shape: &LoopShape) -> LipschitzResult<Vec<f64>> {
        let mut local = ActivationState::new(store.with_zero_errors());
        for block in shape.blocks() {
            self.propagator
                .propagate_block(&mut local, &mut NoCalls, block, PhiMode::All)
                .map_err(|e| LipschitzError::Roundoff(e.to_string()))?;
        }
        Ok(system
            .symbols
            .iter()
            .map(|s| local.store.get_error(&s.key).map_or(0.0, AffineForm::noise_bound))
            .collect())
    }

    /// Pin the loop-defined symbols and the exit phis fed by them
    fn assign(&self, state: &mut ActivationState, system: &LoopSystem, shape: &LoopShape, totals: &[f64]) -> Vec<ValueKey> {
        let func = self.propagator.func;
        for (symbol, &total) in system.symbols.iter().zip(totals) {
            let Some(inst) = func.defining_inst(symbol.value) else {
                continue;
            };
            if shape.contains(inst.block) {
                state.store.set_error(symbol.key, AffineForm::with_error(0.0, total));
                state.pinned.insert(inst.id);
            }
        }

        let mut exit_values = Vec::new();
        for phi in func.phis(shape.exit) {
            let InstKind::Phi { incoming } = &phi.kind else {
                continue;
            };
            let Some(&(from_cond, _)) = incoming.iter().find(|(_, b)| *b == shape.cond) else {
                continue;
            };
            let Some(source) = self.trace_to_body_value(from_cond, shape) else {
                continue;
            };
            let Some(idx) = self.propagator.value_key(source).and_then(|key| system.index_of(&key)) else {
                continue;
            };

            let key = self.propagator.key(phi);
            let source_range = self.propagator.value_key(source).and_then(|k| state.store.get_range(&k)).copied();
            state.store.set_error(key, AffineForm::with_error(0.0, totals[idx]));
            let has_range = state.store.get_range(&key).map_or(false, |r| !r.is_uninitialized());
            if let Some(range) = source_range.filter(|_| !has_range) {
                state.store.set_range(key, range);
            }
            state.pinned.insert(phi.id);
            exit_values.push(key);
        }
        debug!(exit_values = exit_values.len(), "closed-form errors assigned");
        exit_values
    }

    /// A condition phi stands for the value it receives from the body
    fn trace_to_body_value(&self, value: Value, shape: &LoopShape) -> Option<Value> {
        match self.propagator.func.defining_inst(value) {
            Some(inst) if inst.block == shape.cond => match &inst.kind {
                InstKind::Phi { incoming } => incoming.iter().find(|(_, b)| *b == shape.body).map(|(v, _)| *v),
                _ => Some(value),
            },
            _ => Some(value),
        }
    }
}

/// `(I - K)^-1 (I - K^k)`, or the explicit sum `I + K + ... + K^(k-1)`
/// when `I - K` has no inverse
fn roundoff_matrix(k: &Matrix, kk: &Matrix, trip_count: u32) -> Matrix {
    let n = k.rows();
    let identity = Matrix::identity(n);
    if let Some(inverse) = identity.sub(k).inverse() {
        return inverse.mul(&identity.sub(kk));
    }
    debug!(trip_count, "I - K is singular, summing powers of K");
    let mut sum = Matrix::zeros(n, n);
    let mut power = identity;
    for _ in 0..trip_count {
        sum = sum.add(&power);
        power = power.mul(k);
    }
    sum
}
