//! Propagation context: per-activation state and operand lookup

use ahash::AHashSet as FastHashSet;
use std::collections::BTreeMap;

use crate::config::ErrorPropConfig;
use crate::errors::Result;
use crate::features::flow_graph::LoopInfo;
use crate::features::memory_deps::MemoryDependenceOracle;
use crate::features::range_store::RangeErrorStore;
use crate::shared::ir::{Function, FunctionId, InstId, Instruction, Module, Value, ValueKey};
use crate::shared::models::{AffineForm, CmpErrorInfo, FPInterval, FixedPointFormat, RangeError};

/// Mutable state of one function activation
#[derive(Debug, Clone, Default)]
pub struct ActivationState {
    pub store: RangeErrorStore,
    pub cmp: BTreeMap<InstId, CmpErrorInfo>,
    /// Values fixed by a closed-form loop bound; later visits leave them alone
    pub pinned: FastHashSet<InstId>,
}

impl ActivationState {
    pub fn new(store: RangeErrorStore) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }
}

/// Interprocedural hook used by call propagation
pub trait CallAnalyzer {
    /// Analyze `callee` for a call site in `caller`, merging its results into `store`
    fn analyze_call(
        &mut self,
        caller: &Function,
        callee: FunctionId,
        args: &[Value],
        store: &mut RangeErrorStore,
    ) -> Result<()>;

    /// Error summary of `callee` over every context seen so far
    fn summary_error(&self, callee: FunctionId) -> Option<AffineForm>;
}

/// Call analyzer that never descends into callees
#[derive(Debug, Default)]
pub struct NoCalls;

impl CallAnalyzer for NoCalls {
    fn analyze_call(&mut self, _: &Function, _: FunctionId, _: &[Value], _: &mut RangeErrorStore) -> Result<()> {
        Ok(())
    }

    fn summary_error(&self, _: FunctionId) -> Option<AffineForm> {
        None
    }
}

/// Range and error of an operand with data
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub range: FPInterval,
    pub error: AffineForm,
}

impl Operand {
    pub fn abs_error(&self) -> f64 {
        self.error.noise_bound()
    }

    pub fn into_range_error(self) -> RangeError {
        RangeError::with_error(self.range, self.error)
    }
}

/// Transfer functions over one function body
pub struct InstructionPropagator<'a> {
    pub module: &'a Module,
    pub func: &'a Function,
    pub config: &'a ErrorPropConfig,
    pub loops: &'a LoopInfo,
    pub memory: &'a dyn MemoryDependenceOracle,
}

impl<'a> InstructionPropagator<'a> {
    pub fn new(
        module: &'a Module,
        func: &'a Function,
        config: &'a ErrorPropConfig,
        loops: &'a LoopInfo,
        memory: &'a dyn MemoryDependenceOracle,
    ) -> Self {
        Self {
            module,
            func,
            config,
            loops,
            memory,
        }
    }

    pub fn key(&self, inst: &Instruction) -> ValueKey {
        ValueKey::Inst(self.func.id, inst.id)
    }

    pub fn value_key(&self, value: Value) -> Option<ValueKey> {
        ValueKey::of(self.func.id, value)
    }

    /// Range recorded for the result of `inst`
    pub fn result_range(&self, store: &RangeErrorStore, inst: &Instruction) -> Option<FPInterval> {
        store.get_range(&self.key(inst)).copied()
    }

    /// Range and error of `value`.
    ///
    /// Integer constants are read with `format` (usually the result's), carry
    /// that format's rounding error and need it to be known; float constants
    /// are exact.
    pub fn operand(&self, store: &RangeErrorStore, value: Value, format: Option<FixedPointFormat>) -> Option<Operand> {
        match value {
            Value::ConstInt(raw) => {
                let format = format?;
                let real = format.interpret(raw);
                Some(Operand {
                    range: FPInterval::point(format, real),
                    error: AffineForm::with_error(0.0, format.rounding_error()),
                })
            }
            Value::ConstFloat(real) => Some(Operand {
                range: FPInterval::point(FixedPointFormat::uninitialized(), real),
                error: AffineForm::zero(),
            }),
            Value::Undef => None,
            _ => {
                let re = store.get_range_error(&self.value_key(value)?)?;
                Some(Operand {
                    range: re.range,
                    error: re.error.clone()?,
                })
            }
        }
    }

    /// Format recorded for a non-constant value
    pub fn format_of(&self, store: &RangeErrorStore, value: Value) -> Option<FixedPointFormat> {
        let key = self.value_key(value)?;
        store.get_range(&key).map(|r| r.format)
    }
}
