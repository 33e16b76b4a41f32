//! Interprocedural driver
//!
//! Every analyzed call runs the callee in a private activation:
//!
//! ```text
//!   caller store ──clone──► local store
//!                             │ erase the callee's previous entries
//!                             │ seed formals, bind actuals, bind struct pointers
//!                             ▼
//!                          schedule + propagate
//!                             │
//!   caller store ◄──merge─────┘ return summary, globals, pointer arguments,
//!                               struct trees, targets
//! ```
//!
//! A per-function counter bounds recursion; it is restored after each call so
//! that sibling calls at the same depth see the same count.

use ahash::AHashMap as FastHashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ErrorPropConfig;
use crate::errors::{ErrorPropError, Result};
use crate::features::flow_graph::{FlowAnalysis, ScheduleItem, UnrolledSchedule};
use crate::features::interprocedural::domain::{AnalysisResults, FunctionSummary};
use crate::features::lipschitz::LipschitzLoopAnalyzer;
use crate::features::memory_deps::MemorySsa;
use crate::features::propagation::{ActivationState, CallAnalyzer, InstructionPropagator};
use crate::features::range_store::RangeErrorStore;
use crate::shared::ir::{Function, FunctionId, Module, Value, ValueKey};
use crate::shared::models::AffineForm;

/// Control-flow and memory services of one function, built once
struct FunctionServices {
    flow: FlowAnalysis,
    memory: MemorySsa,
}

pub struct InterproceduralDriver<'a> {
    module: &'a Module,
    config: &'a ErrorPropConfig,
    /// Module-level values shared by every entry activation
    globals: RangeErrorStore,
    summaries: FastHashMap<FunctionId, FunctionSummary>,
    services: FastHashMap<FunctionId, Arc<FunctionServices>>,
    results: AnalysisResults,
}

impl<'a> InterproceduralDriver<'a> {
    pub fn new(module: &'a Module, config: &'a ErrorPropConfig) -> Self {
        let mut globals = RangeErrorStore::for_module(module);
        globals.seed_globals(module);
        Self {
            module,
            config,
            globals,
            summaries: FastHashMap::new(),
            services: FastHashMap::new(),
            results: AnalysisResults::new(),
        }
    }

    pub fn into_parts(self) -> (AnalysisResults, FastHashMap<FunctionId, FunctionSummary>, RangeErrorStore) {
        (self.results, self.summaries, self.globals)
    }

    /// Analyze `id` as a root of the call graph
    pub fn analyze_entry(&mut self, id: FunctionId) -> Result<()> {
        let module = self.module;
        let func = module
            .function(id)
            .ok_or_else(|| ErrorPropError::unknown_function(format!("#{}", id.0)))?;
        if func.is_declaration() {
            debug!(function = %func.name, "entry without a body skipped");
            return Ok(());
        }

        let previous = self.summaries.entry(id).or_default().enter();
        info!(function = %func.name, "entry activation");

        let mut local = self.globals.clone();
        local.seed_arguments(module, func);
        let outcome = self.run_function(func, ActivationState::new(local));
        self.leave(id, previous);
        let state = outcome?;

        self.globals.merge_globals(&state.store);
        self.globals.merge_targets(&state.store);
        self.finish_activation(func, &state);
        Ok(())
    }

    fn leave(&mut self, id: FunctionId, previous: u32) {
        if let Some(summary) = self.summaries.get_mut(&id) {
            summary.leave(previous);
        }
    }

    // ========================================================================
    // Activation
    // ========================================================================

    fn run_function(&mut self, func: &'a Function, mut state: ActivationState) -> Result<ActivationState> {
        let services = self.services_for(func);
        let schedule = self.schedule_for(func, &services);
        let propagator = InstructionPropagator::new(self.module, func, self.config, &services.flow.loops, &services.memory);
        self.run_items(&propagator, &mut state, &schedule.items)?;
        Ok(state)
    }

    fn run_items(
        &mut self,
        propagator: &InstructionPropagator<'_>,
        state: &mut ActivationState,
        items: &[ScheduleItem],
    ) -> Result<()> {
        for item in items {
            match item {
                ScheduleItem::Block { block, phi_mode } => {
                    propagator.propagate_block(state, self, *block, *phi_mode)?;
                }
                ScheduleItem::LipschitzLoop {
                    header,
                    trip_count,
                    fallback,
                } => match LipschitzLoopAnalyzer::new(propagator).apply(state, *header, *trip_count) {
                    Ok(bound) => {
                        debug!(
                            function = %propagator.func.name,
                            header = header.0,
                            symbols = bound.errors.len(),
                            "closed-form loop bound applied"
                        );
                    }
                    Err(reason) => {
                        warn!(
                            function = %propagator.func.name,
                            header = header.0,
                            %reason,
                            "closed-form loop bound abandoned, unrolling"
                        );
                        self.run_items(propagator, state, fallback)?;
                    }
                },
            }
        }
        Ok(())
    }

    fn services_for(&mut self, func: &Function) -> Arc<FunctionServices> {
        let module = self.module;
        Arc::clone(self.services.entry(func.id).or_insert_with(|| {
            Arc::new(FunctionServices {
                flow: FlowAnalysis::compute(func),
                memory: MemorySsa::build(func, module),
            })
        }))
    }

    fn schedule_for(&mut self, func: &Function, services: &FunctionServices) -> Arc<UnrolledSchedule> {
        let config = self.config;
        let summary = self.summaries.entry(func.id).or_default();
        Arc::clone(
            summary
                .schedule
                .get_or_insert_with(|| services.flow.schedule(func, config)),
        )
    }

    /// Analyze `callee` for one call site and merge the results into `caller_store`
    fn activate_call(
        &mut self,
        caller: &Function,
        callee: &'a Function,
        args: &[Value],
        caller_store: &mut RangeErrorStore,
    ) -> Result<()> {
        let module = self.module;
        let mut local = caller_store.clone();
        local.erase_function(callee);
        local.seed_arguments(module, callee);
        // Actuals are read from the caller's store: the callee may be the caller
        local.apply_argument_errors(caller_store, caller.id, callee, args);
        local.structs_mut().init_argument_bindings(module, caller, callee, args);

        let mut state = self.run_function(callee, ActivationState::new(local))?;
        state.store.structs_mut().clear_bindings(callee);

        self.merge_back(caller, callee, args, caller_store, &state.store);
        self.finish_activation(callee, &state);
        Ok(())
    }

    fn merge_back(
        &self,
        caller: &Function,
        callee: &Function,
        args: &[Value],
        caller_store: &mut RangeErrorStore,
        local: &RangeErrorStore,
    ) {
        let summary_key = ValueKey::Function(callee.id);
        if let Some(returned) = local.get_range_error(&summary_key) {
            caller_store.raise_error(summary_key, returned);
        }

        for (idx, (param, actual)) in callee.params.iter().zip(args).enumerate() {
            if !param.ty.is_pointer() {
                continue;
            }
            let formal = ValueKey::Arg(callee.id, idx as u32);
            let (Some(written), Some(actual_key)) = (local.get_range_error(&formal), ValueKey::of(caller.id, *actual))
            else {
                continue;
            };
            if caller_store.raise_error(actual_key, written) {
                debug!(caller = %caller.name, callee = %callee.name, arg = idx, "pointer argument error merged back");
            }
        }

        caller_store.merge_globals(local);
        caller_store
            .structs_mut()
            .update_struct_tree(local.structs(), self.module, caller, args);
        caller_store.merge_targets(local);
    }

    fn finish_activation(&mut self, func: &Function, state: &ActivationState) {
        if let Some(returned) = state.store.get_range_error(&ValueKey::Function(func.id)) {
            self.summaries.entry(func.id).or_default().raise(returned);
        }
        self.results.absorb(func.id, state);
    }
}

impl<'a> CallAnalyzer for InterproceduralDriver<'a> {
    fn analyze_call(
        &mut self,
        caller: &Function,
        callee: FunctionId,
        args: &[Value],
        store: &mut RangeErrorStore,
    ) -> Result<()> {
        let module = self.module;
        let target = module
            .function(callee)
            .ok_or_else(|| ErrorPropError::unknown_function(format!("#{}", callee.0)))?;
        let bound = target.max_recursion.unwrap_or(self.config.default_max_recursion);

        let summary = self.summaries.entry(callee).or_default();
        if summary.recursion >= bound {
            summary.skipped_calls += 1;
            debug!(caller = %caller.name, callee = %target.name, bound, "recursion bound reached, call skipped");
            return Ok(());
        }
        let previous = summary.enter();
        info!(caller = %caller.name, callee = %target.name, depth = previous + 1, "call activation");

        let outcome = self.activate_call(caller, target, args, store);
        self.leave(callee, previous);
        if let Err(e) = outcome {
            warn!(callee = %target.name, error = %e, "callee activation abandoned");
        }
        Ok(())
    }

    fn summary_error(&self, callee: FunctionId) -> Option<AffineForm> {
        self.summaries.get(&callee).and_then(FunctionSummary::affine_error)
    }
}
