//! Module driver
//!
//! Validates the configuration and the module, then analyzes every entry
//! function in callees-first order. A malformed function stops only its own
//! activation: the failure is logged and recorded, and the remaining
//! functions are still analyzed.

use ahash::AHashMap as FastHashMap;
use tracing::{debug, info, warn};

use super::call_graph::CallGraph;
use super::report::ErrorReport;
use crate::config::ErrorPropConfig;
use crate::errors::Result;
use crate::features::interprocedural::{AnalysisResults, FunctionSummary, InterproceduralDriver};
use crate::features::range_store::RangeErrorStore;
use crate::shared::ir::{FunctionId, GlobalId, InstId, Module, Value, ValueKey};
use crate::shared::models::CmpErrorInfo;

/// Entry point of the engine
#[derive(Debug, Clone, Default)]
pub struct ErrorPropagator {
    config: ErrorPropConfig,
}

impl ErrorPropagator {
    /// Create a propagator; the configuration is validated once here
    pub fn new(config: ErrorPropConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ErrorPropConfig {
        &self.config
    }

    /// Functions analyzed as roots, callees first
    pub fn entry_functions(&self, module: &Module) -> Vec<FunctionId> {
        CallGraph::build(module)
            .components()
            .into_iter()
            .inspect(|scc| {
                if scc.len() > 1 {
                    debug!(size = scc.len(), "mutually recursive functions");
                }
            })
            .flatten()
            .filter(|&id| {
                module.function(id).map_or(false, |f| {
                    !f.is_declaration() && (!self.config.propagate_only_flagged || f.entry_point)
                })
            })
            .collect()
    }

    pub fn run(&self, module: &Module) -> Result<ModuleAnalysis> {
        module.validate()?;
        let entries = self.entry_functions(module);
        info!(module = %module.name, entries = entries.len(), "error propagation started");

        let mut driver = InterproceduralDriver::new(module, &self.config);
        let mut analyzed = Vec::with_capacity(entries.len());
        let mut failed = Vec::new();
        for id in entries {
            match driver.analyze_entry(id) {
                Ok(()) => analyzed.push(id),
                Err(e) => {
                    let name = module.function(id).map(|f| f.name.as_str()).unwrap_or("?");
                    warn!(function = name, error = %e, "function analysis abandoned");
                    failed.push((id, e.to_string()));
                }
            }
        }

        let (results, summaries, globals) = driver.into_parts();
        info!(
            module = %module.name,
            analyzed = analyzed.len(),
            failed = failed.len(),
            values = results.values().count(),
            "error propagation finished"
        );
        Ok(ModuleAnalysis {
            results,
            summaries,
            globals,
            analyzed,
            failed,
        })
    }

    /// Parse a JSON module, analyze it and build the report
    pub fn run_json(&self, json: &str) -> Result<ErrorReport> {
        let module = Module::from_json(json)?;
        let analysis = self.run(&module)?;
        Ok(analysis.report(&module, &self.config))
    }
}

/// Everything one module run produced
#[derive(Debug)]
pub struct ModuleAnalysis {
    pub results: AnalysisResults,
    pub summaries: FastHashMap<FunctionId, FunctionSummary>,
    /// Module-level store after every entry was merged back
    pub globals: RangeErrorStore,
    pub analyzed: Vec<FunctionId>,
    /// Functions whose analysis stopped on malformed input, with the reason
    pub failed: Vec<(FunctionId, String)>,
}

impl ModuleAnalysis {
    /// Absolute error bound of an instruction result of `func`
    pub fn value_error(&self, func: FunctionId, value: Value) -> Option<f64> {
        ValueKey::of(func, value).and_then(|key| self.results.error_of(&key))
    }

    /// Worst error returned by `func` over every analyzed context
    pub fn function_error(&self, func: FunctionId) -> Option<f64> {
        self.summaries.get(&func).and_then(FunctionSummary::abs_error)
    }

    pub fn global_error(&self, global: GlobalId) -> Option<f64> {
        self.globals
            .get_range_error(&ValueKey::Global(global))
            .and_then(|re| re.abs_error())
    }

    pub fn comparison(&self, func: FunctionId, value: Value) -> Option<&CmpErrorInfo> {
        let inst: InstId = value.as_inst()?;
        self.results.comparison(func, inst)
    }

    pub fn target_error(&self, label: &str) -> f64 {
        self.results.targets().error_for(label)
    }

    pub fn summary(&self, func: FunctionId) -> Option<&FunctionSummary> {
        self.summaries.get(&func)
    }

    pub fn report(&self, module: &Module, config: &ErrorPropConfig) -> ErrorReport {
        ErrorReport::build(module, self, config.report_mode)
    }
}
