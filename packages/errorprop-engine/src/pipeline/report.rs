//! Serializable error report
//!
//! In relative mode every value error is divided by the largest magnitude of
//! the value's range. Values without a usable range (uninitialized or the
//! point zero) keep their absolute error. Comparison tolerances and target
//! errors are always absolute.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error_propagator::ModuleAnalysis;
use crate::config::ReportMode;
use crate::errors::Result;
use crate::shared::ir::{Module, ValueKey};
use crate::shared::models::RangeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionEntry {
    pub function: String,
    pub inst: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub error: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub function: String,
    pub inst: u32,
    pub tolerance: f64,
    pub may_be_wrong: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionEntry {
    pub function: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<f64>,
    pub activations: u32,
    pub skipped_calls: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub module: String,
    pub mode: ReportMode,
    pub instructions: Vec<InstructionEntry>,
    pub comparisons: Vec<ComparisonEntry>,
    pub functions: Vec<FunctionEntry>,
    pub targets: BTreeMap<String, f64>,
    /// Functions whose analysis was abandoned, with the reason
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<(String, String)>,
}

impl ErrorReport {
    pub fn build(module: &Module, analysis: &ModuleAnalysis, mode: ReportMode) -> Self {
        let function_name = |id| {
            module
                .function(id)
                .map(|f| f.name.clone())
                .unwrap_or_else(|| format!("#{}", id.0))
        };

        let instructions = analysis
            .results
            .values()
            .filter_map(|(key, re)| {
                let ValueKey::Inst(func, inst) = *key else {
                    return None;
                };
                let name = module
                    .function(func)
                    .and_then(|f| f.inst(inst))
                    .map(|i| i.name.clone())
                    .unwrap_or_default();
                Some(InstructionEntry {
                    function: function_name(func),
                    inst: inst.0,
                    name,
                    error: reported_error(re, mode)?,
                })
            })
            .collect();

        let comparisons = analysis
            .results
            .comparisons()
            .map(|(&(func, inst), info)| ComparisonEntry {
                function: function_name(func),
                inst: inst.0,
                tolerance: info.tolerance,
                may_be_wrong: info.may_be_wrong,
            })
            .collect();

        let mut functions: Vec<FunctionEntry> = analysis
            .summaries
            .iter()
            .filter(|(_, s)| s.activations > 0)
            .map(|(&id, s)| FunctionEntry {
                function: function_name(id),
                error: s.error.as_ref().and_then(|re| reported_error(re, mode)),
                activations: s.activations,
                skipped_calls: s.skipped_calls,
            })
            .collect();
        functions.sort_by(|a, b| a.function.cmp(&b.function));

        let targets = analysis
            .results
            .targets()
            .iter()
            .map(|(label, e)| (label.to_string(), e))
            .collect();

        let failures = analysis
            .failed
            .iter()
            .map(|(id, reason)| (function_name(*id), reason.clone()))
            .collect();

        Self {
            module: module.name.clone(),
            mode,
            instructions,
            comparisons,
            functions,
            targets,
            failures,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Entries flagged as possibly taking the wrong branch
    pub fn wrong_comparisons(&self) -> impl Iterator<Item = &ComparisonEntry> + '_ {
        self.comparisons.iter().filter(|c| c.may_be_wrong)
    }
}

fn reported_error(re: &RangeError, mode: ReportMode) -> Option<f64> {
    let abs = re.abs_error()?;
    match mode {
        ReportMode::Absolute => Some(abs),
        ReportMode::Relative => {
            let magnitude = re.range.max_abs();
            if re.range.is_uninitialized() || magnitude == 0.0 {
                Some(abs)
            } else {
                Some(abs / magnitude)
            }
        }
    }
}
