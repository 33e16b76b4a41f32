//! Test data builders
//!
//! Formats and annotations used across the suites, and a runner that wraps
//! the propagator construction.

use errorprop_engine::config::ErrorPropConfig;
use errorprop_engine::pipeline::{ErrorPropagator, ModuleAnalysis};
use errorprop_engine::shared::ir::{InputInfo, Module};
use errorprop_engine::shared::models::FixedPointFormat;

/// Q15.16, the format most scenarios compute in
pub fn fixed() -> FixedPointFormat {
    FixedPointFormat::signed(32, 16)
}

/// Format of a value kept in native precision (no rounding)
pub fn real() -> FixedPointFormat {
    FixedPointFormat::uninitialized()
}

/// Loop counter format
pub fn counter() -> FixedPointFormat {
    FixedPointFormat::signed(32, 0)
}

/// Builder for scalar input annotations
#[derive(Debug, Clone)]
pub struct InfoBuilder {
    format: FixedPointFormat,
    min: f64,
    max: f64,
    error: Option<f64>,
}

impl InfoBuilder {
    pub fn new(format: FixedPointFormat) -> Self {
        Self {
            format,
            min: 0.0,
            max: 1.0,
            error: None,
        }
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn error(mut self, error: f64) -> Self {
        self.error = Some(error);
        self
    }

    pub fn build(self) -> InputInfo {
        let info = InputInfo::new(self.format, self.min, self.max);
        match self.error {
            Some(e) => info.with_initial_error(e),
            None => info,
        }
    }
}

/// `fixed()` input over `[min, max]` with an initial error
pub fn input(min: f64, max: f64, error: f64) -> InputInfo {
    InfoBuilder::new(fixed()).range(min, max).error(error).build()
}

/// Run the whole module driver with `config`
pub fn analyze_with(module: &Module, config: ErrorPropConfig) -> ModuleAnalysis {
    ErrorPropagator::new(config)
        .expect("valid configuration")
        .run(module)
        .expect("module analysis")
}

pub fn analyze(module: &Module) -> ModuleAnalysis {
    analyze_with(module, ErrorPropConfig::default())
}
