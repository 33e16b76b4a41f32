//! Engine configuration
//!
//! Read once at analysis start and threaded by reference through every
//! entry point of the engine.

use super::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Upper bound accepted for `default_unroll_count`
pub const MAX_UNROLL_COUNT: u32 = 1024;

/// Upper bound accepted for `default_max_recursion`
pub const MAX_RECURSION_BOUND: u32 = 64;

/// How computed errors are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Absolute error bound
    #[default]
    Absolute,
    /// Absolute error divided by the largest magnitude of the value's range
    Relative,
}

/// Error propagation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorPropConfig {
    /// Loop unroll count used when neither a hint nor a trip count is known (1..=1024)
    pub default_unroll_count: u32,

    /// Analyze every loop body exactly once
    pub no_loop_unroll: bool,

    /// Percentage of relative error above which a wrong comparison is reported (0..=100, 0 = always)
    pub cmp_error_threshold: u32,

    /// Recursion bound for functions without their own annotation (1..=64)
    pub default_max_recursion: u32,

    /// Only start propagation from functions flagged as entry points
    pub propagate_only_flagged: bool,

    /// Absolute or relative error reporting
    pub report_mode: ReportMode,

    /// Use the closed-form Lipschitz bound for eligible loops
    #[serde(default = "default_true")]
    pub lipschitz_loops: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ErrorPropConfig {
    fn default() -> Self {
        Self {
            default_unroll_count: 1,
            no_loop_unroll: false,
            cmp_error_threshold: 0,
            default_max_recursion: 1,
            propagate_only_flagged: false,
            report_mode: ReportMode::Absolute,
            lipschitz_loops: true,
        }
    }
}

impl ErrorPropConfig {
    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_unroll_count == 0 || self.default_unroll_count > MAX_UNROLL_COUNT {
            return Err(ConfigError::range_with_hint(
                "default_unroll_count",
                self.default_unroll_count,
                1,
                MAX_UNROLL_COUNT,
                "Use no_loop_unroll to disable unrolling",
            ));
        }

        if self.cmp_error_threshold > 100 {
            return Err(ConfigError::range_with_hint(
                "cmp_error_threshold",
                self.cmp_error_threshold,
                0,
                100,
                "The threshold is a percentage",
            ));
        }

        if self.default_max_recursion == 0 || self.default_max_recursion > MAX_RECURSION_BOUND {
            return Err(ConfigError::range_with_hint(
                "default_max_recursion",
                self.default_max_recursion,
                1,
                MAX_RECURSION_BOUND,
                "At least one activation of each function must be allowed",
            ));
        }

        if self.no_loop_unroll && self.default_unroll_count > 1 {
            return Err(ConfigError::conflict(
                "no_loop_unroll is set together with default_unroll_count > 1",
                "remove default_unroll_count or clear no_loop_unroll",
            ));
        }

        Ok(())
    }

    /// Unroll count for a loop with the given hint and trip count
    pub fn unroll_count(&self, hint: Option<u32>, trip_count: Option<u32>) -> u32 {
        if self.no_loop_unroll {
            return 1;
        }
        let trip_count = trip_count.filter(|&t| t != 0);
        let count = match (hint, trip_count) {
            (Some(h), Some(t)) => h.min(t),
            (Some(h), None) => h,
            (None, Some(t)) => t.min(MAX_UNROLL_COUNT),
            (None, None) => self.default_unroll_count,
        };
        count.max(1)
    }

    /// Builder: Set default_unroll_count
    pub fn default_unroll_count(mut self, v: u32) -> Self {
        self.default_unroll_count = v;
        self
    }

    /// Builder: Set no_loop_unroll
    pub fn no_loop_unroll(mut self, v: bool) -> Self {
        self.no_loop_unroll = v;
        self
    }

    /// Builder: Set cmp_error_threshold
    pub fn cmp_error_threshold(mut self, v: u32) -> Self {
        self.cmp_error_threshold = v;
        self
    }

    /// Builder: Set default_max_recursion
    pub fn default_max_recursion(mut self, v: u32) -> Self {
        self.default_max_recursion = v;
        self
    }

    /// Builder: Set propagate_only_flagged
    pub fn propagate_only_flagged(mut self, v: bool) -> Self {
        self.propagate_only_flagged = v;
        self
    }

    /// Builder: Set report_mode
    pub fn report_mode(mut self, v: ReportMode) -> Self {
        self.report_mode = v;
        self
    }

    /// Builder: Set lipschitz_loops
    pub fn lipschitz_loops(mut self, v: bool) -> Self {
        self.lipschitz_loops = v;
        self
    }
}
