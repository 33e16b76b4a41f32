//! Engine configuration
//!
//! One explicit [`ErrorPropConfig`] value is constructed at analysis start
//! (from defaults, builder calls or a YAML file) and passed by reference to
//! every entry point.
//!
//! # Examples
//!
//! ```rust,ignore
//! use errorprop_engine::config::ErrorPropConfig;
//!
//! let config = ErrorPropConfig::default()
//!     .default_unroll_count(4)
//!     .cmp_error_threshold(10);
//! config.validate()?;
//!
//! let config = ErrorPropConfig::from_yaml_file("errorprop.yaml")?;
//! ```

pub mod engine_config;
pub mod error;
pub mod io;

// Re-exports
pub use engine_config::{ErrorPropConfig, ReportMode, MAX_RECURSION_BOUND, MAX_UNROLL_COUNT};
pub use error::{ConfigError, ConfigResult};
