//! Lipschitz infrastructure: shape checks, expression reconstruction and the analyzer

pub mod analyzer;
pub mod expr_builder;
pub mod interval_eval;
pub mod loop_shape;

pub use analyzer::{LipschitzLoopAnalyzer, LoopBound};
pub use expr_builder::{LoopExprBuilder, LoopSymbol, LoopSystem};
pub use interval_eval::{evaluate, max_abs};
pub use loop_shape::{recognize, LoopShape};
