/// Lipschitz Loop Feature
///
/// Closed-form error bound for simple counted loops, used instead of
/// unrolling when the loop qualifies.
///
/// ## Features
/// - Shape checks for innermost one- or two-block loops
/// - Update expressions rebuilt over add/sub/mul/div
/// - Symbolic derivatives bounded by interval evaluation
/// - Matrix power and Gauss-Jordan inverse with a power-sum fallback
///
/// Every failed precondition is a [`LipschitzError`]; the caller then runs
/// the unrolled schedule.
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::{Expr, Interval, Matrix};
pub use error::{LipschitzError, LipschitzResult};
pub use infrastructure::{LipschitzLoopAnalyzer, LoopBound, LoopShape};
