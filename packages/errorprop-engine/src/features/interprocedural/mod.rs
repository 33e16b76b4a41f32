/// Interprocedural Feature
///
/// Drives the per-function analysis across calls.
///
/// ## Features
/// - Private activation store per call, merged back on return
/// - Recursion bounded per function (annotation or configured default)
/// - Function summaries reused when a call is skipped
/// - Closed-form loop bounds with the unrolled plan as fallback
///
/// ## Guarantees
/// - No function is nested deeper than its recursion bound
/// - Sibling calls are analyzed in program order, each seeded from the
///   caller's current store
pub mod domain;
pub mod infrastructure;

pub use domain::{AnalysisResults, FunctionSummary};
pub use infrastructure::InterproceduralDriver;
