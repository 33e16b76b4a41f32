//! Pipeline orchestration
//!
//! [`ErrorPropagator`] runs the interprocedural driver over a whole module,
//! callees first, and turns the collected results into an [`ErrorReport`].

pub mod call_graph;
pub mod error_propagator;
pub mod report;

pub use call_graph::CallGraph;
pub use error_propagator::{ErrorPropagator, ModuleAnalysis};
pub use report::{ComparisonEntry, ErrorReport, FunctionEntry, InstructionEntry};
