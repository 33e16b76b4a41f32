//! Interprocedural domain: function summaries and collected results

pub mod results;
pub mod summary;

pub use results::AnalysisResults;
pub use summary::FunctionSummary;
