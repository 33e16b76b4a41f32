//! Flow graph infrastructure

pub mod flow_analysis;
pub mod scheduler;

pub use flow_analysis::FlowAnalysis;
pub use scheduler::BasicBlockScheduler;
