/// Range Store Feature
///
/// Identity -> (range, optional error) for one function activation, plus the
/// per-label target aggregator and the struct error map of the activation.
pub mod store;
pub mod targets;

pub use store::RangeErrorStore;
pub use targets::{TargetErrorAggregator, TargetLabels};
