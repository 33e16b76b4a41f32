/// Flow Graph Feature
///
/// Block graph, natural loops and the loop-aware visitation order.
///
/// ## Guarantees
/// - Ignoring back edges, every predecessor is visited before its successors
/// - Inside a loop, blocks staying in the loop precede blocks leaving it
/// - Loop runs are contiguous, so unrolling repeats one slice of the order
pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;
