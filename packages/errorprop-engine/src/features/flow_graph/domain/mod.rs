mod block_graph;
pub mod loop_info;
mod schedule;

pub use block_graph::BlockGraph;
pub use loop_info::{Loop, LoopId, LoopInfo};
pub use schedule::{PhiMode, ScheduleItem, UnrolledSchedule};
