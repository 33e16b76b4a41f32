//! Memory dependence infrastructure

pub mod alias;
pub mod memory_ssa;

pub use alias::{is_pure_call, may_alias, pointer_origin, MemoryRoot, PointerOrigin};
pub use memory_ssa::MemorySsa;
