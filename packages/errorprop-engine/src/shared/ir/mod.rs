//! Host program model
//!
//! The engine reads programs through this model: typed values, functions
//! made of basic blocks, a module with globals and a struct-type table, and
//! the input annotations (formats, ranges, initial errors, recursion bounds,
//! loop hints, target labels) attached by earlier toolchain stages.
//!
//! ```text
//! Module ─┬─ Function ─┬─ BasicBlock (unroll_hint, trip_count) ─► [InstId]
//!         │            ├─ Instruction arena (InstKind + info + target)
//!         │            └─ Param (info)
//!         ├─ Global (info, target)
//!         └─ StructType
//! ```

pub mod annotations;
pub mod builder;
pub mod function;
pub mod instruction;
pub mod module;
pub mod types;
pub mod value;

pub use annotations::{InputInfo, ValueInfo};
pub use builder::{FunctionBuilder, ModuleBuilder};
pub use function::{BasicBlock, Function, Param};
pub use instruction::{BinaryOp, Callee, CastOp, CmpPredicate, InstKind, Instruction, Opcode};
pub use module::{Global, Module};
pub use types::{StructType, Type};
pub use value::{BlockId, FunctionId, GlobalId, InstId, StructTypeId, Value, ValueKey};
