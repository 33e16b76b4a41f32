mod tree;

pub use tree::{NodeId, PathIndex, StructErrorTree, StructNode, StructNodeKind};
