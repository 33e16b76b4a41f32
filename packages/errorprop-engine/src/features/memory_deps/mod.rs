/// Memory Dependences Feature
///
/// Resolves the source error of a load by walking memory states backward.
///
/// ## Components
/// - **ports**: [`MemoryDependenceOracle`], the memory-state view the resolver needs
/// - **infrastructure**: [`MemorySsa`], the built-in oracle with a clobber walk
///   over identified objects and constant field paths
/// - **resolver**: [`MemoryDependenceResolver`], candidate collection with a
///   visited set so cyclic states (loops) terminate
pub mod infrastructure;
pub mod ports;
pub mod resolver;

pub use infrastructure::MemorySsa;
pub use ports::{MemoryAccess, MemoryAccessId, MemoryDependenceOracle};
pub use resolver::MemoryDependenceResolver;
