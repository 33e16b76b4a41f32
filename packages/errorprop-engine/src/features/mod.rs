//! Feature modules - each analysis is one vertical slice
//!
//! Larger features are split into:
//! - domain/         - Pure data and algorithms
//! - ports           - Traits the feature consumes
//! - infrastructure/ - Implementations over the host model
//!
//! Dependency order, leaves first:
//! range_store → struct_errors → memory_deps → flow_graph → propagation
//! → lipschitz → interprocedural

pub mod flow_graph;
pub mod interprocedural;
pub mod lipschitz;
pub mod memory_deps;
pub mod propagation;
pub mod range_store;
pub mod struct_errors;
