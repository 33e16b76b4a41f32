/// Struct Errors Feature
///
/// Field-sensitive error tracking for aggregate objects.
///
/// ## Features
/// - **Error trees**: one tree per root object (local, formal or global),
///   one leaf per scalar field; array dimensions collapse onto their element
/// - **Pointer walking**: field pointers resolve through GEP/load chains
/// - **Argument bindings**: aggregate formals alias the caller's object for
///   the duration of one activation
pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;
