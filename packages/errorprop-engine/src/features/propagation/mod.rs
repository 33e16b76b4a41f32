/// Propagation Feature
///
/// Per-instruction transfer functions over affine error forms.
///
/// ## Features
/// - Exact linear rules for add/sub, affine products for mul/div
/// - Rounding of truncating divisions, right shifts and float-to-int casts
/// - Max rule for select/phi, with loop-header phis split by visit
/// - Linearized library functions (sqrt, log, exp, asin, acos)
/// - Comparison soundness flags
/// - Loads/stores through memory SSA and struct field trees
/// - Calls through an injected [`CallAnalyzer`]
pub mod arithmetic;
pub mod calls;
pub mod compare;
pub mod context;
pub mod conversions;
pub mod dispatcher;
pub mod memory;
pub mod merges;

pub use arithmetic::{propagate_add, propagate_div, propagate_mul, propagate_sub};
pub use compare::check_comparison;
pub use context::{ActivationState, CallAnalyzer, InstructionPropagator, NoCalls, Operand};
pub use conversions::is_truncating;
pub use merges::max_abs_error;
