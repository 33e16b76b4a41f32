//! Numeric vocabulary shared by every component
//!
//! - [`FixedPointFormat`] / [`FPInterval`]: formats and ranges
//! - [`AffineForm`]: error representation with independent noise symbols
//! - [`RangeError`]: range plus optional error

pub mod affine;
pub mod fixed_point;
pub mod range_error;

pub use affine::{fresh_symbol, AffineForm, MonotonicFn, NoiseSymbol};
pub use fixed_point::{FPInterval, FixedPointFormat};
pub use range_error::{CmpErrorInfo, RangeError};
