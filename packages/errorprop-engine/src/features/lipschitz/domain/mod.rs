//! Lipschitz domain: expressions, intervals and matrices

pub mod expr;
pub mod interval;
pub mod matrix;

pub use expr::Expr;
pub use interval::Interval;
pub use matrix::Matrix;
