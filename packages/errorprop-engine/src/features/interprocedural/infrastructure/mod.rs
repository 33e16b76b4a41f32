//! Interprocedural infrastructure

pub mod driver;

pub use driver::InterproceduralDriver;
