//! Struct error infrastructure

pub mod struct_error_map;

pub use struct_error_map::{FieldPath, StructErrorMap};
