//! Host value types

use serde::{Deserialize, Serialize};

use super::value::StructTypeId;

/// Type of a host value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    /// Integer of the given bit width (fixed-point values live here)
    Int(u32),
    /// IEEE float of the given bit width
    Float(u32),
    Pointer(Box<Type>),
    /// Aggregate described in the module's struct table
    Struct(StructTypeId),
    /// Fixed-size array: element type and length
    Array(Box<Type>, u64),
}

impl Type {
    pub fn int(bits: u32) -> Self {
        Type::Int(bits)
    }

    pub fn float(bits: u32) -> Self {
        Type::Float(bits)
    }

    pub fn pointer_to(pointee: Type) -> Self {
        Type::Pointer(Box::new(pointee))
    }

    pub fn array_of(elem: Type, len: u64) -> Self {
        Type::Array(Box::new(elem), len)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<StructTypeId> {
        match self {
            Type::Struct(id) => Some(*id),
            _ => None,
        }
    }

    /// Struct id when this is a pointer to a struct
    pub fn pointee_struct(&self) -> Option<StructTypeId> {
        self.pointee().and_then(Type::as_struct)
    }
}

/// Aggregate layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<Type>,
}

impl StructType {
    pub fn new(name: impl Into<String>, fields: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}
