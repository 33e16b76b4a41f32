//! Ids, operands and value identities

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Function index in the module
    FunctionId
);
define_id!(
    /// Block index in its function
    BlockId
);
define_id!(
    /// Instruction index in its function
    InstId
);
define_id!(
    /// Global variable index in the module
    GlobalId
);
define_id!(
    /// Struct type index in the module's struct table
    StructTypeId
);

/// Instruction operand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Inst(InstId),
    /// Formal parameter of the enclosing function
    Arg(u32),
    /// Address of a global variable
    Global(GlobalId),
    Function(FunctionId),
    ConstInt(i64),
    ConstFloat(f64),
    Undef,
}

impl Value {
    pub fn as_inst(&self) -> Option<InstId> {
        match self {
            Value::Inst(id) => Some(*id),
            _ => None,
        }
    }
}

/// Identity of a value in the range/error stores.
///
/// Instructions and formals are qualified by their function so that the
/// stores of different activations can be merged without collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKey {
    Inst(FunctionId, InstId),
    Arg(FunctionId, u32),
    Global(GlobalId),
    /// The return value summary of a function
    Function(FunctionId),
}

impl ValueKey {
    /// Identity of an operand in `func`; constants have none
    pub fn of(func: FunctionId, value: Value) -> Option<Self> {
        match value {
            Value::Inst(id) => Some(ValueKey::Inst(func, id)),
            Value::Arg(idx) => Some(ValueKey::Arg(func, idx)),
            Value::Global(id) => Some(ValueKey::Global(id)),
            Value::Function(id) => Some(ValueKey::Function(id)),
            Value::ConstInt(_) | Value::ConstFloat(_) | Value::Undef => None,
        }
    }

    /// Function whose body defines this value, for locals
    pub fn owner(&self) -> Option<FunctionId> {
        match self {
            ValueKey::Inst(f, _) | ValueKey::Arg(f, _) => Some(*f),
            ValueKey::Global(_) | ValueKey::Function(_) => None,
        }
    }
}
