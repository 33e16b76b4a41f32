//! Whole-program host model

use serde::{Deserialize, Serialize};

use super::annotations::ValueInfo;
use super::function::Function;
use super::instruction::{Callee, InstKind};
use super::types::{StructType, Type};
use super::value::{FunctionId, GlobalId, StructTypeId, Value};
use crate::errors::{ErrorPropError, Result};

/// Global variable; `ty` is the type of the stored value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Global {
    pub id: GlobalId,
    pub name: String,
    pub ty: Type,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ValueInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    #[serde(default)]
    pub globals: Vec<Global>,
    #[serde(default)]
    pub struct_types: Vec<StructType>,
}

impl Module {
    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn global(&self, id: GlobalId) -> Option<&Global> {
        self.globals.get(id.index())
    }

    pub fn struct_type(&self, id: StructTypeId) -> Option<&StructType> {
        self.struct_types.get(id.index())
    }

    /// Type of an operand of `func`
    pub fn value_type(&self, func: &Function, value: Value) -> Option<Type> {
        match value {
            Value::Inst(id) => func.inst(id).map(|i| i.ty.clone()),
            Value::Arg(idx) => func.params.get(idx as usize).map(|p| p.ty.clone()),
            Value::Global(id) => self.global(id).map(|g| Type::pointer_to(g.ty.clone())),
            Value::Function(_) => Some(Type::pointer_to(Type::Void)),
            Value::ConstInt(_) => Some(Type::Int(64)),
            Value::ConstFloat(_) => Some(Type::Float(64)),
            Value::Undef => None,
        }
    }

    /// Name of the function a call site invokes, when statically known
    pub fn callee_name<'a>(&'a self, callee: &'a Callee) -> Option<&'a str> {
        match callee {
            Callee::Direct(id) => self.function(*id).map(|f| f.name.as_str()),
            Callee::External(name) => Some(name.as_str()),
            Callee::Indirect(Value::Function(id)) => self.function(*id).map(|f| f.name.as_str()),
            Callee::Indirect(_) => None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let module: Module = serde_json::from_str(json)?;
        module.validate()?;
        Ok(module)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every id refers to an existing entity
    pub fn validate(&self) -> Result<()> {
        for (idx, func) in self.functions.iter().enumerate() {
            if func.id.index() != idx {
                return Err(ErrorPropError::malformed(format!(
                    "function '{}' has id {} but sits at index {}",
                    func.name, func.id.0, idx
                )));
            }
            self.validate_function(func)?;
        }
        for (idx, global) in self.globals.iter().enumerate() {
            if global.id.index() != idx {
                return Err(ErrorPropError::malformed(format!(
                    "global '{}' has id {} but sits at index {}",
                    global.name, global.id.0, idx
                )));
            }
        }
        Ok(())
    }

    fn validate_function(&self, func: &Function) -> Result<()> {
        let malformed = |msg: String| ErrorPropError::malformed(format!("{}: {}", func.name, msg));

        for (idx, block) in func.blocks.iter().enumerate() {
            if block.id.index() != idx {
                return Err(malformed(format!("block id {} at index {}", block.id.0, idx)));
            }
            for &inst in &block.insts {
                match func.inst(inst) {
                    Some(i) if i.block == block.id => {}
                    Some(_) => {
                        return Err(malformed(format!(
                            "instruction {} listed in block {} it does not belong to",
                            inst.0, block.id.0
                        )))
                    }
                    None => return Err(malformed(format!("dangling instruction id {}", inst.0))),
                }
            }
        }

        for (idx, inst) in func.insts.iter().enumerate() {
            if inst.id.index() != idx {
                return Err(malformed(format!("instruction id {} at index {}", inst.id.0, idx)));
            }
            for succ in inst.successors() {
                if func.block(succ).is_none() {
                    return Err(malformed(format!("branch to missing block {}", succ.0)));
                }
            }
            if let InstKind::Phi { incoming } = &inst.kind {
                if let Some((_, b)) = incoming.iter().find(|(_, b)| func.block(*b).is_none()) {
                    return Err(malformed(format!("phi incoming from missing block {}", b.0)));
                }
            }
            if let Some((Callee::Direct(callee), _)) = inst.call_site() {
                if self.function(*callee).is_none() {
                    return Err(ErrorPropError::unknown_function(format!(
                        "{} (called from {})",
                        callee.0, func.name
                    )));
                }
            }
        }
        Ok(())
    }
}
