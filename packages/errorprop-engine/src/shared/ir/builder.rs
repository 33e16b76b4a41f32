//! Builders for host modules
//!
//! Used by hosts that construct the model in memory and by the test suite.
//!
//! ```rust,ignore
//! let mut mb = ModuleBuilder::new("m");
//! let mut f = mb.function("scale", Type::Float(64));
//! let x = f.param_with_info("x", Type::Float(64), InputInfo::new(fmt, 0.0, 1.0));
//! let entry = f.block("entry");
//! f.position_at_end(entry);
//! let y = f.binary(BinaryOp::FMul, "y", Type::Float(64), x, Value::ConstFloat(0.5));
//! f.ret(Some(y));
//! mb.define(f);
//! let module = mb.finish();
//! ```

use super::annotations::ValueInfo;
use super::function::{BasicBlock, Function, Param};
use super::instruction::{BinaryOp, Callee, CastOp, CmpPredicate, InstKind, Instruction};
use super::module::{Global, Module};
use super::types::{StructType, Type};
use super::value::{BlockId, FunctionId, GlobalId, InstId, StructTypeId, Value};

#[derive(Debug, Default)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            module: Module {
                name: name.into(),
                ..Module::default()
            },
        }
    }

    pub fn struct_type(&mut self, name: impl Into<String>, fields: Vec<Type>) -> StructTypeId {
        let id = StructTypeId(self.module.struct_types.len() as u32);
        self.module.struct_types.push(StructType::new(name, fields));
        id
    }

    pub fn global(&mut self, name: impl Into<String>, ty: Type, info: Option<ValueInfo>) -> GlobalId {
        let id = GlobalId(self.module.globals.len() as u32);
        self.module.globals.push(Global {
            id,
            name: name.into(),
            ty,
            info,
            target: None,
        });
        id
    }

    pub fn global_target(&mut self, id: GlobalId, label: impl Into<String>) {
        if let Some(g) = self.module.globals.get_mut(id.index()) {
            g.target = Some(label.into());
        }
    }

    /// Add a body-less function (library or external)
    pub fn declare(&mut self, name: impl Into<String>, params: Vec<Param>, ret_ty: Type) -> FunctionId {
        let id = FunctionId(self.module.functions.len() as u32);
        self.module
            .functions
            .push(Function::declaration(id, name, params, ret_ty));
        id
    }

    /// Reserve a function id and start building its body
    pub fn function(&mut self, name: impl Into<String>, ret_ty: Type) -> FunctionBuilder {
        let name = name.into();
        let id = self.declare(name.clone(), Vec::new(), ret_ty.clone());
        FunctionBuilder::new(id, name, ret_ty)
    }

    /// Install a finished body at its reserved id
    pub fn define(&mut self, builder: FunctionBuilder) -> FunctionId {
        let func = builder.finish();
        let id = func.id;
        match self.module.functions.get_mut(id.index()) {
            Some(slot) => *slot = func,
            None => self.module.functions.push(func),
        }
        id
    }

    pub fn finish(self) -> Module {
        self.module
    }
}

#[derive(Debug)]
pub struct FunctionBuilder {
    func: Function,
    current: Option<BlockId>,
}

impl FunctionBuilder {
    pub fn new(id: FunctionId, name: impl Into<String>, ret_ty: Type) -> Self {
        Self {
            func: Function::declaration(id, name, Vec::new(), ret_ty),
            current: None,
        }
    }

    pub fn id(&self) -> FunctionId {
        self.func.id
    }

    pub fn param(&mut self, name: impl Into<String>, ty: Type) -> Value {
        self.push_param(name, ty, None)
    }

    pub fn param_with_info(&mut self, name: impl Into<String>, ty: Type, info: impl Into<ValueInfo>) -> Value {
        self.push_param(name, ty, Some(info.into()))
    }

    fn push_param(&mut self, name: impl Into<String>, ty: Type, info: Option<ValueInfo>) -> Value {
        let idx = self.func.params.len() as u32;
        self.func.params.push(Param {
            name: name.into(),
            ty,
            info,
        });
        Value::Arg(idx)
    }

    pub fn max_recursion(&mut self, bound: u32) {
        self.func.max_recursion = Some(bound);
    }

    pub fn entry_point(&mut self) {
        self.func.entry_point = true;
    }

    pub fn block(&mut self, name: impl Into<String>) -> BlockId {
        let id = BlockId(self.func.blocks.len() as u32);
        self.func.blocks.push(BasicBlock {
            id,
            name: name.into(),
            insts: Vec::new(),
            unroll_hint: None,
            trip_count: None,
        });
        id
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    /// Annotate the loop headed by `header`
    pub fn loop_hints(&mut self, header: BlockId, unroll_hint: Option<u32>, trip_count: Option<u32>) {
        if let Some(b) = self.func.blocks.get_mut(header.index()) {
            b.unroll_hint = unroll_hint;
            b.trip_count = trip_count;
        }
    }

    /// Append an instruction to the current block (an `entry` block is created if none is selected)
    pub fn push(&mut self, name: impl Into<String>, ty: Type, kind: InstKind) -> Value {
        let block = match self.current {
            Some(b) => b,
            None => {
                let b = self.block("entry");
                self.current = Some(b);
                b
            }
        };
        let id = InstId(self.func.insts.len() as u32);
        self.func.insts.push(Instruction {
            id,
            block,
            name: name.into(),
            ty,
            kind,
            info: None,
            target: None,
        });
        if let Some(b) = self.func.blocks.get_mut(block.index()) {
            b.insts.push(id);
        }
        Value::Inst(id)
    }

    pub fn annotate(&mut self, value: Value, info: impl Into<ValueInfo>) {
        if let Some(inst) = value.as_inst().and_then(|id| self.func.insts.get_mut(id.index())) {
            inst.info = Some(info.into());
        }
    }

    pub fn target(&mut self, value: Value, label: impl Into<String>) {
        if let Some(inst) = value.as_inst().and_then(|id| self.func.insts.get_mut(id.index())) {
            inst.target = Some(label.into());
        }
    }

    pub fn binary(&mut self, op: BinaryOp, name: &str, ty: Type, lhs: Value, rhs: Value) -> Value {
        self.push(name, ty, InstKind::Binary { op, lhs, rhs })
    }

    pub fn cast(&mut self, op: CastOp, name: &str, ty: Type, operand: Value) -> Value {
        self.push(name, ty, InstKind::Cast { op, operand })
    }

    pub fn icmp(&mut self, predicate: CmpPredicate, name: &str, lhs: Value, rhs: Value) -> Value {
        self.push(name, Type::Int(1), InstKind::ICmp { predicate, lhs, rhs })
    }

    pub fn fcmp(&mut self, predicate: CmpPredicate, name: &str, lhs: Value, rhs: Value) -> Value {
        self.push(name, Type::Int(1), InstKind::FCmp { predicate, lhs, rhs })
    }

    pub fn select(&mut self, name: &str, ty: Type, cond: Value, if_true: Value, if_false: Value) -> Value {
        self.push(
            name,
            ty,
            InstKind::Select {
                cond,
                if_true,
                if_false,
            },
        )
    }

    pub fn phi(&mut self, name: &str, ty: Type, incoming: Vec<(Value, BlockId)>) -> Value {
        self.push(name, ty, InstKind::Phi { incoming })
    }

    /// Add an incoming edge to an existing phi (for back edges)
    pub fn add_incoming(&mut self, phi: Value, value: Value, block: BlockId) {
        if let Some(inst) = phi.as_inst().and_then(|id| self.func.insts.get_mut(id.index())) {
            if let InstKind::Phi { incoming } = &mut inst.kind {
                incoming.push((value, block));
            }
        }
    }

    pub fn alloca(&mut self, name: &str, allocated: Type) -> Value {
        let ty = Type::pointer_to(allocated.clone());
        self.push(name, ty, InstKind::Alloca { allocated })
    }

    pub fn load(&mut self, name: &str, ty: Type, ptr: Value) -> Value {
        self.push(name, ty, InstKind::Load { ptr })
    }

    pub fn store(&mut self, value: Value, ptr: Value) -> Value {
        self.push("", Type::Void, InstKind::Store { value, ptr })
    }

    pub fn gep(&mut self, name: &str, ty: Type, base: Value, indices: Vec<Value>) -> Value {
        self.push(name, ty, InstKind::GetElementPtr { base, indices })
    }

    pub fn call(&mut self, name: &str, ty: Type, callee: Callee, args: Vec<Value>) -> Value {
        self.push(name, ty, InstKind::Call { callee, args })
    }

    pub fn ret(&mut self, value: Option<Value>) -> Value {
        self.push("", Type::Void, InstKind::Ret { value })
    }

    pub fn br(&mut self, target: BlockId) -> Value {
        self.push("", Type::Void, InstKind::Br { target })
    }

    pub fn cond_br(&mut self, cond: Value, if_true: BlockId, if_false: BlockId) -> Value {
        self.push(
            "",
            Type::Void,
            InstKind::CondBr {
                cond,
                if_true,
                if_false,
            },
        )
    }

    pub fn finish(self) -> Function {
        self.func
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::FixedPointFormat;
    use crate::shared::ir::InputInfo;

    #[test]
    fn test_build_simple_function() {
        let mut mb = ModuleBuilder::new("m");
        let mut f = mb.function("f", Type::Int(32));
        let fmt = FixedPointFormat::signed(32, 16);
        let x = f.param_with_info("x", Type::Int(32), InputInfo::new(fmt, 0.0, 1.0));
        let entry = f.block("entry");
        f.position_at_end(entry);
        let y = f.binary(BinaryOp::Add, "y", Type::Int(32), x, x);
        f.ret(Some(y));
        let id = mb.define(f);
        let module = mb.finish();

        assert!(module.validate().is_ok());
        let func = module.function(id).unwrap();
        assert_eq!(func.params.len(), 1);
        assert_eq!(func.block(entry).unwrap().insts.len(), 2);
        assert!(func.terminator(entry).is_some());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut mb = ModuleBuilder::new("m");
        let mut f = mb.function("g", Type::Void);
        f.ret(None);
        mb.define(f);
        let module = mb.finish();

        let json = module.to_json().unwrap();
        let parsed = Module::from_json(&json).unwrap();
        assert_eq!(parsed, module);
    }

    #[test]
    fn test_validate_rejects_dangling_branch() {
        let mut mb = ModuleBuilder::new("m");
        let mut f = mb.function("bad", Type::Void);
        f.br(BlockId(7));
        mb.define(f);
        assert!(mb.finish().validate().is_err());
    }
}
