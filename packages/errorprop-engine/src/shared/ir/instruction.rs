//! Instructions and opcode tags

use serde::{Deserialize, Serialize};

use super::annotations::ValueInfo;
use super::types::Type;
use super::value::{BlockId, FunctionId, InstId, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastOp {
    Trunc,
    ZExt,
    SExt,
    FpToUi,
    FpToSi,
    UiToFp,
    SiToFp,
    FpTrunc,
    FpExt,
    BitCast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpPredicate {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Call target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Callee {
    Direct(FunctionId),
    /// Library function known only by name (e.g. `sqrt`)
    External(String),
    Indirect(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstKind {
    Binary {
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
    },
    Cast {
        op: CastOp,
        operand: Value,
    },
    ICmp {
        predicate: CmpPredicate,
        lhs: Value,
        rhs: Value,
    },
    FCmp {
        predicate: CmpPredicate,
        lhs: Value,
        rhs: Value,
    },
    Select {
        cond: Value,
        if_true: Value,
        if_false: Value,
    },
    Phi {
        incoming: Vec<(Value, BlockId)>,
    },
    Alloca {
        allocated: Type,
    },
    Load {
        ptr: Value,
    },
    Store {
        value: Value,
        ptr: Value,
    },
    GetElementPtr {
        base: Value,
        indices: Vec<Value>,
    },
    Call {
        callee: Callee,
        args: Vec<Value>,
    },
    Invoke {
        callee: Callee,
        args: Vec<Value>,
        normal: BlockId,
        unwind: BlockId,
    },
    Ret {
        value: Option<Value>,
    },
    Br {
        target: BlockId,
    },
    CondBr {
        cond: Value,
        if_true: BlockId,
        if_false: BlockId,
    },
    Unreachable,
}

/// Flat opcode tag used for dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
    Trunc,
    ZExt,
    SExt,
    FpToUi,
    FpToSi,
    UiToFp,
    SiToFp,
    FpTrunc,
    FpExt,
    BitCast,
    ICmp,
    FCmp,
    Select,
    Phi,
    Alloca,
    Load,
    Store,
    GetElementPtr,
    Call,
    Invoke,
    Ret,
    Br,
    CondBr,
    Unreachable,
}

impl BinaryOp {
    pub fn opcode(self) -> Opcode {
        match self {
            BinaryOp::Add => Opcode::Add,
            BinaryOp::Sub => Opcode::Sub,
            BinaryOp::Mul => Opcode::Mul,
            BinaryOp::SDiv => Opcode::SDiv,
            BinaryOp::UDiv => Opcode::UDiv,
            BinaryOp::SRem => Opcode::SRem,
            BinaryOp::URem => Opcode::URem,
            BinaryOp::Shl => Opcode::Shl,
            BinaryOp::LShr => Opcode::LShr,
            BinaryOp::AShr => Opcode::AShr,
            BinaryOp::And => Opcode::And,
            BinaryOp::Or => Opcode::Or,
            BinaryOp::Xor => Opcode::Xor,
            BinaryOp::FAdd => Opcode::FAdd,
            BinaryOp::FSub => Opcode::FSub,
            BinaryOp::FMul => Opcode::FMul,
            BinaryOp::FDiv => Opcode::FDiv,
            BinaryOp::FRem => Opcode::FRem,
        }
    }
}

impl CastOp {
    pub fn opcode(self) -> Opcode {
        match self {
            CastOp::Trunc => Opcode::Trunc,
            CastOp::ZExt => Opcode::ZExt,
            CastOp::SExt => Opcode::SExt,
            CastOp::FpToUi => Opcode::FpToUi,
            CastOp::FpToSi => Opcode::FpToSi,
            CastOp::UiToFp => Opcode::UiToFp,
            CastOp::SiToFp => Opcode::SiToFp,
            CastOp::FpTrunc => Opcode::FpTrunc,
            CastOp::FpExt => Opcode::FpExt,
            CastOp::BitCast => Opcode::BitCast,
        }
    }
}

impl InstKind {
    pub fn opcode(&self) -> Opcode {
        match self {
            InstKind::Binary { op, .. } => op.opcode(),
            InstKind::Cast { op, .. } => op.opcode(),
            InstKind::ICmp { .. } => Opcode::ICmp,
            InstKind::FCmp { .. } => Opcode::FCmp,
            InstKind::Select { .. } => Opcode::Select,
            InstKind::Phi { .. } => Opcode::Phi,
            InstKind::Alloca { .. } => Opcode::Alloca,
            InstKind::Load { .. } => Opcode::Load,
            InstKind::Store { .. } => Opcode::Store,
            InstKind::GetElementPtr { .. } => Opcode::GetElementPtr,
            InstKind::Call { .. } => Opcode::Call,
            InstKind::Invoke { .. } => Opcode::Invoke,
            InstKind::Ret { .. } => Opcode::Ret,
            InstKind::Br { .. } => Opcode::Br,
            InstKind::CondBr { .. } => Opcode::CondBr,
            InstKind::Unreachable => Opcode::Unreachable,
        }
    }
}

/// One instruction; `id` indexes the owning function's instruction arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: InstId,
    pub block: BlockId,
    #[serde(default)]
    pub name: String,
    pub ty: Type,
    pub kind: InstKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ValueInfo>,
    /// Instrumentation label whose worst error is reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        self.kind.opcode()
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self.kind,
            InstKind::Br { .. }
                | InstKind::CondBr { .. }
                | InstKind::Ret { .. }
                | InstKind::Invoke { .. }
                | InstKind::Unreachable
        )
    }

    /// Successor blocks, in terminator operand order
    pub fn successors(&self) -> Vec<BlockId> {
        match &self.kind {
            InstKind::Br { target } => vec![*target],
            InstKind::CondBr {
                if_true, if_false, ..
            } => {
                if if_true == if_false {
                    vec![*if_true]
                } else {
                    vec![*if_true, *if_false]
                }
            }
            InstKind::Invoke { normal, unwind, .. } => vec![*normal, *unwind],
            _ => Vec::new(),
        }
    }

    /// Call target and actual arguments of a call or invoke
    pub fn call_site(&self) -> Option<(&Callee, &[Value])> {
        match &self.kind {
            InstKind::Call { callee, args } | InstKind::Invoke { callee, args, .. } => {
                Some((callee, args.as_slice()))
            }
            _ => None,
        }
    }

    /// Annotated scalar info, if any
    pub fn scalar_info(&self) -> Option<&super::annotations::InputInfo> {
        self.info.as_ref().and_then(ValueInfo::as_scalar)
    }
}
