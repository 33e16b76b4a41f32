//! Functions and basic blocks

use ahash::AHashMap as FastHashMap;
use serde::{Deserialize, Serialize};

use super::annotations::ValueInfo;
use super::instruction::{Callee, InstKind, Instruction};
use super::types::Type;
use super::value::{BlockId, FunctionId, InstId, Value};

/// Formal parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ValueInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    #[serde(default)]
    pub name: String,
    pub insts: Vec<InstId>,
    /// Unroll count requested for the loop headed by this block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unroll_hint: Option<u32>,
    /// Statically known trip count of the loop headed by this block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub id: FunctionId,
    pub name: String,
    pub params: Vec<Param>,
    pub ret_ty: Type,
    /// Empty for declarations
    pub blocks: Vec<BasicBlock>,
    pub insts: Vec<Instruction>,
    /// Recursion bound override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_recursion: Option<u32>,
    /// Flagged as an entry point of the precision-tuned region
    #[serde(default)]
    pub entry_point: bool,
}

impl Function {
    pub fn declaration(id: FunctionId, name: impl Into<String>, params: Vec<Param>, ret_ty: Type) -> Self {
        Self {
            id,
            name: name.into(),
            params,
            ret_ty,
            blocks: Vec::new(),
            insts: Vec::new(),
            max_recursion: None,
            entry_point: false,
        }
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn entry_block(&self) -> Option<BlockId> {
        self.blocks.first().map(|b| b.id)
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    pub fn inst(&self, id: InstId) -> Option<&Instruction> {
        self.insts.get(id.index())
    }

    /// Instruction defining `value`, when it is an instruction result
    pub fn defining_inst(&self, value: Value) -> Option<&Instruction> {
        value.as_inst().and_then(|id| self.inst(id))
    }

    pub fn block_insts(&self, id: BlockId) -> impl Iterator<Item = &Instruction> + '_ {
        self.block(id)
            .into_iter()
            .flat_map(|b| b.insts.iter())
            .filter_map(move |&i| self.inst(i))
    }

    /// Phi nodes at the top of a block
    pub fn phis(&self, id: BlockId) -> impl Iterator<Item = &Instruction> + '_ {
        self.block_insts(id)
            .take_while(|i| matches!(i.kind, InstKind::Phi { .. }))
    }

    pub fn terminator(&self, id: BlockId) -> Option<&Instruction> {
        self.block(id)
            .and_then(|b| b.insts.last())
            .and_then(|&i| self.inst(i))
            .filter(|i| i.is_terminator())
    }

    pub fn successors(&self, id: BlockId) -> Vec<BlockId> {
        self.terminator(id)
            .map(Instruction::successors)
            .unwrap_or_default()
    }

    /// Predecessor lists for every block
    pub fn predecessors(&self) -> FastHashMap<BlockId, Vec<BlockId>> {
        let mut preds: FastHashMap<BlockId, Vec<BlockId>> = FastHashMap::new();
        for block in &self.blocks {
            preds.entry(block.id).or_default();
            for succ in self.successors(block.id) {
                let entry = preds.entry(succ).or_default();
                if !entry.contains(&block.id) {
                    entry.push(block.id);
                }
            }
        }
        preds
    }

    /// Direct callees, in call-site order, without duplicates
    pub fn direct_callees(&self) -> Vec<FunctionId> {
        let mut callees = Vec::new();
        for inst in &self.insts {
            if let Some((Callee::Direct(f), _)) = inst.call_site() {
                if !callees.contains(f) {
                    callees.push(*f);
                }
            }
        }
        callees
    }
}
