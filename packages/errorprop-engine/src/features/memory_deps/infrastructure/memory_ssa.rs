//! Memory SSA for one function
//!
//! ```text
//!   0: LiveOnEntry
//!   store p, v      ─► Def { inst, defining: prev }
//!   call g(..)      ─► Def { inst, defining: prev }   (unless pure)
//!   join block      ─► Phi { incoming: [out(pred) ...] }
//!   load p          ─► reads the current state
//! ```
//!
//! Blocks are processed in reverse postorder; a block with several
//! reachable predecessors (or a re-entered entry block) starts from its phi.

use ahash::{AHashMap as FastHashMap, AHashSet as FastHashSet};
use tracing::debug;

use super::alias::{is_pure_call, may_alias, pointer_origin, PointerOrigin};
use crate::features::flow_graph::BlockGraph;
use crate::features::memory_deps::ports::{MemoryAccess, MemoryAccessId, MemoryDependenceOracle};
use crate::shared::ir::{BlockId, Function, InstId, InstKind, Module};

#[derive(Debug, Clone, Default)]
pub struct MemorySsa {
    accesses: Vec<MemoryAccess>,
    load_states: FastHashMap<InstId, MemoryAccessId>,
    /// Origins of the addresses of loads and stores
    origins: FastHashMap<InstId, PointerOrigin>,
}

impl MemorySsa {
    pub fn build(func: &Function, module: &Module) -> Self {
        let graph = BlockGraph::build(func);
        let rpo = graph.reverse_postorder();
        let reachable: FastHashSet<BlockId> = rpo.iter().copied().collect();
        let entry = func.entry_block();

        let mut ssa = MemorySsa {
            accesses: vec![MemoryAccess::LiveOnEntry],
            ..Self::default()
        };

        let mut phis: FastHashMap<BlockId, MemoryAccessId> = FastHashMap::new();
        let mut preds: FastHashMap<BlockId, Vec<BlockId>> = FastHashMap::new();
        for &block in &rpo {
            let block_preds: Vec<BlockId> = graph
                .predecessors(block)
                .into_iter()
                .filter(|p| reachable.contains(p))
                .collect();
            let is_entry = Some(block) == entry;
            if block_preds.len() >= 2 || (is_entry && !block_preds.is_empty()) {
                let id = ssa.push(MemoryAccess::Phi {
                    block,
                    incoming: Vec::new(),
                });
                phis.insert(block, id);
            }
            preds.insert(block, block_preds);
        }

        let mut out_states: FastHashMap<BlockId, MemoryAccessId> = FastHashMap::new();
        for &block in &rpo {
            let mut current = match phis.get(&block) {
                Some(&phi) => phi,
                None => preds
                    .get(&block)
                    .and_then(|p| p.first())
                    .and_then(|p| out_states.get(p))
                    .copied()
                    .unwrap_or(MemoryAccessId::LIVE_ON_ENTRY),
            };
            for inst in func.block_insts(block) {
                match &inst.kind {
                    InstKind::Store { ptr, .. } => {
                        ssa.origins.insert(inst.id, pointer_origin(func, *ptr));
                        current = ssa.push(MemoryAccess::Def {
                            inst: inst.id,
                            defining: current,
                        });
                    }
                    InstKind::Load { ptr } => {
                        ssa.origins.insert(inst.id, pointer_origin(func, *ptr));
                        ssa.load_states.insert(inst.id, current);
                    }
                    InstKind::Call { callee, .. } | InstKind::Invoke { callee, .. } => {
                        if !is_pure_call(module, callee) {
                            current = ssa.push(MemoryAccess::Def {
                                inst: inst.id,
                                defining: current,
                            });
                        }
                    }
                    _ => {}
                }
            }
            out_states.insert(block, current);
        }

        for (&block, &phi) in &phis {
            let mut incoming = Vec::new();
            if Some(block) == entry {
                incoming.push(MemoryAccessId::LIVE_ON_ENTRY);
            }
            for pred in preds.get(&block).into_iter().flatten() {
                if let Some(&state) = out_states.get(pred) {
                    incoming.push(state);
                }
            }
            if let Some(MemoryAccess::Phi { incoming: slot, .. }) = ssa.accesses.get_mut(phi.index()) {
                *slot = incoming;
            }
        }

        debug!(function = %func.name, accesses = ssa.accesses.len(), "memory ssa built");
        ssa
    }

    fn push(&mut self, access: MemoryAccess) -> MemoryAccessId {
        let id = MemoryAccessId(self.accesses.len() as u32);
        self.accesses.push(access);
        id
    }

    pub fn access(&self, id: MemoryAccessId) -> Option<&MemoryAccess> {
        self.accesses.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.accesses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accesses.is_empty()
    }
}

impl MemoryDependenceOracle for MemorySsa {
    fn defining_access(&self, load: InstId) -> Option<MemoryAccessId> {
        self.load_states.get(&load).copied()
    }

    fn clobbering_access(&self, start: MemoryAccessId, load: InstId) -> MemoryAccessId {
        let Some(target) = self.origins.get(&load) else {
            return start;
        };
        let mut current = start;
        for _ in 0..self.accesses.len() {
            match self.access(current) {
                Some(MemoryAccess::Def { inst, defining }) => {
                    let disjoint = self
                        .origins
                        .get(inst)
                        .map_or(false, |origin| !may_alias(origin, target));
                    if !disjoint {
                        return current;
                    }
                    current = *defining;
                }
                _ => return current,
            }
        }
        current
    }

    fn is_live_on_entry(&self, access: MemoryAccessId) -> bool {
        matches!(self.access(access), Some(MemoryAccess::LiveOnEntry))
    }

    fn definition(&self, access: MemoryAccessId) -> Option<InstId> {
        match self.access(access)? {
            MemoryAccess::Def { inst, .. } => Some(*inst),
            _ => None,
        }
    }

    fn join_incoming(&self, access: MemoryAccessId) -> Option<Vec<MemoryAccessId>> {
        match self.access(access)? {
            MemoryAccess::Phi { incoming, .. } => Some(incoming.clone()),
            _ => None,
        }
    }
}
