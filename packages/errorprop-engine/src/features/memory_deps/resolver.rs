//! Load source resolution over memory states
//!
//! ```text
//!   live-on-entry ─► record of the address chain (load / GEP pointer operands)
//!   Def(store)    ─► the store's recorded range/error
//!   Def(call)     ─► caller-side record of the address (written by merge-back)
//!   Phi           ─► every incoming state, clobber-walked again
//! ```

use ahash::AHashSet as FastHashSet;
use tracing::debug;

use super::ports::{MemoryAccessId, MemoryDependenceOracle};
use crate::features::range_store::RangeErrorStore;
use crate::shared::ir::{Function, InstId, InstKind, Value, ValueKey};
use crate::shared::models::RangeError;

pub struct MemoryDependenceResolver<'a> {
    oracle: &'a dyn MemoryDependenceOracle,
    func: &'a Function,
}

impl<'a> MemoryDependenceResolver<'a> {
    pub fn new(oracle: &'a dyn MemoryDependenceOracle, func: &'a Function) -> Self {
        Self { oracle, func }
    }

    /// Deduplicated candidate sources of the value read by `load`
    pub fn resolve(&self, store: &RangeErrorStore, load: InstId) -> Vec<RangeError> {
        let mut visited: FastHashSet<MemoryAccessId> = FastHashSet::new();
        let mut candidates: Vec<RangeError> = Vec::new();
        if let Some(start) = self.oracle.defining_access(load) {
            let clobber = self.oracle.clobbering_access(start, load);
            self.walk(store, load, clobber, &mut visited, &mut candidates);
        }
        debug!(load = load.0, candidates = candidates.len(), "memory sources resolved");
        candidates
    }

    fn walk(
        &self,
        store: &RangeErrorStore,
        load: InstId,
        access: MemoryAccessId,
        visited: &mut FastHashSet<MemoryAccessId>,
        out: &mut Vec<RangeError>,
    ) {
        if !visited.insert(access) {
            return;
        }
        if self.oracle.is_live_on_entry(access) {
            if let Some(re) = self.address_record(store, load) {
                push_unique(out, re);
            }
            return;
        }
        if let Some(incoming) = self.oracle.join_incoming(access) {
            for state in incoming {
                let clobber = self.oracle.clobbering_access(state, load);
                self.walk(store, load, clobber, visited, out);
            }
            return;
        }
        let Some(def) = self.oracle.definition(access) else {
            return;
        };
        let is_call = self
            .func
            .inst(def)
            .map_or(false, |i| i.call_site().is_some());
        let record = if is_call {
            self.address_record(store, load)
        } else {
            store.get_range_error(&ValueKey::Inst(self.func.id, def)).cloned()
        };
        if let Some(re) = record {
            push_unique(out, re);
        }
    }

    /// Record of the loaded address, following load and GEP pointer operands
    fn address_record(&self, store: &RangeErrorStore, load: InstId) -> Option<RangeError> {
        let mut inst = self.func.inst(load)?;
        for _ in 0..=self.func.insts.len() {
            let pointer = match &inst.kind {
                InstKind::Load { ptr } => *ptr,
                InstKind::GetElementPtr { base, .. } => *base,
                _ => return None,
            };
            if let Some(key) = ValueKey::of(self.func.id, pointer) {
                if let Some(re) = store.get_range_error(&key) {
                    return Some(re.clone());
                }
            }
            match pointer {
                Value::Inst(id) => inst = self.func.inst(id)?,
                _ => return None,
            }
        }
        None
    }
}

fn push_unique(out: &mut Vec<RangeError>, re: RangeError) {
    if !out.contains(&re) {
        out.push(re);
    }
}
