//! Memory-dependence oracle port
//!
//! The resolver reads memory state only through this trait, so a host with
//! its own memory-SSA can plug it in instead of [`MemorySsa`].
//!
//! [`MemorySsa`]: super::infrastructure::MemorySsa

use serde::{Deserialize, Serialize};

use crate::shared::ir::{BlockId, InstId};

/// Identity of a memory state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemoryAccessId(pub u32);

impl MemoryAccessId {
    pub const LIVE_ON_ENTRY: MemoryAccessId = MemoryAccessId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One memory state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MemoryAccess {
    /// Memory as it was when the function was entered
    LiveOnEntry,
    /// State after a store or a call; `defining` is the state it overwrites
    Def {
        inst: InstId,
        defining: MemoryAccessId,
    },
    /// Join of the states reaching a block
    Phi {
        block: BlockId,
        incoming: Vec<MemoryAccessId>,
    },
}

pub trait MemoryDependenceOracle {
    /// State read by `load`, before any clobber walk
    fn defining_access(&self, load: InstId) -> Option<MemoryAccessId>;

    /// Nearest state at or above `start` that may have written what `load` reads
    fn clobbering_access(&self, start: MemoryAccessId, load: InstId) -> MemoryAccessId;

    fn is_live_on_entry(&self, access: MemoryAccessId) -> bool;

    /// Store or call that produced a definition state
    fn definition(&self, access: MemoryAccessId) -> Option<InstId>;

    /// Incoming states of a join; `None` when `access` is not a join
    fn join_incoming(&self, access: MemoryAccessId) -> Option<Vec<MemoryAccessId>>;
}
