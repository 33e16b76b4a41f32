//! Visitation plan of a function body

use serde::{Deserialize, Serialize};

use crate::shared::ir::BlockId;

/// Which incoming edges of a phi are read on this visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhiMode {
    All,
    /// First visit of a loop header: only edges entering the loop
    Entry,
    /// Later visits of a loop header: only back edges
    Latch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScheduleItem {
    Block { block: BlockId, phi_mode: PhiMode },
    /// Closed-form bound for the remaining iterations of a loop; `fallback`
    /// is the unrolled plan used when the loop does not qualify.
    LipschitzLoop {
        header: BlockId,
        trip_count: u32,
        fallback: Vec<ScheduleItem>,
    },
}

/// Block order with loops expanded by their unroll count
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnrolledSchedule {
    pub items: Vec<ScheduleItem>,
}

impl UnrolledSchedule {
    pub fn new(items: Vec<ScheduleItem>) -> Self {
        Self { items }
    }

    /// Number of block visits, fallbacks included
    pub fn visit_count(&self) -> usize {
        fn count(items: &[ScheduleItem]) -> usize {
            items
                .iter()
                .map(|item| match item {
                    ScheduleItem::Block { .. } => 1,
                    ScheduleItem::LipschitzLoop { fallback, .. } => count(fallback),
                })
                .sum()
        }
        count(&self.items)
    }

    /// Blocks visited when every closed-form item falls back
    pub fn flattened_blocks(&self) -> Vec<BlockId> {
        fn walk(items: &[ScheduleItem], out: &mut Vec<BlockId>) {
            for item in items {
                match item {
                    ScheduleItem::Block { block, .. } => out.push(*block),
                    ScheduleItem::LipschitzLoop { fallback, .. } => walk(fallback, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.items, &mut out);
        out
    }
}
