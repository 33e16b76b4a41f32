//! Natural loops from dominator back edges
//!
//! ```text
//!   preheader ──► header ◄──┐
//!                  │  │     │ back edge (latch -> header,
//!                  │  ▼     │  header dominates latch)
//!                  │ body ──┘
//!                  ▼
//!                 exit
//! ```
//!
//! Back edges sharing a header form one loop. Nesting follows block-set
//! inclusion; the innermost loop of a block is the smallest loop containing it.

use ahash::AHashMap as FastHashMap;
use petgraph::algo::dominators::simple_fast;
use std::collections::BTreeSet;

use super::block_graph::BlockGraph;
use crate::shared::ir::{BlockId, Function};

/// Index of a loop in its [`LoopInfo`]
pub type LoopId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    pub header: BlockId,
    pub blocks: BTreeSet<BlockId>,
    /// In-loop predecessors of the header
    pub latches: Vec<BlockId>,
    /// In-loop blocks with a successor outside the loop
    pub exiting: Vec<BlockId>,
    /// Out-of-loop successors of exiting blocks
    pub exits: Vec<BlockId>,
    /// Unique out-of-loop predecessor of the header, if any
    pub predecessor: Option<BlockId>,
    pub parent: Option<LoopId>,
    pub children: Vec<LoopId>,
    pub depth: u32,
}

impl Loop {
    pub fn contains(&self, block: BlockId) -> bool {
        self.blocks.contains(&block)
    }

    pub fn single_latch(&self) -> Option<BlockId> {
        match self.latches.as_slice() {
            [latch] => Some(*latch),
            _ => None,
        }
    }

    pub fn single_exit(&self) -> Option<BlockId> {
        match self.exits.as_slice() {
            [exit] => Some(*exit),
            _ => None,
        }
    }

    pub fn single_exiting(&self) -> Option<BlockId> {
        match self.exiting.as_slice() {
            [exiting] => Some(*exiting),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoopInfo {
    loops: Vec<Loop>,
    by_header: FastHashMap<BlockId, LoopId>,
    innermost: FastHashMap<BlockId, LoopId>,
}

impl LoopInfo {
    pub fn compute(func: &Function, graph: &BlockGraph) -> Self {
        let Some(entry) = graph.entry() else {
            return Self::default();
        };
        let doms = simple_fast(graph.graph(), entry);

        // header -> latches
        let mut back_edges: FastHashMap<BlockId, Vec<BlockId>> = FastHashMap::new();
        for block in graph.reverse_postorder() {
            let Some(node) = graph.node(block) else {
                continue;
            };
            for succ in graph.successors(block) {
                let Some(succ_node) = graph.node(succ) else {
                    continue;
                };
                let dominated = doms
                    .dominators(node)
                    .map_or(false, |mut it| it.any(|d| d == succ_node));
                if dominated {
                    back_edges.entry(succ).or_default().push(block);
                }
            }
        }

        let mut loops: Vec<Loop> = back_edges
            .into_iter()
            .map(|(header, latches)| natural_loop(graph, header, latches))
            .collect();
        // Outer loops first
        loops.sort_by(|a, b| b.blocks.len().cmp(&a.blocks.len()).then(a.header.cmp(&b.header)));

        for idx in 0..loops.len() {
            let parent = (0..idx)
                .rev()
                .find(|&p| loops[p].blocks.is_superset(&loops[idx].blocks) && loops[p].header != loops[idx].header);
            loops[idx].parent = parent;
            if let Some(p) = parent {
                loops[idx].depth = loops[p].depth + 1;
                loops[p].children.push(idx);
            }
        }

        let mut by_header = FastHashMap::new();
        let mut innermost = FastHashMap::new();
        for (idx, lp) in loops.iter().enumerate() {
            by_header.insert(lp.header, idx);
            // Later loops are smaller, so they overwrite their ancestors
            for &block in &lp.blocks {
                innermost.insert(block, idx);
            }
        }

        let info = Self {
            loops,
            by_header,
            innermost,
        };
        tracing::debug!(function = %func.name, loops = info.loops.len(), "loop info computed");
        info
    }

    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    pub fn get(&self, id: LoopId) -> Option<&Loop> {
        self.loops.get(id)
    }

    pub fn loop_with_header(&self, header: BlockId) -> Option<LoopId> {
        self.by_header.get(&header).copied()
    }

    pub fn innermost_loop(&self, block: BlockId) -> Option<LoopId> {
        self.innermost.get(&block).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

fn natural_loop(graph: &BlockGraph, header: BlockId, mut latches: Vec<BlockId>) -> Loop {
    latches.sort();
    latches.dedup();

    let mut blocks = BTreeSet::new();
    blocks.insert(header);
    let mut work: Vec<BlockId> = latches.clone();
    while let Some(block) = work.pop() {
        if blocks.insert(block) {
            work.extend(graph.predecessors(block));
        }
    }

    let mut exiting = Vec::new();
    let mut exits = Vec::new();
    for &block in &blocks {
        let outside: Vec<BlockId> = graph
            .successors(block)
            .into_iter()
            .filter(|s| !blocks.contains(s))
            .collect();
        if !outside.is_empty() {
            exiting.push(block);
        }
        for succ in outside {
            if !exits.contains(&succ) {
                exits.push(succ);
            }
        }
    }
    exits.sort();

    let outside_preds: Vec<BlockId> = graph
        .predecessors(header)
        .into_iter()
        .filter(|p| !blocks.contains(p))
        .collect();
    let predecessor = match outside_preds.as_slice() {
        [p] => Some(*p),
        _ => None,
    };

    Loop {
        header,
        blocks,
        latches,
        exiting,
        exits,
        predecessor,
        parent: None,
        children: Vec::new(),
        depth: 1,
    }
}
