//! Loop-aware block scheduling
//!
//! The order is a reverse postorder of a depth-first search from the entry
//! block. At every block the search descends into successors that leave the
//! block's innermost loop before successors that stay inside it, so the
//! loop-leaving blocks finish first and come out last after reversal:
//!
//! ```text
//!   entry ─► H ─► B ─┐        DFS(H): X first, then B
//!            ▲  │    │        postorder  [X, B, H, entry]
//!            └──┼────┘        schedule   [entry, H, B, X]
//!               ▼
//!               X
//! ```
//!
//! The unrolled schedule then repeats each loop's run of blocks by its unroll
//! count, tagging header visits with the phi edges they read.

use ahash::AHashSet as FastHashSet;
use tracing::debug;

use crate::config::ErrorPropConfig;
use crate::features::flow_graph::domain::{
    BlockGraph, LoopId, LoopInfo, PhiMode, ScheduleItem, UnrolledSchedule,
};
use crate::shared::ir::{BlockId, Function};

pub struct BasicBlockScheduler<'a> {
    config: &'a ErrorPropConfig,
}

impl<'a> BasicBlockScheduler<'a> {
    pub fn new(config: &'a ErrorPropConfig) -> Self {
        Self { config }
    }

    /// Reachable blocks in visitation order
    pub fn order(&self, func: &Function, graph: &BlockGraph, loops: &LoopInfo) -> Vec<BlockId> {
        let Some(entry) = func.entry_block() else {
            return Vec::new();
        };
        let mut visited: FastHashSet<BlockId> = FastHashSet::new();
        let mut postorder = Vec::with_capacity(func.blocks.len());
        let mut stack: Vec<(BlockId, Vec<BlockId>, usize)> = Vec::new();

        visited.insert(entry);
        stack.push((entry, ordered_successors(graph, loops, entry), 0));
        while let Some((block, succs, next)) = stack.last_mut() {
            if let Some(&succ) = succs.get(*next) {
                *next += 1;
                if visited.insert(succ) {
                    let succ_order = ordered_successors(graph, loops, succ);
                    stack.push((succ, succ_order, 0));
                }
            } else {
                postorder.push(*block);
                stack.pop();
            }
        }
        postorder.reverse();
        debug!(function = %func.name, order = ?postorder, "block schedule");
        postorder
    }

    /// Visitation plan with loops expanded
    pub fn unrolled(&self, func: &Function, graph: &BlockGraph, loops: &LoopInfo) -> UnrolledSchedule {
        let order = self.order(func, graph, loops);
        let mut items = Vec::with_capacity(order.len());
        self.emit_body(func, loops, &order, None, PhiMode::All, &mut items);
        UnrolledSchedule::new(items)
    }

    fn emit_body(
        &self,
        func: &Function,
        loops: &LoopInfo,
        blocks: &[BlockId],
        scope: Option<LoopId>,
        header_mode: PhiMode,
        out: &mut Vec<ScheduleItem>,
    ) {
        let scope_header = scope.and_then(|l| loops.get(l)).map(|l| l.header);
        let mut done: FastHashSet<BlockId> = FastHashSet::new();
        for &block in blocks {
            if done.contains(&block) {
                continue;
            }
            if Some(block) == scope_header {
                out.push(ScheduleItem::Block {
                    block,
                    phi_mode: header_mode,
                });
                continue;
            }
            match child_loop_of(loops, scope, block) {
                Some(child) => {
                    let Some(lp) = loops.get(child) else {
                        continue;
                    };
                    let members: Vec<BlockId> = blocks.iter().copied().filter(|b| lp.contains(*b)).collect();
                    done.extend(members.iter().copied());
                    self.emit_loop(func, loops, child, &members, out);
                }
                None => out.push(ScheduleItem::Block {
                    block,
                    phi_mode: PhiMode::All,
                }),
            }
        }
    }

    fn emit_loop(&self, func: &Function, loops: &LoopInfo, id: LoopId, members: &[BlockId], out: &mut Vec<ScheduleItem>) {
        let Some(lp) = loops.get(id) else {
            return;
        };
        let header = func.block(lp.header);
        let hint = header.and_then(|b| b.unroll_hint);
        let trip_count = header.and_then(|b| b.trip_count).filter(|&t| t > 0);
        let count = self.config.unroll_count(hint, trip_count);
        debug!(function = %func.name, header = lp.header.0, count, "unrolling loop");

        let closed_form = match trip_count {
            Some(t) if self.config.lipschitz_loops && lp.children.is_empty() => Some(t),
            _ => None,
        };
        match closed_form {
            Some(trip_count) => {
                self.emit_body(func, loops, members, Some(id), PhiMode::Entry, out);
                let mut fallback = Vec::new();
                for _ in 1..count {
                    self.emit_body(func, loops, members, Some(id), PhiMode::Latch, &mut fallback);
                }
                out.push(ScheduleItem::LipschitzLoop {
                    header: lp.header,
                    trip_count,
                    fallback,
                });
            }
            None => {
                for iteration in 0..count {
                    let mode = if iteration == 0 {
                        PhiMode::Entry
                    } else {
                        PhiMode::Latch
                    };
                    self.emit_body(func, loops, members, Some(id), mode, out);
                }
            }
        }
    }
}

/// Successors leaving the block's innermost loop first, then the rest
fn ordered_successors(graph: &BlockGraph, loops: &LoopInfo, block: BlockId) -> Vec<BlockId> {
    let succs = graph.successors(block);
    let Some(lp) = loops.innermost_loop(block).and_then(|l| loops.get(l)) else {
        return succs;
    };
    let (inside, mut leaving): (Vec<BlockId>, Vec<BlockId>) = succs.into_iter().partition(|s| lp.contains(*s));
    leaving.extend(inside);
    leaving
}

/// The loop directly nested in `scope` that contains `block`
fn child_loop_of(loops: &LoopInfo, scope: Option<LoopId>, block: BlockId) -> Option<LoopId> {
    let mut current = loops.innermost_loop(block);
    while let Some(id) = current {
        let parent = loops.get(id)?.parent;
        if parent == scope {
            return Some(id);
        }
        current = parent;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ir::{ModuleBuilder, Type, Value};

    fn loop_function(trip_count: Option<u32>) -> Function {
        let mut mb = ModuleBuilder::new("m");
        let mut f = mb.function("f", Type::Void);
        let entry = f.block("entry");
        let h = f.block("header");
        let b = f.block("body");
        let x = f.block("exit");
        f.position_at_end(entry);
        f.br(h);
        f.position_at_end(h);
        f.cond_br(Value::ConstInt(1), b, x);
        f.position_at_end(b);
        f.br(h);
        f.position_at_end(x);
        f.ret(None);
        f.loop_hints(h, None, trip_count);
        f.finish()
    }

    #[test]
    fn test_loop_body_before_exit() {
        let func = loop_function(None);
        let graph = BlockGraph::build(&func);
        let loops = LoopInfo::compute(&func, &graph);
        let config = ErrorPropConfig::default();
        let order = BasicBlockScheduler::new(&config).order(&func, &graph, &loops);
        assert_eq!(order, vec![BlockId(0), BlockId(1), BlockId(2), BlockId(3)]);
    }

    #[test]
    fn test_unrolled_repeats_loop_run() {
        let func = loop_function(Some(3));
        let graph = BlockGraph::build(&func);
        let loops = LoopInfo::compute(&func, &graph);
        let config = ErrorPropConfig::default().lipschitz_loops(false);
        let schedule = BasicBlockScheduler::new(&config).unrolled(&func, &graph, &loops);
        let blocks: Vec<u32> = schedule.flattened_blocks().iter().map(|b| b.0).collect();
        assert_eq!(blocks, vec![0, 1, 2, 1, 2, 1, 2, 3]);
        assert_eq!(
            schedule.items[1],
            ScheduleItem::Block {
                block: BlockId(1),
                phi_mode: PhiMode::Entry
            }
        );
        assert_eq!(
            schedule.items[3],
            ScheduleItem::Block {
                block: BlockId(1),
                phi_mode: PhiMode::Latch
            }
        );
    }

    #[test]
    fn test_closed_form_item_wraps_remaining_iterations() {
        let func = loop_function(Some(3));
        let graph = BlockGraph::build(&func);
        let loops = LoopInfo::compute(&func, &graph);
        let config = ErrorPropConfig::default();
        let schedule = BasicBlockScheduler::new(&config).unrolled(&func, &graph, &loops);
        assert_eq!(schedule.items.len(), 5);
        match &schedule.items[3] {
            ScheduleItem::LipschitzLoop {
                header,
                trip_count,
                fallback,
            } => {
                assert_eq!(*header, BlockId(1));
                assert_eq!(*trip_count, 3);
                assert_eq!(fallback.len(), 4);
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_disabled_unrolling_visits_once() {
        let func = loop_function(Some(8));
        let graph = BlockGraph::build(&func);
        let loops = LoopInfo::compute(&func, &graph);
        let config = ErrorPropConfig::default().no_loop_unroll(true).lipschitz_loops(false);
        let schedule = BasicBlockScheduler::new(&config).unrolled(&func, &graph, &loops);
        assert_eq!(schedule.visit_count(), 4);
    }
}
