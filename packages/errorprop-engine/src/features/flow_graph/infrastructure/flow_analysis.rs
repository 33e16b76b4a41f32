//! Per-activation control-flow services

use std::sync::Arc;

use super::scheduler::BasicBlockScheduler;
use crate::config::ErrorPropConfig;
use crate::features::flow_graph::domain::{BlockGraph, LoopInfo, UnrolledSchedule};
use crate::shared::ir::Function;

/// Block graph and loop structure of one function
#[derive(Debug, Clone)]
pub struct FlowAnalysis {
    pub graph: BlockGraph,
    pub loops: LoopInfo,
}

impl FlowAnalysis {
    pub fn compute(func: &Function) -> Self {
        let graph = BlockGraph::build(func);
        let loops = LoopInfo::compute(func, &graph);
        Self { graph, loops }
    }

    pub fn schedule(&self, func: &Function, config: &ErrorPropConfig) -> Arc<UnrolledSchedule> {
        Arc::new(BasicBlockScheduler::new(config).unrolled(func, &self.graph, &self.loops))
    }
}
