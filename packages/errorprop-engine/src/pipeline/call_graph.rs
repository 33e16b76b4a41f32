//! Call graph with petgraph
//!
//! Edges point from caller to callee. Tarjan SCC yields components in
//! reverse topological order, which is the callees-first order the driver
//! walks.

use ahash::AHashMap as FastHashMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::shared::ir::{FunctionId, Module};

pub struct CallGraph {
    /// Directed graph: function → functions it calls directly
    graph: DiGraph<FunctionId, ()>,
}

impl CallGraph {
    pub fn build(module: &Module) -> Self {
        let mut graph = DiGraph::new();
        let mut node_of: FastHashMap<FunctionId, NodeIndex> = FastHashMap::new();

        for func in &module.functions {
            node_of.insert(func.id, graph.add_node(func.id));
        }
        for func in &module.functions {
            let Some(&from) = node_of.get(&func.id) else {
                continue;
            };
            for callee in func.direct_callees() {
                if let Some(&to) = node_of.get(&callee) {
                    graph.add_edge(from, to, ());
                }
            }
        }
        Self { graph }
    }

    /// Strongly connected components, callees before callers
    pub fn components(&self) -> Vec<Vec<FunctionId>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .map(|scc| {
                let mut ids: Vec<FunctionId> = scc.into_iter().map(|idx| self.graph[idx]).collect();
                ids.sort();
                ids
            })
            .collect()
    }

    /// Every function, callees before callers
    pub fn bottom_up(&self) -> Vec<FunctionId> {
        self.components().into_iter().flatten().collect()
    }
}
