//! Block-level control-flow graph of one function

use ahash::AHashMap as FastHashMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsPostOrder;
use petgraph::Direction;

use crate::shared::ir::{BlockId, Function};

/// petgraph view of a function's blocks
///
/// Nodes carry the block id; an edge `a -> b` exists when `b` is a successor
/// of `a`. Duplicate successors collapse to one edge.
#[derive(Debug, Clone)]
pub struct BlockGraph {
    graph: DiGraph<BlockId, ()>,
    nodes: FastHashMap<BlockId, NodeIndex>,
    entry: Option<NodeIndex>,
}

impl BlockGraph {
    pub fn build(func: &Function) -> Self {
        let mut graph = DiGraph::with_capacity(func.blocks.len(), func.blocks.len() * 2);
        let mut nodes = FastHashMap::new();
        for block in &func.blocks {
            nodes.insert(block.id, graph.add_node(block.id));
        }
        for block in &func.blocks {
            let from = nodes[&block.id];
            for succ in func.successors(block.id) {
                if let Some(&to) = nodes.get(&succ) {
                    if graph.find_edge(from, to).is_none() {
                        graph.add_edge(from, to, ());
                    }
                }
            }
        }
        let entry = func.entry_block().and_then(|b| nodes.get(&b).copied());
        Self {
            graph,
            nodes,
            entry,
        }
    }

    pub fn graph(&self) -> &DiGraph<BlockId, ()> {
        &self.graph
    }

    pub fn entry(&self) -> Option<NodeIndex> {
        self.entry
    }

    pub fn node(&self, block: BlockId) -> Option<NodeIndex> {
        self.nodes.get(&block).copied()
    }

    pub fn block(&self, node: NodeIndex) -> BlockId {
        self.graph[node]
    }

    pub fn successors(&self, block: BlockId) -> Vec<BlockId> {
        self.neighbors(block, Direction::Outgoing)
    }

    pub fn predecessors(&self, block: BlockId) -> Vec<BlockId> {
        self.neighbors(block, Direction::Incoming)
    }

    fn neighbors(&self, block: BlockId, dir: Direction) -> Vec<BlockId> {
        let Some(node) = self.node(block) else {
            return Vec::new();
        };
        let mut out: Vec<BlockId> = self
            .graph
            .neighbors_directed(node, dir)
            .map(|n| self.graph[n])
            .collect();
        out.sort();
        out
    }

    /// Blocks reachable from the entry, in reverse postorder
    pub fn reverse_postorder(&self) -> Vec<BlockId> {
        let Some(entry) = self.entry else {
            return Vec::new();
        };
        let mut dfs = DfsPostOrder::new(&self.graph, entry);
        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(node) = dfs.next(&self.graph) {
            order.push(self.graph[node]);
        }
        order.reverse();
        order
    }
}
