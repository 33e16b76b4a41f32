//! Loop shape recognition
//!
//! The closed form handles innermost loops of one or two blocks:
//!
//! ```text
//!   one block               two blocks
//!
//!   preheader               preheader
//!      │                       │
//!      ▼                       ▼
//!   header ◄─┐              cond ◄──┐
//!   (cond,   │               │  │   │
//!    body) ──┘               │  ▼   │
//!      │                     │ body ┘
//!      ▼                     ▼
//!     exit                  exit
//! ```
//!
//! When the latch is the exit-checking block, the header holds the body.

use crate::features::flow_graph::{Loop, LoopInfo};
use crate::features::lipschitz::error::{LipschitzError, LipschitzResult};
use crate::shared::ir::BlockId;

/// Blocks of a recognized loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopShape {
    pub header: BlockId,
    pub preheader: BlockId,
    /// Block holding the exit test and the loop-carried phis
    pub cond: BlockId,
    pub body: BlockId,
    pub exit: BlockId,
}

impl LoopShape {
    pub fn contains(&self, block: BlockId) -> bool {
        block == self.cond || block == self.body
    }

    /// Blocks in execution order of one iteration
    pub fn blocks(&self) -> Vec<BlockId> {
        if self.cond == self.body {
            vec![self.cond]
        } else if self.cond == self.header {
            vec![self.cond, self.body]
        } else {
            vec![self.body, self.cond]
        }
    }
}

enum Step<'a> {
    Nesting(&'a Loop),
    Size(&'a Loop),
    Preheader(&'a Loop),
    Exit(&'a Loop, BlockId),
    Blocks(&'a Loop, BlockId, BlockId),
    Done(LoopShape),
}

/// Run the shape checks on the loop headed by `header`
pub fn recognize(loops: &LoopInfo, header: BlockId) -> LipschitzResult<LoopShape> {
    let lp = loops
        .loop_with_header(header)
        .and_then(|id| loops.get(id))
        .ok_or(LipschitzError::NotALoop(header))?;

    let mut step = Step::Nesting(lp);
    loop {
        step = match step {
            Step::Nesting(lp) => {
                if !lp.children.is_empty() {
                    return Err(LipschitzError::InnerLoops);
                }
                Step::Size(lp)
            }
            Step::Size(lp) => {
                if lp.blocks.len() > 2 {
                    return Err(LipschitzError::TooManyBlocks(lp.blocks.len()));
                }
                Step::Preheader(lp)
            }
            Step::Preheader(lp) => {
                let preheader = lp.predecessor.ok_or(LipschitzError::NoPreheader)?;
                Step::Exit(lp, preheader)
            }
            Step::Exit(lp, preheader) => {
                let exit = lp.single_exit().ok_or(LipschitzError::NoSingleExit)?;
                Step::Blocks(lp, preheader, exit)
            }
            Step::Blocks(lp, preheader, exit) => {
                let (cond, body) = if lp.blocks.len() == 1 {
                    (lp.header, lp.header)
                } else {
                    let cond = lp.single_exiting().ok_or(LipschitzError::NoSingleExiting)?;
                    let latch = lp.single_latch().ok_or(LipschitzError::NoSingleLatch)?;
                    // The latch tests the exit: the header is the body
                    let body = if latch == cond { lp.header } else { latch };
                    (cond, body)
                };
                Step::Done(LoopShape {
                    header: lp.header,
                    preheader,
                    cond,
                    body,
                    exit,
                })
            }
            Step::Done(shape) => return Ok(shape),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::flow_graph::FlowAnalysis;
    use crate::shared::ir::{ModuleBuilder, Type, Value};

    #[test]
    fn test_two_block_loop() {
        let mut mb = ModuleBuilder::new("m");
        let mut f = mb.function("f", Type::Void);
        let entry = f.block("entry");
        let h = f.block("cond");
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
        let func = f.finish();

        let flow = FlowAnalysis::compute(&func);
        let shape = recognize(&flow.loops, h).unwrap();
        assert_eq!(shape.preheader, entry);
        assert_eq!((shape.cond, shape.body, shape.exit), (h, b, x));
        assert_eq!(shape.blocks(), vec![h, b]);
    }

    #[test]
    fn test_rejects_non_header() {
        let mut mb = ModuleBuilder::new("m");
        let mut f = mb.function("f", Type::Void);
        let entry = f.block("entry");
        f.position_at_end(entry);
        f.ret(None);
        let func = f.finish();
        let flow = FlowAnalysis::compute(&func);
        assert_eq!(recognize(&flow.loops, entry), Err(LipschitzError::NotALoop(entry)));
    }

    #[test]
    fn test_rejects_two_exits() {
        // entry -> H; H -> B | X1; B -> H | X2
        let mut mb = ModuleBuilder::new("m");
        let mut f = mb.function("f", Type::Void);
        let entry = f.block("entry");
        let h = f.block("header");
        let b = f.block("body");
        let x1 = f.block("exit1");
        let x2 = f.block("exit2");
        let c = Value::ConstInt(1);
        f.position_at_end(entry);
        f.br(h);
        f.position_at_end(h);
        f.cond_br(c, b, x1);
        f.position_at_end(b);
        f.cond_br(c, h, x2);
        f.position_at_end(x1);
        f.ret(None);
        f.position_at_end(x2);
        f.ret(None);
        let func = f.finish();

        let flow = FlowAnalysis::compute(&func);
        assert_eq!(recognize(&flow.loops, h), Err(LipschitzError::NoSingleExit));
    }
}
