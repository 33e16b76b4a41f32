//! Error types for the closed-form loop bound
//!
//! Every variant is a precondition of the closed form; callers fall back to
//! the unrolled analysis instead of surfacing it.

use thiserror::Error;

use crate::shared::ir::{BlockId, Opcode};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LipschitzError {
    #[error("block {0:?} does not head a loop")]
    NotALoop(BlockId),

    #[error("loop contains inner loops")]
    InnerLoops,

    #[error("loop has {0} blocks (at most 2 supported)")]
    TooManyBlocks(usize),

    #[error("loop has no single predecessor")]
    NoPreheader,

    #[error("loop has no single exit block")]
    NoSingleExit,

    #[error("loop has no single exiting block")]
    NoSingleExiting,

    #[error("loop has no single latch")]
    NoSingleLatch,

    #[error("phi '{0}' lacks a preheader or latch incoming value")]
    MissingIncoming(String),

    #[error("'{name}' ({opcode:?}) is outside the loop expression grammar")]
    UnsupportedOperation { name: String, opcode: Opcode },

    #[error("value outside the loop expression grammar: {0}")]
    UnsupportedValue(String),

    #[error("no range recorded for symbol '{0}'")]
    MissingRange(String),

    #[error("derivative unbounded over the symbol ranges")]
    UnboundedDerivative,

    #[error("roundoff pass failed: {0}")]
    Roundoff(String),
}

pub type LipschitzResult<T> = Result<T, LipschitzError>;
