//! Error types, one per component boundary.
//!
//! None of these are recoverable at the point they are raised. A legally
//! derived grid never produces a mirror or goal-check failure, so their
//! appearance aborts the whole solve; decode failures abort the whole load.

use thiserror::Error;

use crate::pieces::BlockType;

/// Failures of block geometry (movement and reflection).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("cannot mirror {kind:?} block with origin column {x}")]
    InvalidMirrorColumn { kind: BlockType, x: i32 },
}

/// Failures of the goal test.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GoalError {
    #[error("grid has {count} big blocks, expected exactly one")]
    WrongBigBlockCount { count: usize },
}

/// Failures decoding persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid block type tag: {tag}")]
    InvalidBlockTypeTag { tag: u8 },
}

/// Anything that aborts a solve call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("mirror failed: {0}")]
    Mirror(#[from] BlockError),

    #[error("goal test failed: {0}")]
    Goal(#[from] GoalError),
}

/// Failures loading or saving the generation history.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Failures of a load-or-solve session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Solve(#[from] SolveError),
}
