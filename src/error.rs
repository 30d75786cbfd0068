//! Error types shared across the engine.
//!
//! Everything here is locally recoverable: a corrupted block is dropped, a
//! bad edit event is ignored, a refused registration leaves the registry as
//! it was. Nothing in this crate aborts the editing session.

use thiserror::Error;

use crate::base::{BlockId, Span};

/// Errors raised by the block registry and the edit pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A block's recorded text no longer matches the buffer; the block is
    /// dropped rather than shown over mismatched text.
    #[error("stale block {id} at {span}: recorded text no longer matches the buffer")]
    StaleBlock { id: BlockId, span: Span },

    /// A new block's range collides with an already registered block.
    #[error("block registration refused: {span} overlaps existing block {existing}")]
    OverlapViolation { existing: BlockId, span: Span },

    /// An edit event with an inconsistent range; ignored defensively.
    #[error("malformed edit at {span}: {reason}")]
    MalformedEdit { span: Span, reason: &'static str },

    /// No block with the given id in the active registry.
    #[error("unknown block {0}")]
    UnknownBlock(BlockId),
}
