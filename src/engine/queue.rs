//! Pending programmatic operations.
//!
//! Every `Replace` the engine asks the host to perform echoes back as an
//! ordinary edit event. Each issued operation is queued here with its
//! expected span and text; when the echo arrives it is consumed instead of
//! being processed as a user edit. A tagged queue replaces re-entrancy
//! flags: each echo is matched to the specific operation that caused it.

use std::collections::VecDeque;

use tracing::trace;

use crate::base::{BlockId, Span};

use super::edit::Edit;

/// One programmatic edit the engine has issued and not yet seen echoed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOp {
    /// Guard revert: a block's recorded text re-inserted over its
    /// post-edit extent.
    StructuralInsert { span: Span, text: String },
    /// Cascade delete of one block's residual text.
    StructuralDelete { span: Span },
    /// Parameter-editor save rewriting one block's literal.
    ParamRewrite {
        block: BlockId,
        span: Span,
        text: String,
    },
}

impl PendingOp {
    fn matches(&self, edit: &Edit) -> bool {
        match self {
            PendingOp::StructuralInsert { span, text } => {
                edit.span == *span && edit.inserted == *text
            }
            PendingOp::StructuralDelete { span } => {
                edit.span == *span && edit.inserted.is_empty()
            }
            PendingOp::ParamRewrite { span, text, .. } => {
                edit.span == *span && edit.inserted == *text
            }
        }
    }
}

/// FIFO of issued operations awaiting their echo.
#[derive(Debug, Default)]
pub struct PendingQueue {
    ops: VecDeque<PendingOp>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: PendingOp) {
        self.ops.push_back(op);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Consume the front operation if `edit` is its echo. A non-matching
    /// edit leaves the queue untouched and is treated as a user edit.
    pub fn consume(&mut self, edit: &Edit) -> Option<PendingOp> {
        if self.ops.front()?.matches(edit) {
            let op = self.ops.pop_front();
            trace!(?op, "consumed echoed programmatic edit");
            op
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Span;

    #[test]
    fn test_consume_matching_echo_in_order() {
        let mut queue = PendingQueue::new();
        let a = Span::from_coords(1, 5, 1, 20);
        let b = Span::from_coords(2, 3, 2, 9);
        queue.push(PendingOp::StructuralDelete { span: a });
        queue.push(PendingOp::StructuralDelete { span: b });

        assert!(queue.consume(&Edit::delete(b)).is_none());
        assert!(queue.consume(&Edit::delete(a)).is_some());
        assert!(queue.consume(&Edit::delete(b)).is_some());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_user_edit_does_not_consume() {
        let mut queue = PendingQueue::new();
        let span = Span::from_coords(1, 5, 1, 20);
        queue.push(PendingOp::StructuralInsert {
            span,
            text: "@tool.a.b()".into(),
        });
        assert!(queue.consume(&Edit::new(span, "different")).is_none());
        assert!(!queue.is_empty());
    }
}
