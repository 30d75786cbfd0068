//! Edit events and their coordinate deltas.
//!
//! The host reports every buffer mutation as a replace-edit: `span` is the
//! replaced range (empty for pure insertions) and `inserted` the new text
//! (empty for pure deletions). All rebasing math derives from these two
//! fields alone; the engine never re-reads the buffer to rebase.

use crate::base::{Position, Span};
use crate::error::EngineError;

/// One buffer mutation in 1-based coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: Span,
    pub inserted: String,
}

impl Edit {
    pub fn new(span: Span, inserted: impl Into<String>) -> Self {
        Self {
            span,
            inserted: inserted.into(),
        }
    }

    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self::new(Span::empty(at), text)
    }

    pub fn delete(span: Span) -> Self {
        Self::new(span, "")
    }

    /// Reject events with impossible coordinates. Such events come from
    /// host glitches and are ignored, leaving the registry untouched.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.span.start.line < 1 || self.span.start.column < 1 {
            return Err(EngineError::MalformedEdit {
                span: self.span,
                reason: "zero line or column",
            });
        }
        if self.span.end < self.span.start {
            return Err(EngineError::MalformedEdit {
                span: self.span,
                reason: "inverted range",
            });
        }
        Ok(())
    }

    pub fn is_insertion(&self) -> bool {
        self.span.is_empty() && !self.inserted.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        !self.span.is_empty() && self.inserted.is_empty()
    }

    /// Number of lines the inserted text occupies (1 when it has no
    /// newline).
    pub fn inserted_lines(&self) -> u32 {
        self.inserted.matches('\n').count() as u32 + 1
    }

    fn last_inserted_line_len(&self) -> u32 {
        self.inserted
            .rsplit('\n')
            .next()
            .map(|l| l.chars().count() as u32)
            .unwrap_or(0)
    }

    /// Net line shift for text after the edit.
    pub fn line_delta(&self) -> i64 {
        (self.inserted_lines() as i64 - 1) - (self.span.end.line as i64 - self.span.start.line as i64)
    }

    /// Where the replaced range's end sits after the edit.
    pub fn end_position_after(&self) -> Position {
        if self.inserted.contains('\n') {
            Position::new(
                self.span.start.line + self.inserted_lines() - 1,
                self.last_inserted_line_len() + 1,
            )
        } else {
            Position::new(
                self.span.start.line,
                self.span.start.column + self.inserted.chars().count() as u32,
            )
        }
    }

    /// Net column shift for text that followed the replaced range on its
    /// end line.
    pub fn column_delta(&self) -> i64 {
        self.end_position_after().column as i64 - self.span.end.column as i64
    }
}
