//! Position tracking for atomic blocks.
//!
//! Coordinates are 1-based line/column pairs, matching the edit events the
//! host editor surface reports. Columns count characters, not bytes.

use serde::{Deserialize, Serialize};

/// A position in the buffer (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// A half-open range `[start, end)` in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a span from line/column coordinates.
    pub fn from_coords(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start: Position::new(start_line, start_col),
            end: Position::new(end_line, end_col),
        }
    }

    /// A zero-width span at `pos`, as reported for pure insertions.
    pub fn empty(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    /// Check if a position falls within `[start, end)`.
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Check if a position falls within `[start, end]`, end inclusive.
    ///
    /// Used for click/hover hit-testing, where the caret sitting right after
    /// the last character still counts as "on" the span.
    pub fn contains_inclusive(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Strict interval overlap: the two spans share at least one character.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Overlap with touching boundaries included.
    ///
    /// Deletion cascades use this: a delete that merely touches a block
    /// boundary still consumes the whole block, so a single backspace at
    /// the edge removes the reference as one unit.
    pub fn touches(&self, other: &Span) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(1, 5) < Position::new(2, 1));
        assert!(Position::new(3, 4) < Position::new(3, 9));
        assert_eq!(Position::new(2, 2), Position::new(2, 2));
    }

    #[test]
    fn test_contains_half_open() {
        let span = Span::from_coords(3, 10, 3, 25);
        assert!(!span.contains(Position::new(3, 9)));
        assert!(span.contains(Position::new(3, 10)));
        assert!(span.contains(Position::new(3, 24)));
        assert!(!span.contains(Position::new(3, 25)));
        assert!(span.contains_inclusive(Position::new(3, 25)));
    }

    #[test]
    fn test_overlaps_is_strict() {
        let a = Span::from_coords(1, 1, 1, 10);
        let b = Span::from_coords(1, 10, 1, 20);
        assert!(!a.overlaps(&b));
        assert!(a.touches(&b));

        let c = Span::from_coords(1, 5, 1, 12);
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_empty_insertion_span_overlap() {
        let block = Span::from_coords(2, 5, 2, 15);
        // Insertion strictly inside the block counts as overlapping.
        assert!(Span::empty(Position::new(2, 8)).overlaps(&block));
        // Insertion at either boundary does not.
        assert!(!Span::empty(Position::new(2, 5)).overlaps(&block));
        assert!(!Span::empty(Position::new(2, 15)).overlaps(&block));
    }
}
