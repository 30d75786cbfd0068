//! The per-context block registry and its rebasing pass.

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::base::{BlockId, Position, Span};
use crate::error::EngineError;

use super::block::AtomicBlock;
use super::edit::Edit;

/// All atomic blocks of one authoring context.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    blocks: FxHashMap<BlockId, AtomicBlock>,
}

/// What one rebasing pass did.
#[derive(Debug, Default)]
pub struct RebaseOutcome {
    /// Blocks removed because the edit overwrote part of their text.
    pub dropped: Vec<AtomicBlock>,
    /// Whether any surviving block moved.
    pub moved: bool,
}

impl RebaseOutcome {
    pub fn changed(&self) -> bool {
        self.moved || !self.dropped.is_empty()
    }
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: BlockId) -> Option<&AtomicBlock> {
        self.blocks.get(&id)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut AtomicBlock> {
        self.blocks.get_mut(&id)
    }

    pub fn remove(&mut self, id: BlockId) -> Option<AtomicBlock> {
        self.blocks.remove(&id)
    }

    /// Register a block, refusing range collisions with existing blocks.
    pub fn register(&mut self, block: AtomicBlock) -> Result<BlockId, EngineError> {
        if let Some(existing) = self.blocks.values().find(|b| b.span.overlaps(&block.span)) {
            warn!(
                existing = %existing.id,
                span = %block.span,
                "refusing block registration over existing block"
            );
            return Err(EngineError::OverlapViolation {
                existing: existing.id,
                span: block.span,
            });
        }
        let id = block.id;
        trace!(%id, span = %block.span, label = %block.label(), "block registered");
        self.blocks.insert(id, block);
        Ok(id)
    }

    /// Blocks in document order.
    pub fn ordered(&self) -> Vec<&AtomicBlock> {
        let mut blocks: Vec<_> = self.blocks.values().collect();
        blocks.sort_by_key(|b| b.span.start);
        blocks
    }

    /// The block whose span contains `pos` (end inclusive, for clicks).
    pub fn block_at(&self, pos: Position) -> Option<&AtomicBlock> {
        self.blocks
            .values()
            .find(|b| b.span.contains_inclusive(pos))
    }

    /// The block whose interior strictly contains the given span.
    pub fn block_strictly_around(&self, span: Span) -> Option<&AtomicBlock> {
        self.blocks
            .values()
            .find(|b| b.span.start < span.start && span.end < b.span.end)
    }

    /// Blocks a deletion consumes, boundary contact included, in reverse
    /// document order so cascaded deletes never disturb earlier spans.
    pub fn blocks_touching(&self, span: Span) -> Vec<BlockId> {
        let mut hit: Vec<_> = self
            .blocks
            .values()
            .filter(|b| span.touches(&b.span))
            .collect();
        hit.sort_by_key(|b| std::cmp::Reverse(b.span.start));
        hit.iter().map(|b| b.id).collect()
    }

    /// Recompute every block's span for one edit.
    ///
    /// A block whose text the edit overwrote is dropped. A block starting
    /// at or after the edit's end shifts lines by the edit's line delta,
    /// and also columns when it starts on the line the replaced range
    /// ended on. Blocks entirely before the edit stay put.
    pub fn rebase(&mut self, edit: &Edit, exempt: Option<BlockId>) -> RebaseOutcome {
        let mut outcome = RebaseOutcome::default();
        let line_delta = edit.line_delta();
        let column_delta = edit.column_delta();

        let ids: Vec<BlockId> = self.blocks.keys().copied().collect();
        for id in ids {
            if Some(id) == exempt {
                continue;
            }
            let Some(block) = self.blocks.get(&id) else {
                continue;
            };
            let span = block.span;
            if edit.span.overlaps(&span) {
                debug!(%id, span = %span, "dropping block overwritten by edit");
                if let Some(dropped) = self.blocks.remove(&id) {
                    outcome.dropped.push(dropped);
                }
                continue;
            }
            if span.start >= edit.span.end {
                let on_end_line = span.start.line == edit.span.end.line;
                let Some(block) = self.blocks.get_mut(&id) else {
                    continue;
                };
                let mut shifted = false;
                if line_delta != 0 {
                    block.shift_lines(line_delta);
                    shifted = true;
                }
                if on_end_line && column_delta != 0 {
                    block.shift_columns(column_delta);
                    shifted = true;
                }
                if shifted {
                    outcome.moved = true;
                    trace!(%id, span = %block.span, "block rebased");
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Span;
    use crate::catalog::CallSchema;
    use crate::engine::block::BlockCategory;
    use indexmap::IndexMap;

    fn block(span: Span) -> AtomicBlock {
        AtomicBlock {
            id: BlockId::new(),
            span,
            category: BlockCategory::Tool,
            namespace: "files".into(),
            name: "read".into(),
            literal_text: String::new(),
            schema: CallSchema::default(),
            values: IndexMap::new(),
        }
    }

    #[test]
    fn test_register_refuses_overlap() {
        let mut registry = BlockRegistry::new();
        registry.register(block(Span::from_coords(1, 5, 1, 20))).unwrap();
        let err = registry.register(block(Span::from_coords(1, 10, 1, 30)));
        assert!(matches!(err, Err(EngineError::OverlapViolation { .. })));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_allows_adjacent() {
        let mut registry = BlockRegistry::new();
        registry.register(block(Span::from_coords(1, 5, 1, 20))).unwrap();
        assert!(registry.register(block(Span::from_coords(1, 20, 1, 30))).is_ok());
    }

    #[test]
    fn test_rebase_insert_before_shifts_columns() {
        let mut registry = BlockRegistry::new();
        let id = registry.register(block(Span::from_coords(3, 10, 3, 25))).unwrap();
        let outcome = registry.rebase(&Edit::insert(Position::new(3, 1), "12345"), None);
        assert!(outcome.moved);
        assert_eq!(registry.get(id).unwrap().span, Span::from_coords(3, 15, 3, 30));
    }

    #[test]
    fn test_rebase_same_length_replace_is_noop() {
        let mut registry = BlockRegistry::new();
        let id = registry.register(block(Span::from_coords(3, 10, 3, 25))).unwrap();
        let outcome = registry.rebase(&Edit::new(Span::from_coords(3, 1, 3, 4), "xyz"), None);
        assert!(!outcome.changed());
        assert_eq!(registry.get(id).unwrap().span, Span::from_coords(3, 10, 3, 25));
    }

    #[test]
    fn test_rebase_newline_shifts_lines() {
        let mut registry = BlockRegistry::new();
        let id = registry.register(block(Span::from_coords(3, 10, 3, 25))).unwrap();
        registry.rebase(&Edit::insert(Position::new(1, 1), "\n"), None);
        assert_eq!(registry.get(id).unwrap().span, Span::from_coords(4, 10, 4, 25));
    }

    #[test]
    fn test_rebase_multi_line_paste_before_block_on_same_line() {
        let mut registry = BlockRegistry::new();
        let id = registry.register(block(Span::from_coords(2, 10, 2, 25))).unwrap();
        // Insert end lands at (3,5); old end col was 4, so trailing text
        // moves down one line and right one column.
        registry.rebase(&Edit::insert(Position::new(2, 4), "ab\ncdef"), None);
        assert_eq!(registry.get(id).unwrap().span, Span::from_coords(3, 11, 3, 26));
    }

    #[test]
    fn test_rebase_drops_overlapping_block() {
        let mut registry = BlockRegistry::new();
        let id = registry.register(block(Span::from_coords(2, 10, 2, 25))).unwrap();
        let outcome = registry.rebase(&Edit::new(Span::from_coords(2, 20, 2, 30), "zzz"), None);
        assert_eq!(outcome.dropped.len(), 1);
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn test_rebase_multi_line_delete_ending_at_block_start() {
        let mut registry = BlockRegistry::new();
        let id = registry.register(block(Span::from_coords(4, 7, 4, 20))).unwrap();
        // Delete (2,4)..(4,7): block lands on line 2 at column 4.
        registry.rebase(&Edit::delete(Span::from_coords(2, 4, 4, 7)), None);
        assert_eq!(registry.get(id).unwrap().span, Span::from_coords(2, 4, 2, 17));
    }

    #[test]
    fn test_rebase_exempt_block_is_untouched() {
        let mut registry = BlockRegistry::new();
        let id = registry.register(block(Span::from_coords(1, 5, 1, 20))).unwrap();
        registry.rebase(&Edit::insert(Position::new(1, 1), "xx"), Some(id));
        assert_eq!(registry.get(id).unwrap().span, Span::from_coords(1, 5, 1, 20));
    }
}
