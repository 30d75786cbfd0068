//! The atomic-span engine.
//!
//! The engine owns one block registry per authoring context and reacts to
//! the host's edit events with [`EngineAction`]s. It never touches the
//! host editor directly: every buffer mutation it wants is emitted as a
//! `Replace` action, and the echo of that mutation is recognized through
//! the pending-operation queue when it comes back as an edit event.
//!
//! Edit pipeline, in order:
//! 1. malformed events are dropped;
//! 2. echoes of the engine's own edits are consumed;
//! 3. an armed completion turns its insertion into a new block;
//! 4. deletions touching blocks cascade to whole-block deletes;
//! 5. content edits strictly inside a block are reverted and the
//!    parameter editor is requested;
//! 6. everything else rebases the registry.

pub mod block;
pub mod edit;
pub mod queue;
pub mod registry;

pub use block::{AtomicBlock, BlockCategory};
pub use edit::Edit;
pub use queue::{PendingOp, PendingQueue};
pub use registry::{BlockRegistry, RebaseOutcome};

use std::collections::VecDeque;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::base::{BlockId, BufferView, Position, Span};
use crate::catalog::CatalogEntry;
use crate::complete::render_literal;
use crate::error::EngineError;
use crate::grammar::parse_reference;
use crate::persist::{self, BlockRecord};

/// Which authoring surface is being edited. Each key owns an independent
/// registry; switching contexts swaps the active registry wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKey {
    SystemPrompt,
    Prompt(usize),
    Tool(usize),
}

impl Default for ContextKey {
    fn default() -> Self {
        ContextKey::SystemPrompt
    }
}

impl std::fmt::Display for ContextKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextKey::SystemPrompt => write!(f, "system-prompt"),
            ContextKey::Prompt(i) => write!(f, "prompt[{i}]"),
            ContextKey::Tool(i) => write!(f, "tool[{i}]"),
        }
    }
}

/// What the engine asks the host to do.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineAction {
    /// Replace `span` with `text` in the buffer.
    Replace { span: Span, text: String },
    /// Move the caret.
    MoveCaret { position: Position },
    /// Open the parameter editor for a block.
    OpenParameterEditor { block_id: BlockId },
    /// The set of blocks (or their spans) changed; re-render decorations.
    BlocksChanged,
}

/// Per-context registries with one active at a time. The whole registry is
/// swapped on a context switch; no block state leaks between contexts.
#[derive(Debug)]
pub struct ContextStore {
    registries: FxHashMap<ContextKey, BlockRegistry>,
    active: ContextKey,
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStore {
    pub fn new() -> Self {
        let active = ContextKey::SystemPrompt;
        let mut registries = FxHashMap::default();
        registries.insert(active, BlockRegistry::new());
        Self { registries, active }
    }

    pub fn active(&self) -> ContextKey {
        self.active
    }

    /// Make `key` the active context, creating its registry on first use.
    pub fn switch(&mut self, key: ContextKey) {
        self.registries.entry(key).or_default();
        self.active = key;
    }

    pub fn registry(&self) -> &BlockRegistry {
        // The active key always has an entry; `switch` and `new` insert it.
        &self.registries[&self.active]
    }

    pub fn registry_mut(&mut self) -> &mut BlockRegistry {
        self.registries.entry(self.active).or_default()
    }

    /// Swap out the active context's registry wholesale.
    pub fn replace(&mut self, registry: BlockRegistry) {
        self.registries.insert(self.active, registry);
    }
}

/// The engine. One instance per document.
#[derive(Debug)]
pub struct Engine {
    contexts: ContextStore,
    pending: PendingQueue,
    /// Completion entry accepted by the host; the next matching insertion
    /// becomes a block.
    armed: Option<CatalogEntry>,
    submitted: VecDeque<Edit>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            contexts: ContextStore::new(),
            pending: PendingQueue::new(),
            armed: None,
            submitted: VecDeque::new(),
        }
    }

    pub fn context(&self) -> ContextKey {
        self.contexts.active()
    }

    /// Switch the active authoring context. Pending state is per document,
    /// not per context, so an in-flight queue is flushed by the host before
    /// switching.
    pub fn set_context(&mut self, key: ContextKey) {
        self.contexts.switch(key);
        self.armed = None;
        debug!(context = %key, blocks = self.registry().len(), "context switched");
    }

    pub fn registry(&self) -> &BlockRegistry {
        self.contexts.registry()
    }

    fn registry_mut(&mut self) -> &mut BlockRegistry {
        self.contexts.registry_mut()
    }

    /// Blocks of the active context in document order.
    pub fn blocks(&self) -> Vec<&AtomicBlock> {
        self.registry().ordered()
    }

    /// The block at a position, end inclusive; used for click handling.
    pub fn block_at(&self, pos: Position) -> Option<&AtomicBlock> {
        self.registry().block_at(pos)
    }

    /// Where the caret should go when it lands strictly inside a block's
    /// interior. `None` means the position is fine.
    pub fn advise_caret(&self, pos: Position) -> Option<Position> {
        self.blocks()
            .iter()
            .find(|b| b.span.start < pos && pos < b.span.end)
            .map(|b| b.span.end)
    }

    /// Arm block creation: the next insertion whose text matches `entry`'s
    /// accepted completion becomes an atomic block.
    pub fn arm_completion(&mut self, entry: CatalogEntry) {
        self.armed = Some(entry);
    }

    /// Queue an edit without processing it yet.
    pub fn submit_edit(&mut self, edit: Edit) {
        self.submitted.push_back(edit);
    }

    /// Process all queued edits in arrival order.
    pub fn flush(&mut self) -> Vec<EngineAction> {
        let mut actions = Vec::new();
        while let Some(edit) = self.submitted.pop_front() {
            actions.extend(self.process_edit(edit));
        }
        actions
    }

    /// Submit and process one edit immediately.
    pub fn apply_edit(&mut self, edit: Edit) -> Vec<EngineAction> {
        self.submit_edit(edit);
        self.flush()
    }

    fn process_edit(&mut self, edit: Edit) -> Vec<EngineAction> {
        if let Err(err) = edit.validate() {
            warn!(%err, "ignoring malformed edit event");
            return Vec::new();
        }

        if let Some(op) = self.pending.consume(&edit) {
            debug!(?op, "programmatic edit echoed back");
            return Vec::new();
        }

        if self.armed.is_some() {
            if let Some(actions) = self.try_create_block(&edit) {
                return actions;
            }
        }

        if edit.is_deletion() {
            let touched = self.registry().blocks_touching(edit.span);
            if !touched.is_empty() {
                return self.cascade_delete(&edit, touched);
            }
        }

        if !edit.inserted.is_empty() {
            if let Some(block) = self.registry().block_strictly_around(edit.span) {
                let id = block.id;
                return self.guard_revert(&edit, id);
            }
        }

        let outcome = self.registry_mut().rebase(&edit, None);
        if outcome.changed() {
            vec![EngineAction::BlocksChanged]
        } else {
            Vec::new()
        }
    }

    /// Turn an armed completion's insertion echo into a registered block.
    /// Returns `None` when the edit is not that echo; the arm is cleared
    /// either way, a stale arm must not capture a later edit.
    fn try_create_block(&mut self, edit: &Edit) -> Option<Vec<EngineAction>> {
        let entry = self.armed.take()?;
        if edit.inserted.contains('\n')
            || !edit.inserted.starts_with(entry.label().as_str())
            || !edit.inserted.ends_with(')')
        {
            debug!(label = %entry.label(), "armed completion did not match next edit");
            return None;
        }

        // The `@tool.` / `@prompt.` sigil was already typed before the
        // completion inserted the rest; the block starts at the sigil.
        let prefix = format!("@{}.", entry.category.keyword());
        let prefix_len = prefix.chars().count() as u32;
        let start_col = edit.span.start.column.checked_sub(prefix_len)?;
        if start_col < 1 {
            return None;
        }

        let literal = format!("{prefix}{}", edit.inserted);
        let values = match parse_reference(&literal) {
            Ok((reference, consumed)) if consumed == literal.len() => {
                reference.argument_values()
            }
            _ => {
                warn!(%literal, "completion insertion did not parse, not tracking it");
                return None;
            }
        };

        let span = Span::new(
            Position::new(edit.span.start.line, start_col),
            edit.end_position_after(),
        );
        let block = AtomicBlock::new(&entry, span, literal, values)?;
        let end = block.span.end;

        // Everything after the insertion shifts before the block exists,
        // so the new block needs no exemption.
        self.registry_mut().rebase(edit, None);
        match self.registry_mut().register(block) {
            Ok(_) => Some(vec![
                EngineAction::MoveCaret { position: end },
                EngineAction::BlocksChanged,
            ]),
            Err(err) => {
                warn!(%err, "could not register completed block");
                Some(vec![EngineAction::BlocksChanged])
            }
        }
    }

    /// A deletion that touches blocks consumes each of them whole. The
    /// user's deletion already happened; for each touched block the text
    /// still in the buffer (its residual) is deleted with a follow-up
    /// replace, in reverse document order so earlier spans stay valid.
    fn cascade_delete(&mut self, edit: &Edit, touched: Vec<BlockId>) -> Vec<EngineAction> {
        let mut actions = Vec::new();
        let removed: Vec<AtomicBlock> = touched
            .iter()
            .filter_map(|id| self.registry_mut().remove(*id))
            .collect();

        self.registry_mut().rebase(edit, None);

        for block in &removed {
            debug!(id = %block.id, label = %block.label(), "deletion consumed block");
            let Some(residual) = residual_span(block.span, edit.span) else {
                continue;
            };
            self.pending.push(PendingOp::StructuralDelete { span: residual });
            actions.push(EngineAction::Replace {
                span: residual,
                text: String::new(),
            });
            self.registry_mut().rebase(&Edit::delete(residual), None);
        }

        actions.push(EngineAction::BlocksChanged);
        actions
    }

    /// Revert a content edit inside a block and ask for the parameter
    /// editor instead. Net buffer change is zero, so the registry is not
    /// rebased.
    fn guard_revert(&mut self, edit: &Edit, id: BlockId) -> Vec<EngineAction> {
        let Some(block) = self.registry().get(id) else {
            return Vec::new();
        };
        let end_after = edit.end_position_after();
        let post_end = Position::new(
            end_after.line,
            end_after.column + (block.span.end.column - edit.span.end.column),
        );
        let revert_span = Span::new(block.span.start, post_end);
        let text = block.literal_text.clone();
        let caret = block.span.end;

        debug!(%id, span = %revert_span, "reverting edit inside block");
        self.pending.push(PendingOp::StructuralInsert {
            span: revert_span,
            text: text.clone(),
        });
        vec![
            EngineAction::Replace {
                span: revert_span,
                text,
            },
            EngineAction::MoveCaret { position: caret },
            EngineAction::OpenParameterEditor { block_id: id },
        ]
    }

    /// Rewrite a block's literal from new parameter values. Emits exactly
    /// one replace over the old span and shifts same-line blocks after it
    /// by the length difference.
    pub fn commit_parameters(
        &mut self,
        id: BlockId,
        values: IndexMap<SmolStr, Value>,
    ) -> Result<Vec<EngineAction>, EngineError> {
        let block = self.registry().get(id).ok_or(EngineError::UnknownBlock(id))?;
        let new_literal = render_literal(
            block.category.as_ref_category(),
            &block.namespace,
            &block.name,
            &block.schema,
            &values,
        );
        let old_span = block.span;
        let new_len = new_literal.chars().count() as u32;
        let delta = new_len as i64 - (old_span.end.column - old_span.start.column) as i64;
        let new_span = Span::new(
            old_span.start,
            Position::new(old_span.start.line, old_span.start.column + new_len),
        );

        self.pending.push(PendingOp::ParamRewrite {
            block: id,
            span: old_span,
            text: new_literal.clone(),
        });

        if let Some(block) = self.registry_mut().get_mut(id) {
            block.literal_text = new_literal.clone();
            block.values = values;
            block.span = new_span;
        }

        if delta != 0 {
            let ids: Vec<BlockId> = self
                .registry()
                .ordered()
                .iter()
                .filter(|b| {
                    b.id != id
                        && b.span.start.line == old_span.end.line
                        && b.span.start.column >= old_span.end.column
                })
                .map(|b| b.id)
                .collect();
            for other in ids {
                if let Some(block) = self.registry_mut().get_mut(other) {
                    block.shift_columns(delta);
                }
            }
        }

        Ok(vec![
            EngineAction::Replace {
                span: old_span,
                text: new_literal,
            },
            EngineAction::BlocksChanged,
        ])
    }

    /// Serialize the active context's blocks.
    pub fn snapshot(&self) -> Vec<BlockRecord> {
        persist::snapshot(self.registry())
    }

    /// Replace the active context's registry with restored blocks,
    /// validating each record against the buffer.
    pub fn restore(&mut self, records: Vec<BlockRecord>, buffer: &dyn BufferView) {
        let registry = persist::restore(records, buffer);
        self.contexts.replace(registry);
    }
}

/// What is left of `block` in the buffer after `deleted` was removed, in
/// post-edit coordinates. `None` when the deletion consumed the block
/// entirely.
fn residual_span(block: Span, deleted: Span) -> Option<Span> {
    let head = block.start < deleted.start;
    let tail = block.end > deleted.end;
    if !head && !tail {
        return None;
    }
    let start = if head { block.start } else { deleted.start };
    let end = if tail {
        Position::new(
            deleted.start.line,
            deleted.start.column + (block.end.column - deleted.end.column),
        )
    } else {
        deleted.start
    };
    Some(Span::new(start, end))
}
