//! Atomic block data.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use crate::base::{BlockId, BufferView, Span};
use crate::catalog::{CallSchema, CatalogEntry};
use crate::grammar::RefCategory;

/// Which invocable kind a block wraps. Only tool and prompt references
/// become blocks; `resource`/`param`/`config` references stay plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockCategory {
    Tool,
    Prompt,
}

impl BlockCategory {
    pub fn as_ref_category(&self) -> RefCategory {
        match self {
            BlockCategory::Tool => RefCategory::Tool,
            BlockCategory::Prompt => RefCategory::Prompt,
        }
    }

    pub fn from_ref_category(category: RefCategory) -> Option<Self> {
        match category {
            RefCategory::Tool => Some(BlockCategory::Tool),
            RefCategory::Prompt => Some(BlockCategory::Prompt),
            _ => None,
        }
    }
}

impl std::fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref_category().keyword())
    }
}

/// One tracked reference call in the buffer.
///
/// Invariants: `literal_text` equals the buffer substring at `span`, the
/// span stays on a single line, and no two blocks in a registry overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicBlock {
    pub id: BlockId,
    pub span: Span,
    pub category: BlockCategory,
    pub namespace: SmolStr,
    pub name: SmolStr,
    /// Exact buffer text of the whole call, sigil included.
    pub literal_text: String,
    pub schema: CallSchema,
    /// Current argument values, schema field order.
    pub values: IndexMap<SmolStr, Value>,
}

impl AtomicBlock {
    pub fn new(
        entry: &CatalogEntry,
        span: Span,
        literal_text: String,
        values: IndexMap<SmolStr, Value>,
    ) -> Option<Self> {
        Some(Self {
            id: BlockId::new(),
            span,
            category: BlockCategory::from_ref_category(entry.category)?,
            namespace: entry.namespace.clone(),
            name: entry.name.clone(),
            literal_text,
            schema: entry.schema.clone(),
            values,
        })
    }

    pub fn label(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Whether the recorded text still matches the buffer at the recorded
    /// span.
    pub fn matches_buffer(&self, buffer: &dyn BufferView) -> bool {
        buffer.slice(self.span).as_deref() == Some(self.literal_text.as_str())
    }

    /// Character length of the literal; equals the column width of the
    /// span for a healthy block.
    pub fn literal_len(&self) -> u32 {
        self.literal_text.chars().count() as u32
    }

    pub fn shift_lines(&mut self, delta: i64) {
        self.span.start.line = (self.span.start.line as i64 + delta) as u32;
        self.span.end.line = (self.span.end.line as i64 + delta) as u32;
    }

    pub fn shift_columns(&mut self, delta: i64) {
        self.span.start.column = (self.span.start.column as i64 + delta) as u32;
        self.span.end.column = (self.span.end.column as i64 + delta) as u32;
    }
}
