//! Saving and restoring block lists.
//!
//! Blocks are persisted as a plain ordered list alongside the document
//! text. On restore every record is validated against the buffer: the
//! recorded literal must still sit at the recorded span, character for
//! character. A record that fails validation is discarded silently, a
//! block must never be shown over text it does not match.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::base::{BlockId, BufferView, Span};
use crate::catalog::CallSchema;
use crate::engine::{AtomicBlock, BlockCategory, BlockRegistry};

/// Serialized form of one atomic block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    pub span: Span,
    pub category: BlockCategory,
    pub namespace: SmolStr,
    pub name: SmolStr,
    pub literal_text: String,
    #[serde(default)]
    pub schema: CallSchema,
    #[serde(default)]
    pub values: IndexMap<SmolStr, Value>,
}

impl From<&AtomicBlock> for BlockRecord {
    fn from(block: &AtomicBlock) -> Self {
        Self {
            id: block.id,
            span: block.span,
            category: block.category,
            namespace: block.namespace.clone(),
            name: block.name.clone(),
            literal_text: block.literal_text.clone(),
            schema: block.schema.clone(),
            values: block.values.clone(),
        }
    }
}

impl From<BlockRecord> for AtomicBlock {
    fn from(record: BlockRecord) -> Self {
        Self {
            id: record.id,
            span: record.span,
            category: record.category,
            namespace: record.namespace,
            name: record.name,
            literal_text: record.literal_text,
            schema: record.schema,
            values: record.values,
        }
    }
}

/// Serialize a registry's blocks in document order.
pub fn snapshot(registry: &BlockRegistry) -> Vec<BlockRecord> {
    registry.ordered().into_iter().map(BlockRecord::from).collect()
}

/// Rebuild a registry from records, dropping every record whose text no
/// longer matches the buffer and every record that would overlap an
/// already restored one.
pub fn restore(records: Vec<BlockRecord>, buffer: &dyn BufferView) -> BlockRegistry {
    let mut registry = BlockRegistry::new();
    for record in records {
        let block = AtomicBlock::from(record);
        if !block.matches_buffer(buffer) {
            warn!(
                id = %block.id,
                span = %block.span,
                label = %block.label(),
                "dropping restored block, buffer text does not match"
            );
            continue;
        }
        if let Err(err) = registry.register(block) {
            warn!(%err, "dropping restored block");
        }
    }
    debug!(blocks = registry.len(), "registry restored");
    registry
}
