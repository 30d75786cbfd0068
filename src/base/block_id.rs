//! Atomic block identifiers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an atomic block.
///
/// Identity is stable across rebasing and parameter rewrites; a block only
/// ever gets a new id when it is recreated from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
