//! # vmcp-expr
//!
//! Embedded-expression engine for virtual MCP editors: reference grammar,
//! context-sensitive completion, and atomic-span tracking over a mutating
//! text buffer.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! persist   → snapshot/restore of block lists
//!   ↓
//! params    → parameter-editor sessions (validate, save, test)
//!   ↓
//! engine    → block registry, position rebasing, edit guard
//!   ↓
//! complete  → completion engine, snippet construction, hover
//!   ↓
//! catalog   → externally supplied tool/prompt/resource catalogs
//!   ↓
//! grammar   → logos lexer, reference parser, argument extraction
//!   ↓
//! base      → primitives (Position, Span, BlockId, BufferView)
//! ```

// ============================================================================
// MODULES (dependency order: base → grammar → catalog → complete → engine →
// params → persist)
// ============================================================================

/// Foundation types: Position, Span, BlockId, buffer access
pub mod base;

/// Reference grammar: logos lexer, reference parser, argument extraction
pub mod grammar;

/// Externally supplied catalogs of tools, prompts, resources and variables
pub mod catalog;

/// Completion engine: trigger detection, snippets, hover
pub mod complete;

/// Core engine: atomic block registry, rebasing, edit guard
pub mod engine;

/// Parameter editor model: typed fields, validation, save, test calls
pub mod params;

/// Persistence: serializing and restoring block lists per context
pub mod persist;

/// Shared error types
pub mod error;

// Re-export foundation types
pub use base::{BlockId, BufferView, Position, Span, TextBuffer};

// Re-export the main entry points
pub use engine::{AtomicBlock, BlockCategory, ContextKey, Edit, Engine, EngineAction};
pub use error::EngineError;
