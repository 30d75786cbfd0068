//! Foundation types for the expression engine.
//!
//! This module provides the primitives used throughout the crate:
//! - [`Position`], [`Span`] - 1-based line/column coordinates from the host
//!   editor surface
//! - [`BlockId`] - unique atomic block identifiers
//! - [`BufferView`], [`TextBuffer`] - read access to the host buffer text
//!
//! This module has NO dependencies on other vmcp-expr modules.

mod block_id;
mod buffer;
mod position;

pub use block_id::BlockId;
pub use buffer::{BufferView, TextBuffer};
pub use position::{Position, Span};

/// Pseudo-namespace under which custom (non-server) tools, prompts and
/// resources are published.
pub const LOCAL_NAMESPACE: &str = "vmcp";
