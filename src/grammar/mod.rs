//! The embedded reference grammar.
//!
//! Five sigils (`@tool`, `@prompt`, `@resource`, `@param`, `@config`)
//! introduce references into prompt and tool bodies. `tool`/`prompt`
//! references carry a parenthesized argument list; the rest are bare names.
//! Only enough parsing happens here to drive completion, hover and span
//! tracking; execution of the references is the backend's job.

pub mod lexer;
pub mod reference;

pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use reference::{
    ArgValue, Argument, LineRef, RefCategory, Reference, extract_arguments, find_references,
    parse_reference,
};
