//! Logos-based lexer for the reference grammar.
//!
//! Fast tokenization using the logos crate.

use logos::Logos;

/// A token with its kind, text, and byte offset into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: usize,
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    offset: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            offset: 0,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = self.offset;
        self.offset += text.len();

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => TokenKind::Error,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Token kinds, including the catch-all error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    Ident,
    Number,
    String,
    At,
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Eq,
    Error,
}

/// Logos token enum - maps to TokenKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t]+")]
    Whitespace,

    // =========================================================================
    // LITERALS
    // =========================================================================
    // Identifiers: MCP tool and server names allow `-` and `_`.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,

    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("@")]
    At,
    #[token(".")]
    Dot,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("=")]
    Eq,
}

impl From<LogosToken> for TokenKind {
    fn from(t: LogosToken) -> Self {
        match t {
            LogosToken::Whitespace => TokenKind::Whitespace,
            LogosToken::Ident => TokenKind::Ident,
            LogosToken::Number => TokenKind::Number,
            LogosToken::String => TokenKind::String,
            LogosToken::At => TokenKind::At,
            LogosToken::Dot => TokenKind::Dot,
            LogosToken::LParen => TokenKind::LParen,
            LogosToken::RParen => TokenKind::RParen,
            LogosToken::LBracket => TokenKind::LBracket,
            LogosToken::RBracket => TokenKind::RBracket,
            LogosToken::LBrace => TokenKind::LBrace,
            LogosToken::RBrace => TokenKind::RBrace,
            LogosToken::Comma => TokenKind::Comma,
            LogosToken::Colon => TokenKind::Colon,
            LogosToken::Eq => TokenKind::Eq,
        }
    }
}
