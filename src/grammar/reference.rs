//! Recursive-descent parser for single references.
//!
//! A reference is one of:
//!
//! ```text
//! @tool.namespace.name(arg: type = literal, ...)
//! @prompt.namespace.name(arg = literal, ...)
//! @resource.namespace.name
//! @param.name
//! @config.NAME
//! ```
//!
//! Argument literals are quoted strings, bare numbers/booleans/null, JSON
//! arrays, or a one-level nested `@param.`/`@config.` reference. The
//! `: type` annotation is snippet sugar and is stripped whenever arguments
//! are extracted for execution.

use indexmap::IndexMap;
use serde_json::Value;
use smol_str::SmolStr;
use thiserror::Error;

use super::lexer::{Token, TokenKind, tokenize};

/// The five reference categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefCategory {
    Tool,
    Prompt,
    Resource,
    Param,
    Config,
}

impl RefCategory {
    pub const ALL: [RefCategory; 5] = [
        RefCategory::Tool,
        RefCategory::Prompt,
        RefCategory::Resource,
        RefCategory::Param,
        RefCategory::Config,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            RefCategory::Tool => "tool",
            RefCategory::Prompt => "prompt",
            RefCategory::Resource => "resource",
            RefCategory::Param => "param",
            RefCategory::Config => "config",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "tool" => Some(RefCategory::Tool),
            "prompt" => Some(RefCategory::Prompt),
            "resource" => Some(RefCategory::Resource),
            "param" => Some(RefCategory::Param),
            "config" => Some(RefCategory::Config),
            _ => None,
        }
    }

    /// Tool and prompt references take an argument list and become atomic
    /// blocks; the other categories stay plain text.
    pub fn is_invocable(&self) -> bool {
        matches!(self, RefCategory::Tool | RefCategory::Prompt)
    }

    /// Whether the reference path is `category.namespace.name` rather than
    /// a single `category.name`.
    pub fn has_namespace(&self) -> bool {
        matches!(
            self,
            RefCategory::Tool | RefCategory::Prompt | RefCategory::Resource
        )
    }
}

impl std::fmt::Display for RefCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One `name[: type] = value` entry of an argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: SmolStr,
    /// Display-type annotation (`int`, `str`, `[str]`, ...); never sent
    /// anywhere.
    pub ty: Option<SmolStr>,
    pub value: ArgValue,
}

/// An argument literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Json(Value),
    /// One-level nested `@param.` / `@config.` reference.
    Ref(Box<Reference>),
}

impl ArgValue {
    /// Execution form of the value; nested references stay textual so the
    /// backend can resolve them.
    pub fn to_json(&self) -> Value {
        match self {
            ArgValue::Json(v) => v.clone(),
            ArgValue::Ref(r) => Value::String(r.to_string()),
        }
    }
}

/// A parsed reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub category: RefCategory,
    pub namespace: Option<SmolStr>,
    pub name: SmolStr,
    pub args: Option<Vec<Argument>>,
}

impl Reference {
    /// `namespace.name` for namespaced categories, bare `name` otherwise.
    pub fn label(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.to_string(),
        }
    }

    /// Argument map with type annotations stripped.
    pub fn argument_values(&self) -> IndexMap<SmolStr, Value> {
        self.args
            .iter()
            .flatten()
            .map(|a| (a.name.clone(), a.value.to_json()))
            .collect()
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}.{}", self.category, self.label())
    }
}

/// Parse failures; references that fail to parse are simply not references.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RefParseError {
    #[error("unknown reference category `{0}`")]
    UnknownCategory(SmolStr),
    #[error("expected {expected}, found `{found}`")]
    Expected {
        expected: &'static str,
        found: String,
    },
    #[error("unexpected end of input, expected {0}")]
    UnexpectedEnd(&'static str),
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),
    #[error("only @param and @config references may be nested")]
    InvalidNesting,
}

/// A reference found by [`find_references`], with byte offsets into the
/// scanned line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRef {
    pub start: usize,
    pub end: usize,
    pub reference: Reference,
}

/// Parse a single reference at the start of `text`. Returns the reference
/// and the number of bytes consumed.
pub fn parse_reference(text: &str) -> Result<(Reference, usize), RefParseError> {
    let tokens = tokenize(text);
    let mut parser = Parser::new(text, &tokens);
    let reference = parser.reference(false)?;
    Ok((reference, parser.consumed))
}

/// Scan a full line for references. Malformed candidates are skipped, not
/// reported; scanning is only used for hover and restore helpers.
pub fn find_references(line: &str) -> Vec<LineRef> {
    let mut found = Vec::new();
    let mut at = 0;
    while let Some(rel) = line[at..].find('@') {
        let start = at + rel;
        match parse_reference(&line[start..]) {
            Ok((reference, consumed)) => {
                found.push(LineRef {
                    start,
                    end: start + consumed,
                    reference,
                });
                at = start + consumed;
            }
            Err(_) => at = start + 1,
        }
    }
    found
}

/// Extract the argument map from a call literal, stripping type
/// annotations. Accepts both full references (`@tool.ns.send(...)`) and
/// bare calls (`send(...)`, `ns.send(...)`).
pub fn extract_arguments(literal: &str) -> Result<IndexMap<SmolStr, Value>, RefParseError> {
    let trimmed = literal.trim();
    if trimmed.starts_with('@') {
        let (reference, _) = parse_reference(trimmed)?;
        return Ok(reference.argument_values());
    }
    let tokens = tokenize(trimmed);
    let mut parser = Parser::new(trimmed, &tokens);
    parser.expect(TokenKind::Ident, "call name")?;
    while parser.eat(TokenKind::Dot) {
        parser.expect(TokenKind::Ident, "call name")?;
    }
    let args = parser.argument_list()?;
    Ok(args
        .iter()
        .map(|a| (a.name.clone(), a.value.to_json()))
        .collect())
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token<'a>],
    pos: usize,
    /// Bytes consumed through the last accepted token.
    consumed: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: &'a [Token<'a>]) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            consumed: 0,
        }
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens[self.pos..]
            .iter()
            .find(|t| t.kind != TokenKind::Whitespace)
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        while let Some(t) = self.tokens.get(self.pos) {
            self.pos += 1;
            if t.kind != TokenKind::Whitespace {
                self.consumed = t.offset + t.text.len();
                return Some(*t);
            }
        }
        None
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().map(|t| t.kind) == Some(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token<'a>, RefParseError> {
        match self.peek().copied() {
            Some(t) if t.kind == kind => {
                self.bump();
                Ok(t)
            }
            Some(t) => Err(RefParseError::Expected {
                expected,
                found: t.text.to_string(),
            }),
            None => Err(RefParseError::UnexpectedEnd(expected)),
        }
    }

    fn reference(&mut self, nested: bool) -> Result<Reference, RefParseError> {
        self.expect(TokenKind::At, "`@`")?;
        let keyword = self.expect(TokenKind::Ident, "reference category")?;
        let category = RefCategory::from_keyword(keyword.text)
            .ok_or_else(|| RefParseError::UnknownCategory(keyword.text.into()))?;
        if nested && category.is_invocable() || nested && category == RefCategory::Resource {
            return Err(RefParseError::InvalidNesting);
        }

        self.expect(TokenKind::Dot, "`.`")?;
        let first = self.expect(TokenKind::Ident, "name")?;

        let (namespace, name) = if category.has_namespace() {
            self.expect(TokenKind::Dot, "`.`")?;
            let second = self.expect(TokenKind::Ident, "name")?;
            (Some(SmolStr::from(first.text)), SmolStr::from(second.text))
        } else {
            (None, SmolStr::from(first.text))
        };

        let args = if category.is_invocable() && self.peek().map(|t| t.kind) == Some(TokenKind::LParen)
        {
            Some(self.argument_list()?)
        } else {
            None
        };

        Ok(Reference {
            category,
            namespace,
            name,
            args,
        })
    }

    fn argument_list(&mut self) -> Result<Vec<Argument>, RefParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        if self.eat(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.argument()?);
            if self.eat(TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::RParen, "`)` or `,`")?;
            return Ok(args);
        }
    }

    fn argument(&mut self) -> Result<Argument, RefParseError> {
        let name = self.expect(TokenKind::Ident, "argument name")?;
        let ty = if self.eat(TokenKind::Colon) {
            Some(self.type_annotation()?)
        } else {
            None
        };
        self.expect(TokenKind::Eq, "`=`")?;
        let value = self.literal()?;
        Ok(Argument {
            name: name.text.into(),
            ty,
            value,
        })
    }

    fn type_annotation(&mut self) -> Result<SmolStr, RefParseError> {
        if self.eat(TokenKind::LBracket) {
            let inner = self.expect(TokenKind::Ident, "item type")?;
            self.expect(TokenKind::RBracket, "`]`")?;
            return Ok(SmolStr::from(format!("[{}]", inner.text)));
        }
        let ty = self.expect(TokenKind::Ident, "type name")?;
        Ok(ty.text.into())
    }

    fn literal(&mut self) -> Result<ArgValue, RefParseError> {
        let token = *self.peek().ok_or(RefParseError::UnexpectedEnd("literal"))?;
        match token.kind {
            TokenKind::String | TokenKind::Number => {
                self.bump();
                serde_json::from_str(token.text)
                    .map(ArgValue::Json)
                    .map_err(|e| RefParseError::InvalidLiteral(e.to_string()))
            }
            TokenKind::Ident => match token.text {
                "true" => {
                    self.bump();
                    Ok(ArgValue::Json(Value::Bool(true)))
                }
                "false" => {
                    self.bump();
                    Ok(ArgValue::Json(Value::Bool(false)))
                }
                "null" => {
                    self.bump();
                    Ok(ArgValue::Json(Value::Null))
                }
                other => Err(RefParseError::Expected {
                    expected: "literal",
                    found: other.to_string(),
                }),
            },
            TokenKind::LBracket => self.json_array(),
            TokenKind::At => {
                let reference = self.reference(true)?;
                Ok(ArgValue::Ref(Box::new(reference)))
            }
            _ => Err(RefParseError::Expected {
                expected: "literal",
                found: token.text.to_string(),
            }),
        }
    }

    /// Capture the source slice of a balanced `[...]` region and hand it to
    /// serde_json, rather than re-implementing JSON in the token stream.
    fn json_array(&mut self) -> Result<ArgValue, RefParseError> {
        let open = self.expect(TokenKind::LBracket, "`[`")?;
        let mut depth = 1usize;
        let mut end = open.offset + open.text.len();
        while depth > 0 {
            let token = self
                .bump()
                .ok_or(RefParseError::UnexpectedEnd("`]`"))?;
            match token.kind {
                TokenKind::LBracket => depth += 1,
                TokenKind::RBracket => depth -= 1,
                _ => {}
            }
            end = token.offset + token.text.len();
        }
        let slice = &self.source[open.offset..end];
        serde_json::from_str(slice)
            .map(ArgValue::Json)
            .map_err(|e| RefParseError::InvalidLiteral(e.to_string()))
    }
}
