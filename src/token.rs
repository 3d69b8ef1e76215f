//! Token definitions shared by the lexer, scanner, and parser.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::span::SpanInfo;

/// Token kind plus its decoded payload, where one applies.
///
/// Payloads carry the decoded form (escapes resolved, quotes and
/// prefixes stripped); the exact source text always lives in
/// [`Token::raw`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TokenKind {
    /// `/* ... */`, possibly unterminated at end of input
    Comment,
    /// Maximal run of spaces, tabs, and newlines
    Whitespace,
    Ident(String),
    /// Identifier immediately followed by `(`; the raw text includes the `(`
    Function(String),
    /// `@` plus an identifier
    AtKeyword(String),
    /// `#` plus identifier characters
    Hash(String),
    /// Quoted string, payload is the decoded contents
    String(String),
    /// `url(...)` with an unquoted value, payload trimmed of whitespace
    Url(String),
    Number(f64),
    Percentage(f64),
    /// Numeric value plus its unit
    Dimension(f64, String),
    /// Any character with no token class of its own
    Delim(char),
    Colon,
    Semicolon,
    Comma,
    OpenCurly,
    CloseCurly,
    OpenSquare,
    CloseSquare,
    OpenParen,
    CloseParen,
    /// `<!--`
    Cdo,
    /// `-->`
    Cdc,
    /// Synthetic end-of-input marker, produced by the scanner only
    Eof,
}

/// A lexed token: kind, exact source substring, and position.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    pub raw: String,
    pub span: SpanInfo,
}

impl Token {
    /// The synthetic end-of-input token.
    pub fn eof() -> Self {
        Token {
            kind: TokenKind::Eof,
            raw: String::new(),
            span: SpanInfo::empty(),
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::Comment)
    }

    pub fn is_semicolon(&self) -> bool {
        matches!(self.kind, TokenKind::Semicolon)
    }

    /// The bracket character if this token opens a simple block.
    pub fn open_bracket(&self) -> Option<char> {
        match self.kind {
            TokenKind::OpenCurly => Some('{'),
            TokenKind::OpenSquare => Some('['),
            TokenKind::OpenParen => Some('('),
            _ => None,
        }
    }

    /// The bracket character if this token closes a simple block.
    pub fn close_bracket(&self) -> Option<char> {
        match self.kind {
            TokenKind::CloseCurly => Some('}'),
            TokenKind::CloseSquare => Some(']'),
            TokenKind::CloseParen => Some(')'),
            _ => None,
        }
    }
}

/// Concatenate the raw text of a token sequence.
///
/// For any token run recorded during parsing this reproduces the exact
/// source substring the run came from.
pub fn concat_raw(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&token.raw);
    }
    out
}
