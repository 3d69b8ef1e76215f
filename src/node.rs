//! Parse-tree node definitions.
//!
//! Every structural node carries a `tokens` field: the ordered token
//! run consumed while building it. Concatenating those raws reproduces
//! the node's exact source text, even for constructs the grammar does
//! not semantically understand.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::token::{concat_raw, Token};

/// Bracket pairs that open and close simple blocks.
pub const BRACKET_PAIRS: [(char, char); 3] = [('{', '}'), ('[', ']'), ('(', ')')];

/// The closing bracket matching `start`, per the fixed bijection.
pub fn matching_bracket(start: char) -> Option<char> {
    BRACKET_PAIRS
        .iter()
        .find(|(open, _)| *open == start)
        .map(|(_, close)| *close)
}

/// A parse-tree element.
///
/// Tokens without structural meaning (whitespace, comments,
/// semicolons, delimiters, selectors-to-be) pass through unchanged as
/// [`Node::Token`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Node {
    /// Pass-through lexer token
    Token(Token),
    AtRule(AtRule),
    QualifiedRule(QualifiedRule),
    SimpleBlock(SimpleBlock),
    Function(Function),
    Declaration(Declaration),
    StyleRule(StyleRule),
    Property(Property),
}

impl Node {
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Node::Token(token) if token.is_whitespace())
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Node::Token(token) if token.is_comment())
    }

    pub fn is_semicolon(&self) -> bool {
        matches!(self, Node::Token(token) if token.is_semicolon())
    }

    /// Reconstruct this node's source text from its recorded tokens.
    ///
    /// For nodes produced directly by parsing this is exactly the
    /// substring they were built from.
    pub fn raw_text(&self) -> String {
        match self {
            Node::Token(token) => token.raw.clone(),
            Node::AtRule(rule) => concat_raw(&rule.tokens),
            Node::QualifiedRule(rule) => concat_raw(&rule.tokens),
            Node::SimpleBlock(block) => concat_raw(&block.tokens),
            Node::Function(function) => concat_raw(&function.tokens),
            Node::Declaration(declaration) => concat_raw(&declaration.tokens),
            Node::Property(property) => concat_raw(&property.tokens),
            Node::StyleRule(rule) => {
                let mut out = concat_raw(&rule.selector.tokens);
                out.push('{');
                for child in &rule.children {
                    out.push_str(&child.raw_text());
                }
                out.push('}');
                out
            }
        }
    }
}

/// `@name prelude;` or `@name prelude { ... }`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AtRule {
    /// Rule name without the `@`
    pub name: String,
    /// Component values between the name and the block or semicolon
    pub prelude: Vec<Node>,
    pub block: Option<SimpleBlock>,
    pub tokens: Vec<Token>,
}

/// A prelude followed by a mandatory `{}` block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QualifiedRule {
    pub prelude: Vec<Node>,
    pub block: Option<SimpleBlock>,
    pub tokens: Vec<Token>,
}

/// A bracketed region: `{ ... }`, `[ ... ]`, or `( ... )`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimpleBlock {
    pub start: char,
    /// Determined solely by `start` via [`matching_bracket`]
    pub end: char,
    /// Component values found inside the brackets
    pub value: Vec<Node>,
    /// Opening bracket through closing bracket or end of input
    pub tokens: Vec<Token>,
}

/// `name( ... )`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Function {
    pub name: String,
    pub value: Vec<Node>,
    pub tokens: Vec<Token>,
}

/// `name: value`, with the `!important` tail detected but left in
/// place inside `value`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Declaration {
    pub name: String,
    /// Value tokens, interior whitespace and comments included
    pub value: Vec<Token>,
    pub important: bool,
    pub tokens: Vec<Token>,
}

/// Selector of a style rule: flattened text plus the verbatim prelude
/// tokens it came from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Selector {
    /// Trimmed, unescaped display form
    pub value: String,
    pub tokens: Vec<Token>,
}

/// A qualified rule post-processed into selector plus children.
///
/// Children are property nodes interleaved with the pass-through
/// comment, whitespace, semicolon, and nested at-rule nodes found in
/// the block, original order preserved.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StyleRule {
    pub selector: Selector,
    pub children: Vec<Node>,
}

/// A declaration reduced to display strings for tooling.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Property {
    pub name: String,
    /// Trimmed, unescaped value text, `!important` tail excluded
    pub value: String,
    pub tokens: Vec<Token>,
}
