//! Style-rule post-processing and high-level parse entry points.
//!
//! The generic parser leaves qualified rules uninterpreted; this
//! module turns them into style rules with a flattened selector and a
//! declaration-list body, and converts declarations into property
//! nodes for tooling. Selector text beyond whitespace-trimmed
//! concatenation is deliberately left unparsed.

use crate::error::Result;
use crate::lexer::{tokenize, ParseOptions};
use crate::node::{Declaration, Node, Property, QualifiedRule, Selector, SimpleBlock, StyleRule};
use crate::parser::{consume_declaration, consume_declarations, parse_rules};
use crate::scanner::TokenScanner;
use crate::token::{concat_raw, Token, TokenKind};

/// Parse a stylesheet into top-level nodes.
///
/// Comments, whitespace, and at-rules pass through; every top-level
/// qualified rule is post-processed into a style rule.
pub fn parse_stylesheet(input: &str, options: &ParseOptions) -> Vec<Node> {
    parse_rules(input, options, true)
        .into_iter()
        .map(|node| match node {
            Node::QualifiedRule(rule) => Node::StyleRule(parse_style_rule(&rule)),
            other => other,
        })
        .collect()
}

/// Parse a bare declaration list, e.g. an inline `style` attribute.
///
/// Returns property nodes interleaved with pass-through comment,
/// whitespace, semicolon, and nested at-rule nodes.
pub fn parse_style_attribute(input: &str, options: &ParseOptions) -> Vec<Node> {
    let mut scanner = TokenScanner::new(tokenize(input, options));
    into_properties(consume_declarations(&mut scanner))
}

/// Parse a single declaration strictly, surfacing the parse error
/// instead of dropping the construct.
///
/// Leading trivia and a trailing semicolon are tolerated.
pub fn parse_declaration(input: &str) -> Result<Declaration> {
    let mut tokens = tokenize(input, &ParseOptions::default());
    while tokens
        .first()
        .map_or(false, |token| token.is_whitespace() || token.is_comment())
    {
        tokens.remove(0);
    }
    while tokens
        .last()
        .map_or(false, |token| token.is_whitespace() || token.is_semicolon())
    {
        tokens.pop();
    }
    let mut scanner = TokenScanner::new(tokens);
    consume_declaration(&mut scanner)
}

/// Post-process a qualified rule into a style rule.
///
/// The block contents run through declaration-list consumption; the
/// selector keeps the verbatim prelude tokens alongside its flattened
/// display text.
pub fn parse_style_rule(rule: &QualifiedRule) -> StyleRule {
    let block_token_count = rule.block.as_ref().map_or(0, |block| block.tokens.len());
    let prelude_len = rule.tokens.len().saturating_sub(block_token_count);
    let selector = Selector {
        value: parse_selector(&rule.prelude),
        tokens: rule.tokens[..prelude_len].to_vec(),
    };

    let children = match &rule.block {
        Some(block) => {
            let mut scanner = TokenScanner::new(block_interior(block));
            into_properties(consume_declarations(&mut scanner))
        }
        None => Vec::new(),
    };

    StyleRule { selector, children }
}

/// The tokens between a block's brackets.
fn block_interior(block: &SimpleBlock) -> Vec<Token> {
    let mut tokens = block.tokens.clone();
    if !tokens.is_empty() {
        tokens.remove(0);
    }
    if tokens
        .last()
        .map_or(false, |token| token.close_bracket().is_some() || token.is_eof())
    {
        tokens.pop();
    }
    tokens
}

/// Convert declaration nodes into property nodes, leaving everything
/// else in place.
fn into_properties(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::Declaration(declaration) => Node::Property(property_from_declaration(declaration)),
            other => other,
        })
        .collect()
}

/// Reduce a declaration to its display strings.
pub fn property_from_declaration(declaration: Declaration) -> Property {
    let value = if declaration.important {
        parse_value(strip_important(&declaration.value))
    } else {
        parse_value(&declaration.value)
    };
    Property {
        name: declaration.name,
        value,
        tokens: declaration.tokens,
    }
}

/// Drop the trailing `! important` tokens from a value run.
fn strip_important(tokens: &[Token]) -> &[Token] {
    let mut end = tokens.len();
    while end > 0 && tokens[end - 1].is_whitespace() {
        end -= 1;
    }
    if end > 0 && matches!(tokens[end - 1].kind, TokenKind::Ident(_)) {
        end -= 1;
    }
    while end > 0 && tokens[end - 1].is_whitespace() {
        end -= 1;
    }
    if end > 0 && matches!(tokens[end - 1].kind, TokenKind::Delim('!')) {
        end -= 1;
    }
    &tokens[..end]
}

/// Flatten a component-value sequence into display text.
///
/// Identifier tokens contribute their decoded text, comments and
/// semicolons are skipped, functions and blocks contribute their
/// verbatim token text, and surrounding whitespace is trimmed.
pub fn parse_selector(nodes: &[Node]) -> String {
    let mut out = String::new();
    flatten_nodes(nodes, &mut out);
    out.trim().to_string()
}

/// Flatten a value token run into display text, same rules as
/// [`parse_selector`].
pub fn parse_value(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        flatten_token(token, &mut out);
    }
    out.trim().to_string()
}

fn flatten_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Token(token) => flatten_token(token, out),
            Node::Function(function) => out.push_str(&concat_raw(&function.tokens)),
            Node::SimpleBlock(block) => out.push_str(&concat_raw(&block.tokens)),
            other => out.push_str(&other.raw_text()),
        }
    }
}

fn flatten_token(token: &Token, out: &mut String) {
    match &token.kind {
        TokenKind::Comment | TokenKind::Semicolon | TokenKind::Eof => {}
        TokenKind::Ident(name) => out.push_str(name),
        _ => out.push_str(&token.raw),
    }
}
