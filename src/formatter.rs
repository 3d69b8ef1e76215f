//! Serializers that turn nodes back into stylesheet text.
//!
//! [`Formatter`] reproduces source text verbatim: pass-through tokens
//! and recorded token runs emit their raw text, while structural
//! fields (an at-rule's prelude and block, a style rule's children)
//! are always re-serialized from their current values, so client-side
//! mutations show up in the output. [`stringify_inline`] is the
//! declaration-list variant that normalizes whitespace instead.

use crate::node::{Node, Property, SimpleBlock};
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Default)]
pub struct StringifyOptions {
    /// Drop comment tokens from the output.
    pub exclude_comments: bool,
}

/// Serialize nodes with the given options.
pub fn stringify(nodes: &[Node], options: &StringifyOptions) -> String {
    Formatter::with_options(options.clone()).format(nodes)
}

/// Node-kind-dispatched recursive renderer.
pub struct Formatter {
    options: StringifyOptions,
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            options: StringifyOptions::default(),
        }
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: StringifyOptions) -> Self {
        Self { options }
    }

    /// Render a node sequence into a string.
    pub fn format(&self, nodes: &[Node]) -> String {
        let mut output = String::new();
        for node in nodes {
            self.format_node(node, &mut output);
        }
        output
    }

    pub fn format_node(&self, node: &Node, output: &mut String) {
        match node {
            Node::Token(token) => self.format_token(token, output),
            Node::AtRule(rule) => {
                output.push('@');
                output.push_str(&rule.name);
                for value in &rule.prelude {
                    self.format_node(value, output);
                }
                match &rule.block {
                    Some(block) => self.format_block(block, output),
                    None => output.push(';'),
                }
            }
            Node::SimpleBlock(block) => self.format_block(block, output),
            Node::StyleRule(rule) => {
                if rule.selector.tokens.is_empty() {
                    output.push_str(&rule.selector.value);
                } else {
                    self.format_tokens(&rule.selector.tokens, output);
                }
                output.push('{');
                for child in &rule.children {
                    self.format_node(child, output);
                }
                output.push('}');
            }
            Node::Property(property) => self.format_property(property, "", output),
            Node::QualifiedRule(rule) => {
                if rule.tokens.is_empty() {
                    for value in &rule.prelude {
                        self.format_node(value, output);
                    }
                    if let Some(block) = &rule.block {
                        self.format_block(block, output);
                    }
                } else {
                    self.format_tokens(&rule.tokens, output);
                }
            }
            Node::Function(function) => {
                if function.tokens.is_empty() {
                    output.push_str(&function.name);
                    output.push('(');
                    for value in &function.value {
                        self.format_node(value, output);
                    }
                    output.push(')');
                } else {
                    self.format_tokens(&function.tokens, output);
                }
            }
            Node::Declaration(declaration) => {
                if declaration.tokens.is_empty() {
                    output.push_str(&declaration.name);
                    output.push(':');
                    self.format_tokens(&declaration.value, output);
                } else {
                    self.format_tokens(&declaration.tokens, output);
                }
            }
        }
    }

    /// Render a property with a caller-supplied indent prefix.
    pub fn format_property(&self, property: &Property, indent: &str, output: &mut String) {
        output.push_str(indent);
        if property.tokens.is_empty() {
            output.push_str(&property.name);
            output.push_str(": ");
            output.push_str(&property.value);
        } else {
            self.format_tokens(&property.tokens, output);
        }
    }

    /// Blocks serialize from their structural fields, so a freshly
    /// constructed or replaced block renders without any recorded
    /// tokens behind it.
    fn format_block(&self, block: &SimpleBlock, output: &mut String) {
        output.push(block.start);
        for value in &block.value {
            self.format_node(value, output);
        }
        output.push(block.end);
    }

    fn format_token(&self, token: &Token, output: &mut String) {
        if token.is_comment() && self.options.exclude_comments {
            return;
        }
        output.push_str(&token.raw);
    }

    fn format_tokens(&self, tokens: &[Token], output: &mut String) {
        for token in tokens {
            self.format_token(token, output);
        }
    }
}

/// Serialize a declaration list in inline form.
///
/// Whitespace runs collapse to single spaces, space before `:` and
/// `;` is removed, surrounding whitespace is trimmed, and comments
/// stay verbatim.
pub fn stringify_inline(nodes: &[Node]) -> String {
    let mut output = String::new();
    let mut pending_space = false;
    for node in nodes {
        inline_node(node, &mut output, &mut pending_space);
    }
    output
}

fn inline_node(node: &Node, output: &mut String, pending_space: &mut bool) {
    match node {
        Node::Token(token) => inline_token(token, output, pending_space),
        Node::Property(property) if !property.tokens.is_empty() => {
            for token in &property.tokens {
                inline_token(token, output, pending_space);
            }
        }
        Node::Declaration(declaration) if !declaration.tokens.is_empty() => {
            for token in &declaration.tokens {
                inline_token(token, output, pending_space);
            }
        }
        other => {
            if *pending_space && !output.is_empty() {
                output.push(' ');
            }
            *pending_space = false;
            Formatter::new().format_node(other, output);
        }
    }
}

fn inline_token(token: &Token, output: &mut String, pending_space: &mut bool) {
    match &token.kind {
        TokenKind::Whitespace => *pending_space = true,
        TokenKind::Colon | TokenKind::Semicolon => {
            *pending_space = false;
            output.push_str(&token.raw);
        }
        TokenKind::Eof => {}
        _ => {
            if *pending_space && !output.is_empty() {
                output.push(' ');
            }
            *pending_space = false;
            output.push_str(&token.raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::ParseOptions;
    use crate::style::{parse_style_attribute, parse_stylesheet};

    #[test]
    fn test_exclude_comments() {
        let nodes = parse_stylesheet("/* a */ .x { color: red /* b */ }", &ParseOptions::default());
        let options = StringifyOptions {
            exclude_comments: true,
        };
        assert_eq!(stringify(&nodes, &options), " .x { color: red  }");
    }

    #[test]
    fn test_inline_normalization() {
        let nodes = parse_style_attribute("width : 10px ;", &ParseOptions::default());
        assert_eq!(stringify_inline(&nodes), "width: 10px;");
    }

    #[test]
    fn test_inline_preserves_comments() {
        let nodes = parse_style_attribute(
            "width: 10px; /* keep me */ height: 1px",
            &ParseOptions::default(),
        );
        assert_eq!(
            stringify_inline(&nodes),
            "width: 10px; /* keep me */ height: 1px"
        );
    }

    #[test]
    fn test_inline_collapses_runs() {
        let nodes = parse_style_attribute("a:  b   c ; d : e", &ParseOptions::default());
        assert_eq!(stringify_inline(&nodes), "a: b c; d: e");
    }

    #[test]
    fn test_synthesized_property_fallback() {
        let property = Property {
            name: "color".to_string(),
            value: "green".to_string(),
            tokens: Vec::new(),
        };
        assert_eq!(
            stringify(&[Node::Property(property)], &StringifyOptions::default()),
            "color: green"
        );
    }
}
