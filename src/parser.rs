//! Recursive-descent consumption routines over a token scanner.
//!
//! Each routine is a short-lived scan over one lexical region, driven
//! purely by the kind of the next token with one token of lookahead
//! via [`TokenScanner::reconsume`]. Malformed constructs are dropped
//! and parsing continues; reaching eof mid-construct closes whatever
//! was accumulated so far and is never fatal.

use crate::error::{ParseError, Result};
use crate::lexer::{tokenize, ParseOptions};
use crate::node::{matching_bracket, AtRule, Declaration, Function, Node, QualifiedRule, SimpleBlock};
use crate::scanner::TokenScanner;
use crate::token::{Token, TokenKind};

/// Parse a rule list from text without any style-rule post-processing.
///
/// At the top level the legacy HTML comment delimiters `<!--`/`-->`
/// are dropped; in nested contexts they open qualified-rule
/// consumption instead.
pub fn parse_rules(input: &str, options: &ParseOptions, top_level: bool) -> Vec<Node> {
    let mut scanner = TokenScanner::new(tokenize(input, options));
    consume_rules(&mut scanner, top_level)
}

/// Consume a list of rules until eof.
///
/// Comment and whitespace tokens pass through unchanged; a failed
/// rule consumption is omitted from the result and parsing continues.
pub fn consume_rules(scanner: &mut TokenScanner, top_level: bool) -> Vec<Node> {
    let mut rules = Vec::new();
    loop {
        let token = scanner.consume();
        match &token.kind {
            TokenKind::Whitespace | TokenKind::Comment => rules.push(Node::Token(token)),
            TokenKind::Eof => break,
            TokenKind::AtKeyword(_) => {
                scanner.reconsume();
                rules.push(Node::AtRule(consume_at_rule(scanner)));
            }
            TokenKind::Cdo | TokenKind::Cdc => {
                if !top_level {
                    scanner.reconsume();
                    match consume_qualified_rule(scanner) {
                        Ok(rule) => rules.push(Node::QualifiedRule(rule)),
                        Err(error) => log::debug!("dropping malformed rule: {error}"),
                    }
                }
            }
            _ => {
                scanner.reconsume();
                match consume_qualified_rule(scanner) {
                    Ok(rule) => rules.push(Node::QualifiedRule(rule)),
                    Err(error) => log::debug!("dropping malformed rule: {error}"),
                }
            }
        }
    }
    rules
}

/// Consume an at-rule; the next token must be the at-keyword.
///
/// The rule ends at a semicolon, at eof, or after its `{}` block.
pub fn consume_at_rule(scanner: &mut TokenScanner) -> AtRule {
    let mut name = String::new();
    let mut prelude = Vec::new();
    let mut block = None;

    let ((), tokens) = scanner.record(|scanner| {
        let token = scanner.consume();
        if let TokenKind::AtKeyword(keyword) = &token.kind {
            name = keyword.clone();
        }
        loop {
            let token = scanner.consume();
            match &token.kind {
                TokenKind::Comment => {}
                TokenKind::Semicolon | TokenKind::Eof => break,
                TokenKind::OpenCurly => {
                    block = Some(consume_simple_block(scanner));
                    break;
                }
                _ => {
                    scanner.reconsume();
                    if let Some(value) = consume_component_value(scanner) {
                        prelude.push(value);
                    }
                }
            }
        }
    });

    AtRule {
        name,
        prelude,
        block,
        tokens,
    }
}

/// Consume a qualified rule.
///
/// Fails when the scanner is exhausted before a `{` is found; a
/// qualified rule with no block is a parse error.
pub fn consume_qualified_rule(scanner: &mut TokenScanner) -> Result<QualifiedRule> {
    let mut prelude = Vec::new();
    let mut block = None;

    let (result, tokens) = scanner.record(|scanner| loop {
        let token = scanner.consume();
        match &token.kind {
            TokenKind::Eof => break Err(ParseError::RuleWithoutBlock),
            TokenKind::Comment => {}
            TokenKind::OpenCurly => {
                block = Some(consume_simple_block(scanner));
                break Ok(());
            }
            _ => {
                scanner.reconsume();
                if let Some(value) = consume_component_value(scanner) {
                    prelude.push(value);
                }
            }
        }
    });
    result?;

    Ok(QualifiedRule {
        prelude,
        block,
        tokens,
    })
}

/// Consume a simple block; the current token is the opening bracket.
///
/// The matching closer comes from the fixed bracket bijection. The
/// closing token lands in the node's `tokens` but not in its `value`.
pub fn consume_simple_block(scanner: &mut TokenScanner) -> SimpleBlock {
    let open_token = scanner.current().cloned().unwrap_or_else(Token::eof);
    let start = open_token.open_bracket().unwrap_or('{');
    let end = matching_bracket(start).unwrap_or('}');

    let mut value = Vec::new();
    let ((), mut tokens) = scanner.record(|scanner| loop {
        let token = scanner.consume();
        if token.is_eof() || token.close_bracket() == Some(end) {
            break;
        }
        scanner.reconsume();
        if let Some(component) = consume_component_value(scanner) {
            value.push(component);
        }
    });
    tokens.insert(0, open_token);

    SimpleBlock {
        start,
        end,
        value,
        tokens,
    }
}

/// Consume a function; the current token is the function name.
///
/// Content runs to the matching `)` or eof; comments are skipped.
pub fn consume_function(scanner: &mut TokenScanner) -> Function {
    let open_token = scanner.current().cloned().unwrap_or_else(Token::eof);
    let name = match &open_token.kind {
        TokenKind::Function(name) => name.clone(),
        _ => String::new(),
    };

    let mut value = Vec::new();
    let ((), mut tokens) = scanner.record(|scanner| loop {
        let token = scanner.consume();
        match &token.kind {
            TokenKind::Eof | TokenKind::CloseParen => break,
            TokenKind::Comment => {}
            _ => {
                scanner.reconsume();
                if let Some(component) = consume_component_value(scanner) {
                    value.push(component);
                }
            }
        }
    });
    tokens.insert(0, open_token);

    Function {
        name,
        value,
        tokens,
    }
}

/// Consume one component value: a simple block, a function, or a
/// single pass-through token. `None` once the scanner is exhausted.
pub fn consume_component_value(scanner: &mut TokenScanner) -> Option<Node> {
    let token = scanner.consume();
    match &token.kind {
        TokenKind::Eof => None,
        TokenKind::OpenCurly | TokenKind::OpenSquare | TokenKind::OpenParen => {
            Some(Node::SimpleBlock(consume_simple_block(scanner)))
        }
        TokenKind::Function(_) => Some(Node::Function(consume_function(scanner))),
        _ => Some(Node::Token(token)),
    }
}

/// Consume one declaration from a scanner holding exactly the
/// candidate token run.
///
/// The first token must be the property name identifier, followed by
/// optional whitespace and a colon; everything after the colon is the
/// value. The `!important` tail sets the flag but stays in the value.
pub fn consume_declaration(scanner: &mut TokenScanner) -> Result<Declaration> {
    let mut name = String::new();
    let mut value = Vec::new();

    let (result, tokens) = scanner.record(|scanner| {
        let token = scanner.consume();
        match &token.kind {
            TokenKind::Ident(ident) => name = ident.clone(),
            _ => return Err(ParseError::ExpectedPropertyName(token.raw.clone())),
        }
        loop {
            let token = scanner.consume();
            match &token.kind {
                TokenKind::Whitespace => {}
                TokenKind::Colon => break,
                TokenKind::Eof => return Err(ParseError::UnexpectedEof),
                _ => return Err(ParseError::ExpectedColon(token.raw.clone())),
            }
        }
        loop {
            let token = scanner.consume();
            if token.is_eof() {
                break;
            }
            value.push(token);
        }
        Ok(())
    });
    result?;

    let important = is_important(&value);
    Ok(Declaration {
        name,
        value,
        important,
        tokens,
    })
}

/// Whether the last two non-whitespace value tokens are a `!`
/// delimiter followed by a case-insensitive `important` identifier.
fn is_important(value: &[Token]) -> bool {
    let mut tail = value.iter().rev().filter(|token| !token.is_whitespace());
    let last = tail.next();
    let before = tail.next();
    matches!(
        last.map(|token| &token.kind),
        Some(TokenKind::Ident(ident)) if ident.eq_ignore_ascii_case("important")
    ) && matches!(before.map(|token| &token.kind), Some(TokenKind::Delim('!')))
}

/// Consume a declaration list, splitting at semicolon boundaries.
///
/// Comments, whitespace, and semicolons pass through verbatim; nested
/// at-rules are consumed recursively; each identifier-led candidate is
/// parsed in an isolated scanner, and malformed candidates are
/// dropped. Any other leading token discards component values up to
/// the next semicolon.
pub fn consume_declarations(scanner: &mut TokenScanner) -> Vec<Node> {
    let mut nodes = Vec::new();
    loop {
        let token = scanner.consume();
        match &token.kind {
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Semicolon => {
                nodes.push(Node::Token(token))
            }
            TokenKind::Eof => break,
            TokenKind::AtKeyword(_) => {
                scanner.reconsume();
                nodes.push(Node::AtRule(consume_at_rule(scanner)));
            }
            TokenKind::Ident(_) => {
                scanner.reconsume();
                let candidate = collect_candidate(scanner);
                let mut declaration_scanner = TokenScanner::new(candidate);
                match consume_declaration(&mut declaration_scanner) {
                    Ok(declaration) => nodes.push(Node::Declaration(declaration)),
                    Err(error) => log::debug!("dropping malformed declaration: {error}"),
                }
            }
            _ => {
                log::debug!("skipping `{}` up to the next semicolon", token.raw);
                scanner.reconsume();
                loop {
                    let token = scanner.consume();
                    match &token.kind {
                        TokenKind::Semicolon | TokenKind::Eof => {
                            scanner.reconsume();
                            break;
                        }
                        _ => {
                            scanner.reconsume();
                            let _ = consume_component_value(scanner);
                        }
                    }
                }
            }
        }
    }
    nodes
}

/// Collect the verbatim tokens of one declaration candidate, stopping
/// before the next top-level semicolon. Semicolons nested inside
/// blocks or functions stay inside the candidate.
fn collect_candidate(scanner: &mut TokenScanner) -> Vec<Token> {
    let mut candidate = Vec::new();
    loop {
        let token = scanner.consume();
        match &token.kind {
            TokenKind::Semicolon | TokenKind::Eof => {
                scanner.reconsume();
                break;
            }
            _ => {
                scanner.reconsume();
                let (_, tokens) = scanner.record(|scanner| consume_component_value(scanner));
                candidate.extend(tokens);
            }
        }
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::concat_raw;

    fn scanner(input: &str) -> TokenScanner {
        TokenScanner::new(tokenize(input, &ParseOptions::default()))
    }

    #[test]
    fn test_at_rule_without_block() {
        let mut scanner = scanner("@import url(base.css);");
        let rule = consume_at_rule(&mut scanner);
        assert_eq!(rule.name, "import");
        assert!(rule.block.is_none());
        assert_eq!(concat_raw(&rule.tokens), "@import url(base.css);");
    }

    #[test]
    fn test_at_rule_with_block() {
        let mut scanner = scanner("@media (screen) { .a { color: red } } rest");
        let rule = consume_at_rule(&mut scanner);
        assert_eq!(rule.name, "media");
        let block = rule.block.expect("block");
        assert_eq!(block.start, '{');
        assert_eq!(
            concat_raw(&rule.tokens),
            "@media (screen) { .a { color: red } }"
        );
    }

    #[test]
    fn test_qualified_rule_roundtrip() {
        let mut scanner = scanner(".a > .b { color: red }");
        let rule = consume_qualified_rule(&mut scanner).expect("rule");
        assert!(rule.block.is_some());
        assert_eq!(concat_raw(&rule.tokens), ".a > .b { color: red }");
    }

    #[test]
    fn test_qualified_rule_without_block_fails() {
        let mut scanner = scanner(".a > .b");
        assert_eq!(
            consume_qualified_rule(&mut scanner),
            Err(ParseError::RuleWithoutBlock)
        );
    }

    #[test]
    fn test_block_nesting_depth() {
        // the `{}` inside the parens must not close the outer block early
        let mut scanner = scanner("{ a ( b { c } d ) e } rest");
        scanner.consume();
        let block = consume_simple_block(&mut scanner);
        assert_eq!(concat_raw(&block.tokens), "{ a ( b { c } d ) e }");
        let nested = block
            .value
            .iter()
            .find_map(|node| match node {
                Node::SimpleBlock(inner) => Some(inner),
                _ => None,
            })
            .expect("nested paren block");
        assert_eq!(nested.start, '(');
        assert_eq!(concat_raw(&nested.tokens), "( b { c } d )");
    }

    #[test]
    fn test_unclosed_block_ends_at_eof() {
        let mut scanner = scanner("{ a b");
        scanner.consume();
        let block = consume_simple_block(&mut scanner);
        assert_eq!(block.end, '}');
        assert_eq!(concat_raw(&block.tokens), "{ a b");
    }

    #[test]
    fn test_component_value_function() {
        let mut scanner = scanner("calc(1px + 2px) rest");
        let node = consume_component_value(&mut scanner).expect("component value");
        match node {
            Node::Function(function) => {
                assert_eq!(function.name, "calc");
                assert_eq!(concat_raw(&function.tokens), "calc(1px + 2px)");
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_component_value_exhausted() {
        let mut scanner = scanner("");
        assert!(consume_component_value(&mut scanner).is_none());
    }

    #[test]
    fn test_declaration_important_variants() {
        let important = |input: &str| {
            consume_declaration(&mut scanner(input))
                .expect("declaration")
                .important
        };
        assert!(important("color: red !important"));
        assert!(important("color: red ! important"));
        assert!(important("color: red !IMPORTANT"));
        assert!(!important("color: red"));
        assert!(!important("color: red !importantt"));
    }

    #[test]
    fn test_declaration_keeps_value_tokens_verbatim() {
        let declaration =
            consume_declaration(&mut scanner("margin : 0 auto /* x */")).expect("declaration");
        assert_eq!(declaration.name, "margin");
        assert_eq!(concat_raw(&declaration.tokens), "margin : 0 auto /* x */");
        assert_eq!(concat_raw(&declaration.value), " 0 auto /* x */");
    }

    #[test]
    fn test_declaration_errors() {
        assert_eq!(
            consume_declaration(&mut scanner("color red")),
            Err(ParseError::ExpectedColon("red".to_string()))
        );
        assert_eq!(
            consume_declaration(&mut scanner("42: x")),
            Err(ParseError::ExpectedPropertyName("42".to_string()))
        );
        assert_eq!(
            consume_declaration(&mut scanner("color ")),
            Err(ParseError::UnexpectedEof)
        );
    }

    #[test]
    fn test_declarations_recovery() {
        let mut scanner = scanner("width: 10px;; color");
        let nodes = consume_declarations(&mut scanner);
        let declarations: Vec<_> = nodes
            .iter()
            .filter_map(|node| match node {
                Node::Declaration(declaration) => Some(declaration),
                _ => None,
            })
            .collect();
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].name, "width");
        // both semicolons pass through even though the tail is dropped
        assert_eq!(nodes.iter().filter(|n| n.is_semicolon()).count(), 2);
    }

    #[test]
    fn test_declarations_skip_to_semicolon() {
        let mut scanner = scanner("= broken token run; color: red");
        let nodes = consume_declarations(&mut scanner);
        let declarations: Vec<_> = nodes
            .iter()
            .filter_map(|node| match node {
                Node::Declaration(declaration) => Some(declaration),
                _ => None,
            })
            .collect();
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].name, "color");
    }

    #[test]
    fn test_declarations_nested_at_rule() {
        let mut scanner = scanner("a: b; @apply base; c: d");
        let nodes = consume_declarations(&mut scanner);
        assert!(nodes
            .iter()
            .any(|node| matches!(node, Node::AtRule(rule) if rule.name == "apply")));
        assert_eq!(
            nodes
                .iter()
                .filter(|node| matches!(node, Node::Declaration(_)))
                .count(),
            2
        );
    }

    #[test]
    fn test_declaration_candidate_keeps_nested_semicolons() {
        let mut scanner = scanner("grid: [a;b] x; next: y");
        let nodes = consume_declarations(&mut scanner);
        let declarations: Vec<_> = nodes
            .iter()
            .filter_map(|node| match node {
                Node::Declaration(declaration) => Some(declaration),
                _ => None,
            })
            .collect();
        assert_eq!(declarations.len(), 2);
        assert_eq!(concat_raw(&declarations[0].tokens), "grid: [a;b] x");
    }

    #[test]
    fn test_rules_top_level_cdo_cdc() {
        let nodes = parse_rules("<!-- .a {color:red} -->", &ParseOptions::default(), true);
        assert!(!nodes
            .iter()
            .any(|node| matches!(node, Node::Token(t) if matches!(t.kind, TokenKind::Cdo | TokenKind::Cdc))));
        assert_eq!(
            nodes
                .iter()
                .filter(|node| matches!(node, Node::QualifiedRule(_)))
                .count(),
            1
        );
    }

    #[test]
    fn test_rules_nested_cdo_opens_qualified_rule() {
        let nodes = parse_rules("<!-- .a {color:red} -->", &ParseOptions::default(), false);
        let rule = nodes
            .iter()
            .find_map(|node| match node {
                Node::QualifiedRule(rule) => Some(rule),
                _ => None,
            })
            .expect("qualified rule");
        // the CDO token becomes part of the rule prelude
        assert!(concat_raw(&rule.tokens).starts_with("<!--"));
    }

    #[test]
    fn test_rules_roundtrip_via_raw_text() {
        let input = "/* head */ .a { color: red }\n@media (x) { .b {} }\n";
        let nodes = parse_rules(input, &ParseOptions::default(), true);
        let rebuilt: String = nodes.iter().map(Node::raw_text).collect();
        assert_eq!(rebuilt, input);
    }
}
