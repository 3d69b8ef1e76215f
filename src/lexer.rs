//! Tokenizer for stylesheet text.
//!
//! Turns raw text into a flat, finite token sequence. Every token
//! keeps the exact source substring it came from, so concatenating the
//! raws of a lexed sequence reproduces the input byte-for-byte. The
//! lexer never fails: any character without a token class of its own
//! becomes a delimiter token.

use nom::branch::alt;
use nom::bytes::complete::{tag, take, take_until, take_while1};
use nom::character::complete::{char, digit1, one_of};
use nom::combinator::{opt, recognize, rest};
use nom::error::ErrorKind;
use nom::IResult;
use nom::Parser;
use nom_language::error::{VerboseError, VerboseErrorKind};

use crate::span::{Span, SpanInfo};
use crate::token::{Token, TokenKind};

type LexResult<'a, T> = IResult<Span<'a>, T, VerboseError<Span<'a>>>;

/// Options consumed by the lexer.
///
/// When a toggle is off the corresponding tokens are dropped from the
/// sequence before the parser ever sees them. Both default to `true`;
/// dropping whitespace forfeits verbatim round-trips.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub preserve_comments: bool,
    pub preserve_whitespace: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            preserve_comments: true,
            preserve_whitespace: true,
        }
    }
}

/// Tokenize `input` into a flat token sequence.
pub fn tokenize(input: &str, options: &ParseOptions) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut remaining = Span::new(input);

    while !remaining.fragment().is_empty() {
        match next_token(remaining) {
            Some((rest, token)) => {
                remaining = rest;
                match token.kind {
                    TokenKind::Comment if !options.preserve_comments => {}
                    TokenKind::Whitespace if !options.preserve_whitespace => {}
                    _ => tokens.push(token),
                }
            }
            None => break,
        }
    }

    tokens
}

/// Lex one token off the front of `input`.
///
/// Alternatives are ordered so that multi-character tokens win over
/// the delimiter fallback (`<!--` before `<`, comments before `/`).
fn next_token(input: Span) -> Option<(Span, Token)> {
    if let Ok((rest, token)) = comment(input) {
        return Some((rest, token));
    }
    if let Ok((rest, token)) = whitespace(input) {
        return Some((rest, token));
    }
    if let Ok((rest, token)) = string(input) {
        return Some((rest, token));
    }
    if let Ok((rest, token)) = hash(input) {
        return Some((rest, token));
    }
    if let Ok((rest, token)) = cdo(input) {
        return Some((rest, token));
    }
    if let Ok((rest, token)) = cdc(input) {
        return Some((rest, token));
    }
    if let Ok((rest, token)) = at_keyword(input) {
        return Some((rest, token));
    }
    if let Ok((rest, token)) = numeric(input) {
        return Some((rest, token));
    }
    if let Ok((rest, token)) = ident_like(input) {
        return Some((rest, token));
    }
    if let Ok((rest, token)) = punctuation(input) {
        return Some((rest, token));
    }

    // fallback: a single delimiter character
    let c = input.fragment().chars().next()?;
    let (rest, _) = take::<usize, Span, VerboseError<Span>>(c.len_utf8())
        .parse(input)
        .ok()?;
    Some((rest, token_of(input, rest, TokenKind::Delim(c))))
}

/// Build a token from the range between two spans.
fn token_of(start: Span, end: Span, kind: TokenKind) -> Token {
    let len = end.location_offset() - start.location_offset();
    Token {
        kind,
        raw: start.fragment()[..len].to_string(),
        span: SpanInfo::from_range(start, end),
    }
}

fn lex_error(input: Span) -> nom::Err<VerboseError<Span>> {
    nom::Err::Error(VerboseError {
        errors: vec![(input, VerboseErrorKind::Nom(ErrorKind::Fail))],
    })
}

fn is_whitespace_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c')
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit() || c == '-'
}

/// parse a comment like `/* ... */`; an unterminated comment runs to
/// the end of the input and is still a single comment token
fn comment(input: Span) -> LexResult<Token> {
    let start = input;
    let (input, _) = tag("/*").parse(input)?;
    let (input, _) = alt((recognize((take_until("*/"), tag("*/"))), rest)).parse(input)?;
    Ok((input, token_of(start, input, TokenKind::Comment)))
}

fn whitespace(input: Span) -> LexResult<Token> {
    let start = input;
    let (input, _) = take_while1(is_whitespace_char).parse(input)?;
    Ok((input, token_of(start, input, TokenKind::Whitespace)))
}

/// parse a quoted string; an unterminated string stops at the newline
/// without consuming it
fn string(input: Span) -> LexResult<Token> {
    let start = input;
    let (input, quote) = one_of("\"'").parse(input)?;
    let (len, decoded) = string_contents(input.fragment(), quote);
    let (input, _) = take(len).parse(input)?;
    Ok((input, token_of(start, input, TokenKind::String(decoded))))
}

fn string_contents(s: &str, quote: char) -> (usize, String) {
    let mut decoded = String::new();
    let mut i = 0;

    while let Some(c) = s[i..].chars().next() {
        if c == quote {
            i += c.len_utf8();
            break;
        }
        if matches!(c, '\n' | '\r' | '\x0c') {
            break;
        }
        if c == '\\' {
            let after = &s[i + 1..];
            // escaped newline is a line continuation
            if after.starts_with("\r\n") {
                i += 3;
                continue;
            }
            if after.starts_with('\n') || after.starts_with('\r') || after.starts_with('\x0c') {
                i += 2;
                continue;
            }
            let (ch, consumed) = decode_escape(after);
            if let Some(ch) = ch {
                decoded.push(ch);
            }
            i += 1 + consumed;
            continue;
        }
        decoded.push(c);
        i += c.len_utf8();
    }

    (i, decoded)
}

/// Decode one escape sequence after the backslash. Returns the decoded
/// character and the number of bytes consumed after the backslash.
fn decode_escape(s: &str) -> (Option<char>, usize) {
    let first = match s.chars().next() {
        Some(c) => c,
        None => return (Some(char::REPLACEMENT_CHARACTER), 0),
    };

    if first.is_ascii_hexdigit() {
        let mut value: u32 = 0;
        let mut len = 0;
        for c in s.chars().take(6) {
            match c.to_digit(16) {
                Some(digit) => {
                    value = value * 16 + digit;
                    len += 1;
                }
                None => break,
            }
        }
        // one whitespace character after the hex digits belongs to the escape
        let mut consumed = len;
        let after = &s[consumed..];
        if after.starts_with("\r\n") {
            consumed += 2;
        } else if let Some(ws) = after.chars().next() {
            if is_whitespace_char(ws) {
                consumed += ws.len_utf8();
            }
        }
        let decoded = if value == 0 {
            char::REPLACEMENT_CHARACTER
        } else {
            char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER)
        };
        (Some(decoded), consumed)
    } else {
        (Some(first), first.len_utf8())
    }
}

/// Whether `s` starts an identifier (ident-start character, dashed
/// prefix, or a valid escape).
fn would_start_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => true,
        Some('-') => match chars.next() {
            Some(c) if is_ident_start(c) || c == '-' => true,
            Some('\\') => !s[2..].starts_with('\n'),
            _ => false,
        },
        Some('\\') => !s[1..].starts_with('\n'),
        _ => false,
    }
}

/// Consume and decode an identifier sequence off the front of `s`.
fn ident_sequence_str(s: &str) -> Option<(usize, String)> {
    if !would_start_ident(s) {
        return None;
    }
    ident_chars_str(s)
}

/// Like [`ident_sequence_str`] but without the ident-start requirement
/// (hash tokens accept any identifier characters).
fn ident_chars_str(s: &str) -> Option<(usize, String)> {
    let mut decoded = String::new();
    let mut i = 0;

    while let Some(c) = s[i..].chars().next() {
        if is_ident_char(c) {
            decoded.push(c);
            i += c.len_utf8();
        } else if c == '\\' && !s[i + 1..].starts_with('\n') {
            let (ch, consumed) = decode_escape(&s[i + 1..]);
            if let Some(ch) = ch {
                decoded.push(ch);
            }
            i += 1 + consumed;
        } else {
            break;
        }
    }

    if decoded.is_empty() {
        None
    } else {
        Some((i, decoded))
    }
}

fn hash(input: Span) -> LexResult<Token> {
    let start = input;
    let (input, _) = char('#').parse(input)?;
    match ident_chars_str(input.fragment()) {
        Some((len, decoded)) => {
            let (input, _) = take(len).parse(input)?;
            Ok((input, token_of(start, input, TokenKind::Hash(decoded))))
        }
        None => Err(lex_error(start)),
    }
}

fn cdo(input: Span) -> LexResult<Token> {
    let start = input;
    let (input, _) = tag("<!--").parse(input)?;
    Ok((input, token_of(start, input, TokenKind::Cdo)))
}

fn cdc(input: Span) -> LexResult<Token> {
    let start = input;
    let (input, _) = tag("-->").parse(input)?;
    Ok((input, token_of(start, input, TokenKind::Cdc)))
}

fn at_keyword(input: Span) -> LexResult<Token> {
    let start = input;
    let (input, _) = char('@').parse(input)?;
    match ident_sequence_str(input.fragment()) {
        Some((len, decoded)) => {
            let (input, _) = take(len).parse(input)?;
            Ok((input, token_of(start, input, TokenKind::AtKeyword(decoded))))
        }
        None => Err(lex_error(start)),
    }
}

/// parse a number, percentage, or dimension token
fn numeric(input: Span) -> LexResult<Token> {
    let start = input;
    let (input, number_span) = recognize((
        opt(one_of("+-")),
        alt((
            recognize((digit1, opt((char('.'), digit1)))),
            recognize((char('.'), digit1)),
        )),
        opt(recognize((one_of("eE"), opt(one_of("+-")), digit1))),
    ))
    .parse(start)?;
    let value: f64 = number_span.fragment().parse().unwrap_or_default();

    if let Ok((rest, _)) = char::<Span, VerboseError<Span>>('%').parse(input) {
        return Ok((rest, token_of(start, rest, TokenKind::Percentage(value))));
    }
    if let Some((len, unit)) = ident_sequence_str(input.fragment()) {
        let (rest, _) = take(len).parse(input)?;
        return Ok((rest, token_of(start, rest, TokenKind::Dimension(value, unit))));
    }
    Ok((input, token_of(start, input, TokenKind::Number(value))))
}

/// parse an identifier, a function token, or an unquoted `url(...)`
fn ident_like(input: Span) -> LexResult<Token> {
    let start = input;
    let (len, name) = match ident_sequence_str(input.fragment()) {
        Some(found) => found,
        None => return Err(lex_error(input)),
    };
    let (input, _) = take(len).parse(input)?;

    if input.fragment().starts_with('(') {
        let (input, _) = take(1usize).parse(input)?;
        if name.eq_ignore_ascii_case("url") {
            let interior = input.fragment();
            let after_ws = interior.trim_start_matches(is_whitespace_char);
            // `url(` followed by a quote lexes as an ordinary function
            if !after_ws.starts_with(|c| c == '"' || c == '\'') {
                let (len, value) = url_contents(interior);
                let (input, _) = take(len).parse(input)?;
                return Ok((input, token_of(start, input, TokenKind::Url(value))));
            }
        }
        return Ok((input, token_of(start, input, TokenKind::Function(name))));
    }

    Ok((input, token_of(start, input, TokenKind::Ident(name))))
}

fn url_contents(s: &str) -> (usize, String) {
    let mut decoded = String::new();
    let mut i = 0;

    while let Some(c) = s[i..].chars().next() {
        if c == ')' {
            i += 1;
            break;
        }
        if c == '\\' {
            let (ch, consumed) = decode_escape(&s[i + 1..]);
            if let Some(ch) = ch {
                decoded.push(ch);
            }
            i += 1 + consumed;
            continue;
        }
        decoded.push(c);
        i += c.len_utf8();
    }

    let trimmed = decoded.trim_matches(is_whitespace_char).to_string();
    (i, trimmed)
}

fn punctuation(input: Span) -> LexResult<Token> {
    let start = input;
    let (input, c) = one_of("{}[]():;,").parse(input)?;
    let kind = match c {
        '{' => TokenKind::OpenCurly,
        '}' => TokenKind::CloseCurly,
        '[' => TokenKind::OpenSquare,
        ']' => TokenKind::CloseSquare,
        '(' => TokenKind::OpenParen,
        ')' => TokenKind::CloseParen,
        ':' => TokenKind::Colon,
        ';' => TokenKind::Semicolon,
        _ => TokenKind::Comma,
    };
    Ok((input, token_of(start, input, kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::concat_raw;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input, &ParseOptions::default())
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_roundtrip() {
        let samples = [
            ".a { color: red; }",
            "/* note */ .b::after { content: \"}\" }",
            "@media (min-width: 600px) { .c { width: 50% } }",
            "a[href^=\"https://\"] { background: url(icons/external.png) }",
            "h1 , h2 { margin: -0.5em 10px 1e2pt .25in }",
            "<!-- .d {} -->",
            "/* unterminated",
            "\"unterminated string\nrest",
            "weird \u{1F40D} delims ~~ @ # $",
        ];
        for sample in samples {
            let tokens = tokenize(sample, &ParseOptions::default());
            assert_eq!(concat_raw(&tokens), sample, "lexer must preserve input");
        }
    }

    #[test]
    fn test_basic_kinds() {
        assert_eq!(
            kinds(".a{color:red}"),
            vec![
                TokenKind::Delim('.'),
                TokenKind::Ident("a".to_string()),
                TokenKind::OpenCurly,
                TokenKind::Ident("color".to_string()),
                TokenKind::Colon,
                TokenKind::Ident("red".to_string()),
                TokenKind::CloseCurly,
            ]
        );
    }

    #[test]
    fn test_numeric_forms() {
        assert_eq!(
            kinds("10 1.5 -2 +.5 1e3 50% 12px"),
            vec![
                TokenKind::Number(10.0),
                TokenKind::Whitespace,
                TokenKind::Number(1.5),
                TokenKind::Whitespace,
                TokenKind::Number(-2.0),
                TokenKind::Whitespace,
                TokenKind::Number(0.5),
                TokenKind::Whitespace,
                TokenKind::Number(1000.0),
                TokenKind::Whitespace,
                TokenKind::Percentage(50.0),
                TokenKind::Whitespace,
                TokenKind::Dimension(12.0, "px".to_string()),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b" '\26 x'"#),
            vec![
                TokenKind::String("a\"b".to_string()),
                TokenKind::Whitespace,
                TokenKind::String("&x".to_string()),
            ]
        );
    }

    #[test]
    fn test_ident_escapes_and_custom_properties() {
        assert_eq!(
            kinds(r"\26 B --main-color -webkit-box"),
            vec![
                TokenKind::Ident("&B".to_string()),
                TokenKind::Whitespace,
                TokenKind::Ident("--main-color".to_string()),
                TokenKind::Whitespace,
                TokenKind::Ident("-webkit-box".to_string()),
            ]
        );
    }

    #[test]
    fn test_url_and_function() {
        assert_eq!(
            kinds("url( logo.png ) url(\"a.png\") calc(1px)"),
            vec![
                TokenKind::Url("logo.png".to_string()),
                TokenKind::Whitespace,
                TokenKind::Function("url".to_string()),
                TokenKind::String("a.png".to_string()),
                TokenKind::CloseParen,
                TokenKind::Whitespace,
                TokenKind::Function("calc".to_string()),
                TokenKind::Dimension(1.0, "px".to_string()),
                TokenKind::CloseParen,
            ]
        );
    }

    #[test]
    fn test_url_raw_includes_close_paren() {
        let tokens = tokenize("url(a.png)", &ParseOptions::default());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].raw, "url(a.png)");
    }

    #[test]
    fn test_cdo_cdc_and_at_keyword() {
        assert_eq!(
            kinds("<!--@media-->"),
            vec![
                TokenKind::Cdo,
                TokenKind::AtKeyword("media".to_string()),
                TokenKind::Cdc,
            ]
        );
    }

    #[test]
    fn test_hash_and_bare_delims() {
        assert_eq!(
            kinds("#id # @ ."),
            vec![
                TokenKind::Hash("id".to_string()),
                TokenKind::Whitespace,
                TokenKind::Delim('#'),
                TokenKind::Whitespace,
                TokenKind::Delim('@'),
                TokenKind::Whitespace,
                TokenKind::Delim('.'),
            ]
        );
    }

    #[test]
    fn test_preserve_toggles() {
        let options = ParseOptions {
            preserve_comments: false,
            preserve_whitespace: false,
        };
        assert_eq!(
            tokenize("/* x */ a /* y */ b", &options)
                .into_iter()
                .map(|t| t.kind)
                .collect::<Vec<_>>(),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Ident("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("a\n b", &ParseOptions::default());
        assert_eq!(tokens[0].span.start, 0);
        assert_eq!(tokens[2].span.start, 3);
        assert_eq!(tokens[2].span.start_line, 2);
        assert_eq!(tokens[2].span.start_column, 1);
    }
}
