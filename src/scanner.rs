//! Cursor over a token sequence with pushback and recording.

use crate::token::Token;

/// A cursor over an ordered, finite token sequence.
///
/// The scanner supports exactly one token of lookahead: a routine
/// consumes a token, inspects it, and pushes it back with
/// [`reconsume`](Self::reconsume) before delegating to a sub-grammar.
/// Exhaustion is modeled by a synthetic eof token, never by an error,
/// so consumption loops share a uniform "consume until eof" terminal
/// condition.
#[derive(Debug)]
pub struct TokenScanner {
    tokens: Vec<Token>,
    /// Number of tokens consumed so far; `len + 1` once eof has been
    /// returned.
    pos: usize,
    recordings: Vec<Vec<Token>>,
    eof: Token,
}

impl TokenScanner {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            recordings: Vec::new(),
            eof: Token::eof(),
        }
    }

    /// Advance by one token and return it.
    ///
    /// Once the sequence is exhausted this returns the synthetic eof
    /// token, idempotently, no matter how often it is called.
    pub fn consume(&mut self) -> Token {
        let token = if self.pos < self.tokens.len() {
            let token = self.tokens[self.pos].clone();
            self.pos += 1;
            token
        } else {
            // park the cursor one past the end so a reconsume followed
            // by another consume yields eof again
            self.pos = self.tokens.len() + 1;
            self.eof.clone()
        };
        for recording in self.recordings.iter_mut() {
            recording.push(token.clone());
        }
        token
    }

    /// The token last returned by [`consume`](Self::consume), without
    /// advancing. `None` if nothing has been consumed yet.
    pub fn current(&self) -> Option<&Token> {
        if self.pos == 0 {
            None
        } else if self.pos <= self.tokens.len() {
            Some(&self.tokens[self.pos - 1])
        } else {
            Some(&self.eof)
        }
    }

    /// Move the cursor back one position so the next
    /// [`consume`](Self::consume) returns the same token again.
    pub fn reconsume(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    /// Run `operation` while capturing every token any nested
    /// [`consume`](Self::consume) call returns, in consumption order.
    ///
    /// Recordings nest: an inner `record` gets its own list while all
    /// enclosing recordings still receive the same tokens. A token
    /// consumed again after a reconsume is recorded again.
    pub fn record<T>(&mut self, operation: impl FnOnce(&mut Self) -> T) -> (T, Vec<Token>) {
        self.recordings.push(Vec::new());
        let result = operation(self);
        let tokens = self.recordings.pop().unwrap_or_default();
        (result, tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{tokenize, ParseOptions};
    use crate::token::TokenKind;

    fn scanner(input: &str) -> TokenScanner {
        TokenScanner::new(tokenize(input, &ParseOptions::default()))
    }

    #[test]
    fn test_consume_and_current() {
        let mut scanner = scanner("a b");
        assert!(scanner.current().is_none());
        assert_eq!(scanner.consume().raw, "a");
        assert_eq!(scanner.current().map(|t| t.raw.as_str()), Some("a"));
        assert_eq!(scanner.consume().raw, " ");
        assert_eq!(scanner.consume().raw, "b");
    }

    #[test]
    fn test_eof_is_idempotent() {
        let mut scanner = scanner("a");
        scanner.consume();
        assert!(scanner.consume().is_eof());
        assert!(scanner.consume().is_eof());
        assert!(scanner.current().map(Token::is_eof).unwrap_or(false));
        // pushback after eof re-yields eof, not the last real token
        scanner.reconsume();
        assert!(scanner.consume().is_eof());
    }

    #[test]
    fn test_reconsume() {
        let mut scanner = scanner("a b");
        assert_eq!(scanner.consume().raw, "a");
        scanner.reconsume();
        assert_eq!(scanner.consume().raw, "a");
        assert_eq!(scanner.consume().raw, " ");
    }

    #[test]
    fn test_record_nested_lists() {
        let mut scanner = scanner("a b");
        let (inner_tokens, outer_tokens) = scanner.record(|scanner| {
            scanner.consume(); // a
            let ((), inner) = scanner.record(|scanner| {
                scanner.consume(); // space
                scanner.consume(); // b
            });
            inner
        });
        assert_eq!(
            inner_tokens.iter().map(|t| t.raw.as_str()).collect::<Vec<_>>(),
            vec![" ", "b"]
        );
        assert_eq!(
            outer_tokens.iter().map(|t| t.raw.as_str()).collect::<Vec<_>>(),
            vec!["a", " ", "b"]
        );
    }

    #[test]
    fn test_record_counts_reconsumed_tokens_again() {
        let mut scanner = scanner("a");
        let ((), tokens) = scanner.record(|scanner| {
            scanner.consume();
            scanner.reconsume();
            scanner.consume();
        });
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_record_includes_eof() {
        let mut scanner = scanner("");
        let ((), tokens) = scanner.record(|scanner| {
            scanner.consume();
        });
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0].kind, TokenKind::Eof));
    }
}
