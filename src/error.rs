use thiserror::Error;

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Local, recoverable parse errors.
///
/// Consumption routines signal a malformed construct by returning one
/// of these; callers drop the construct and keep parsing, so none of
/// them ever aborts a whole parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected a property name, found `{0}`")]
    ExpectedPropertyName(String),
    #[error("expected `:` after property name, found `{0}`")]
    ExpectedColon(String),
    #[error("qualified rule has no block")]
    RuleWithoutBlock,
    #[error("unexpected end of input")]
    UnexpectedEof,
}
