//! Span and position utilities for tokens.

use nom_locate::LocatedSpan;

/// Input type used by the lexer.
pub type Span<'a> = LocatedSpan<&'a str>;

/// Position information (byte offsets plus line/column numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpanInfo {
    /// Starting byte offset
    pub start: usize,
    /// Ending byte offset (exclusive)
    pub end: usize,
    /// Starting line number (1-based)
    pub start_line: usize,
    /// Starting column number (0-based)
    pub start_column: usize,
    /// Ending line number (1-based)
    pub end_line: usize,
    /// Ending column number (0-based)
    pub end_column: usize,
}

impl SpanInfo {
    /// Create from two lexer spans marking a range.
    pub fn from_range(start_span: Span, end_span: Span) -> Self {
        Self {
            start: start_span.location_offset(),
            end: end_span.location_offset(),
            start_line: start_span.location_line() as usize,
            start_column: start_span.get_column().saturating_sub(1),
            end_line: end_span.location_line() as usize,
            end_column: end_span.get_column().saturating_sub(1),
        }
    }

    /// Zero-width span for synthetic tokens.
    pub fn empty() -> Self {
        Self {
            start: 0,
            end: 0,
            start_line: 1,
            start_column: 0,
            end_line: 1,
            end_column: 0,
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
