//! Error types for the notation front end.

use std::fmt;

/// An error raised while lexing or parsing a composition.
///
/// Every error is terminal: the parser never recovers and never returns a
/// partial tree.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Illegal character in the input.
    Lex,
    /// Unexpected token (expected-vs-found).
    Syntax,
    /// Unknown name, out-of-range beat, or unsupported duration.
    Semantic,
    /// Two concurrent same-pitch events with intersecting tick ranges.
    Overlap,
}

impl ParseError {
    pub fn lex(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::new(ErrorKind::Lex, message, line, col)
    }

    pub fn syntax(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::new(ErrorKind::Syntax, message, line, col)
    }

    pub fn semantic(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::new(ErrorKind::Semantic, message, line, col)
    }

    pub fn overlap(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::new(ErrorKind::Overlap, message, line, col)
    }

    fn new(kind: ErrorKind, message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            col,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Lex => "lex error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Semantic => "semantic error",
            ErrorKind::Overlap => "overlap error",
        };
        write!(f, "[{}:{}] {kind}: {}", self.line, self.col, self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position_and_kind() {
        let err = ParseError::syntax("found '}', expected number", 3, 7);
        assert_eq!(
            err.to_string(),
            "[3:7] syntax error: found '}', expected number"
        );
    }
}
