//! Notation front end — source text → scanner → parser → composition tree.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::Composition;
pub use error::{ErrorKind, ParseError};

use parser::Parser;

/// The notation compiler front end.
pub struct Compiler;

impl Compiler {
    /// Parse source text into a validated composition tree.
    pub fn parse(source: &str) -> Result<Composition, ParseError> {
        Parser::new(source).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_facade_reports_errors() {
        assert!(Compiler::parse("project demo { }").is_ok());
        let err = Compiler::parse("track demo { }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!((err.line, err.col), (1, 1));
    }
}
