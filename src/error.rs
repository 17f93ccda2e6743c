//! Categorized error types for the parser and the mapper (spec §7).
//!
//! Parsing is fail-fast: the first error aborts the parse and no partial
//! AST is returned. Every `ParseError` carries the byte offset of the
//! offending code point; `ParseError::position` turns that into a
//! line/column for display.

use crate::cursor::{self, Position};
use thiserror::Error;

/// Errors raised while lexing or parsing a Confetti document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed UTF-8 at byte offset {offset}")]
    MalformedEncoding { offset: usize },

    #[error("control character U+{codepoint:04X} at byte offset {offset}")]
    ControlCharacter { offset: usize, codepoint: u32 },

    #[error("invalid escape '\\{codepoint}' at byte offset {offset}")]
    BadEscape { offset: usize, codepoint: char },

    #[error("backslash at end of input at byte offset {offset}")]
    EscapeAtEof { offset: usize },

    #[error("line continuation has no following line at byte offset {offset}")]
    DanglingContinuation { offset: usize },

    #[error("unterminated quoted argument starting at byte offset {offset}")]
    UnterminatedQuote { offset: usize },

    #[error("unterminated triple-quoted argument starting at byte offset {offset}")]
    UnterminatedTripleQuote { offset: usize },

    #[error("unterminated block comment starting at byte offset {offset}")]
    UnterminatedComment { offset: usize },

    #[error("unbalanced parentheses in expression argument at byte offset {offset}")]
    UnbalancedExpression { offset: usize },

    #[error("'{{' in argument position at byte offset {offset}")]
    UnexpectedOpeningBrace { offset: usize },

    #[error("unexpected '}}' at byte offset {offset}")]
    UnexpectedClosingBrace { offset: usize },

    #[error("unclosed block at byte offset {offset}")]
    UnclosedBlock { offset: usize },

    #[error("nesting exceeds the maximum depth of {max_depth} at byte offset {offset}")]
    NestingTooDeep { offset: usize, max_depth: usize },
}

impl ParseError {
    /// The byte offset this error was raised at.
    pub fn offset(&self) -> usize {
        match *self {
            ParseError::MalformedEncoding { offset }
            | ParseError::ControlCharacter { offset, .. }
            | ParseError::BadEscape { offset, .. }
            | ParseError::EscapeAtEof { offset }
            | ParseError::DanglingContinuation { offset }
            | ParseError::UnterminatedQuote { offset }
            | ParseError::UnterminatedTripleQuote { offset }
            | ParseError::UnterminatedComment { offset }
            | ParseError::UnbalancedExpression { offset }
            | ParseError::UnexpectedOpeningBrace { offset }
            | ParseError::UnexpectedClosingBrace { offset }
            | ParseError::UnclosedBlock { offset }
            | ParseError::NestingTooDeep { offset, .. } => offset,
        }
    }

    /// Line/column of the error, computed against the original source.
    pub fn position(&self, source: &str) -> Position {
        cursor::position_at(source, self.offset())
    }
}

/// Errors raised while mapping an AST `Directive` to or from a user type
/// (spec §4.5/§4.6, spec §7).
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("directive '{directive}' has an unknown field '{field}'")]
    UnknownField { directive: String, field: String },

    #[error("directive '{directive}' is missing required field '{field}'")]
    MissingField { directive: String, field: String },

    #[error("directive '{directive}' has a duplicate occurrence of field '{field}'")]
    DuplicateField { directive: String, field: String },

    #[error("field '{field}' expected {expected}, found '{found}'")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("field '{field}' has enum value '{value}' outside its declared members")]
    EnumOutOfRange { field: String, value: String },

    #[error("field '{field}' expected a block but the directive has none")]
    ExpectedBlock { field: String },

    #[error("field '{field}' does not take a block, but one was given")]
    UnexpectedBlock { field: String },

    #[error("field '{field}' could not parse scalar value '{value}': {reason}")]
    BadScalar {
        field: String,
        value: String,
        reason: String,
    },

    #[error("expected root directive named '{expected}', found '{found}'")]
    RootMismatch { expected: String, found: String },

    #[error("parse error while loading configuration: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
