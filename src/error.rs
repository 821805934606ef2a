use std::fmt;

use thiserror::Error;

/// Line and column (both 1-based) of a character in Hyperlambda source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors produced while tokenizing, parsing, converting or evaluating.
///
/// None of these carry partial results. The caller decides whether an error is
/// shown to a user, retried with corrected input, or fatal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HyperlambdaError {
    /// Malformed Hyperlambda: bad escape, unterminated literal, bad
    /// indentation, bad CR/LF pairing.
    #[error("Syntax error at {position}: {message}\nafter: {context}")]
    Syntax {
        message: String,
        position: Position,
        /// Tail of the text consumed before the fault
        context: String,
    },

    /// Type tag with no registered converter
    #[error("Unknown type declaration '{0}'")]
    UnknownType(String),

    /// Known type tag, but the literal does not decode
    #[error("'{value}' is not a valid {tag}: {reason}")]
    InvalidValue {
        tag: String,
        value: String,
        reason: String,
    },

    /// `get::<T>()` found no coercion from the stored value
    #[error("Type mismatch: cannot read {found} as {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// An expression expected to yield at most one node yielded more
    #[error("Expression '{expression}' yielded multiple results when maximum one was expected")]
    MultipleResults { expression: String },

    /// `#` applied to a node whose value is not a node
    #[error("Cannot dereference '{0}', its value is not a node")]
    NotANode(String),

    /// Following expression values led back to a node already being followed
    #[error("Expression '{expression}' refers back to itself")]
    CircularExpression { expression: String },

    /// `evaluate` called on a node whose value is not an expression
    #[error("Value of '{0}' is not an expression")]
    NotAnExpression(String),

    /// `{n}` applied to an identity node with fewer than `n + 1` children
    #[error("Extrapolation {{{index}}} refers to a child that does not exist")]
    ExtrapolationOutOfRange { index: usize },

    /// Segment of an expression that does not compile
    #[error("Invalid iterator '{0}'")]
    InvalidIterator(String),
}

impl HyperlambdaError {
    pub(crate) fn syntax(message: impl Into<String>, position: Position, context: impl Into<String>) -> Self {
        HyperlambdaError::Syntax {
            message: message.into(),
            position,
            context: context.into(),
        }
    }

    pub(crate) fn invalid_value(tag: &str, value: &str, reason: impl fmt::Display) -> Self {
        HyperlambdaError::InvalidValue {
            tag: tag.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HyperlambdaError>;
