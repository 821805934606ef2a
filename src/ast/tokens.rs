use std::fmt;

use crate::error::Position;

/// What a [`Token`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Node name, bare or quoted
    ///
    /// # Examples
    /// ```text
    /// foo
    /// "name:with:colons"
    /// @"multi
    /// line"
    /// ```
    Name,

    /// The `:` between name, type and value
    Separator,

    /// Type tag, a bare word followed by another separator
    ///
    /// # Examples
    /// ```text
    /// foo:int:5      // `int`
    /// bar:x:../*     // `x`
    /// ```
    Type,

    /// Value, bare (trimmed) or quoted
    ///
    /// # Examples
    /// ```text
    /// foo:howdy      // `howdy`
    /// foo:int:5      // `5`
    /// foo:           // empty string
    /// ```
    Value,

    /// Indentation in front of a name or comment, always a multiple of 3
    Space,

    /// End of a line
    LineBreak,

    /// `// text`, trimmed
    LineComment,

    /// `/* text */`, each line stripped of leading spaces and asterisks
    BlockComment,
}

/// A piece of Hyperlambda source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Where the token starts
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Name | TokenKind::Type | TokenKind::Value => write!(f, "{}", self.text),
            TokenKind::Separator => write!(f, ":"),
            TokenKind::Space => write!(f, "{}", self.text),
            TokenKind::LineBreak => write!(f, "\\r\\n"),
            TokenKind::LineComment => write!(f, "// {}", self.text),
            TokenKind::BlockComment => write!(f, "/* {} */", self.text),
        }
    }
}
