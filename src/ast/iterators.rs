use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::error::{HyperlambdaError, Result};

static EXTRAPOLATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\s*(\d+)\s*\}$").expect("valid extrapolation pattern"));

static SUBSCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\s*(\d+)\s*,\s*(\d+)\s*\]$").expect("valid subscript pattern"));

/// One segment of an [`Expression`](crate::ast::Expression).
///
/// Each variant maps a list of input nodes to a list of output nodes; see
/// [`Evaluator`](crate::Evaluator) for the exact semantics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathIterator {
    /// All children of every input node
    ///
    /// # Example
    /// ```text
    /// *
    /// ```
    Children,

    /// The nested tree each input node holds as its value
    ///
    /// # Example
    /// ```text
    /// #
    /// ```
    Dereference,

    /// Previous sibling, wrapping around to the last one
    ///
    /// # Example
    /// ```text
    /// -
    /// ```
    Previous,

    /// Next sibling, wrapping around to the first one
    ///
    /// # Example
    /// ```text
    /// +
    /// ```
    Next,

    /// Parents of the input nodes, without duplicates
    ///
    /// # Example
    /// ```text
    /// .
    /// ```
    Parent,

    /// Top most ancestor of the first input node
    ///
    /// # Example
    /// ```text
    /// ..
    /// ```
    Root,

    /// Input nodes and all their descendants, depth first
    ///
    /// # Example
    /// ```text
    /// **
    /// ```
    Descendants,

    /// Name filter against the value of the identity node's n'th child
    ///
    /// # Example
    /// ```text
    /// {0}
    /// ```
    Extrapolation(usize),

    /// Value filter, comparing string forms
    ///
    /// # Example
    /// ```text
    /// =howdy
    /// ```
    ValueEquals(String),

    /// Skip `start` input nodes and keep the next `count`
    ///
    /// # Example
    /// ```text
    /// [1,2]
    /// ```
    Subscript { start: usize, count: usize },

    /// First older sibling or ancestor with the given name
    ///
    /// # Example
    /// ```text
    /// @.arguments
    /// ```
    Ancestor(String),

    /// Name filter for names that would otherwise parse as something else
    ///
    /// # Example
    /// ```text
    /// \*
    /// ```
    Escaped(String),

    /// The n'th child of every input node
    ///
    /// # Example
    /// ```text
    /// 0
    /// ```
    Child(usize),

    /// Name filter
    ///
    /// # Example
    /// ```text
    /// foo
    /// ```
    Name(String),
}

impl PathIterator {
    /// Compile one segment.
    ///
    /// Only `{…}` and `[…]` segments can fail; anything unrecognised is a name
    /// filter.
    pub fn parse(segment: &str) -> Result<Self> {
        let iterator = match segment {
            "*" => PathIterator::Children,
            "#" => PathIterator::Dereference,
            "-" => PathIterator::Previous,
            "+" => PathIterator::Next,
            "." => PathIterator::Parent,
            ".." => PathIterator::Root,
            "**" => PathIterator::Descendants,
            _ => return Self::parse_parametrized(segment),
        };
        Ok(iterator)
    }

    fn parse_parametrized(segment: &str) -> Result<Self> {
        let invalid = || HyperlambdaError::InvalidIterator(segment.to_string());

        if let Some(name) = segment.strip_prefix('\\') {
            return Ok(PathIterator::Escaped(name.to_string()));
        }
        if segment.starts_with('{') {
            let captures = EXTRAPOLATION.captures(segment).ok_or_else(invalid)?;
            let index = captures[1].parse().map_err(|_| invalid())?;
            return Ok(PathIterator::Extrapolation(index));
        }
        if let Some(literal) = segment.strip_prefix('=') {
            return Ok(PathIterator::ValueEquals(literal.to_string()));
        }
        if segment.starts_with('[') {
            let captures = SUBSCRIPT.captures(segment).ok_or_else(invalid)?;
            let start = captures[1].parse().map_err(|_| invalid())?;
            let count = captures[2].parse().map_err(|_| invalid())?;
            return Ok(PathIterator::Subscript { start, count });
        }
        if let Some(name) = segment.strip_prefix('@') {
            return Ok(PathIterator::Ancestor(name.to_string()));
        }
        if let Ok(index) = segment.parse::<usize>() {
            return Ok(PathIterator::Child(index));
        }
        Ok(PathIterator::Name(segment.to_string()))
    }
}

impl FromStr for PathIterator {
    type Err = HyperlambdaError;

    fn from_str(s: &str) -> Result<Self> {
        PathIterator::parse(s)
    }
}

impl fmt::Display for PathIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathIterator::Children => write!(f, "*"),
            PathIterator::Dereference => write!(f, "#"),
            PathIterator::Previous => write!(f, "-"),
            PathIterator::Next => write!(f, "+"),
            PathIterator::Parent => write!(f, "."),
            PathIterator::Root => write!(f, ".."),
            PathIterator::Descendants => write!(f, "**"),
            PathIterator::Extrapolation(index) => write!(f, "{{{index}}}"),
            PathIterator::ValueEquals(literal) => write!(f, "={literal}"),
            PathIterator::Subscript { start, count } => write!(f, "[{start},{count}]"),
            PathIterator::Ancestor(name) => write!(f, "@{name}"),
            PathIterator::Escaped(name) => write!(f, "\\{name}"),
            PathIterator::Child(index) => write!(f, "{index}"),
            PathIterator::Name(name) => write!(f, "{name}"),
        }
    }
}
