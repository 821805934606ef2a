use std::{fmt, str::FromStr};

use crate::{
    ast::PathIterator,
    error::{HyperlambdaError, Result},
    lexer::read_quoted_prefix,
};

/// A compiled path query: `/` separated segments, each one a [`PathIterator`].
///
/// A segment that starts with a double quote is read as a string literal, so
/// it may contain `/`.
///
/// # Examples
///
/// ```
/// use hyperlambda::ast::{Expression, PathIterator};
///
/// let expr: Expression = r#"../*/"a/b"/[0,1]"#.parse().unwrap();
/// assert_eq!(
///     expr.iterators(),
///     &[
///         PathIterator::Root,
///         PathIterator::Children,
///         PathIterator::Name("a/b".to_string()),
///         PathIterator::Subscript { start: 0, count: 1 },
///     ]
/// );
/// assert_eq!(expr.to_string(), r#"../*/"a/b"/[0,1]"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    iterators: Vec<PathIterator>,
}

impl Expression {
    pub fn new(iterators: Vec<PathIterator>) -> Self {
        Expression { iterators }
    }

    pub fn parse(source: &str) -> Result<Self> {
        split_segments(source)?
            .iter()
            .map(|segment| PathIterator::parse(segment))
            .collect::<Result<Vec<_>>>()
            .map(Expression::new)
    }

    pub fn iterators(&self) -> &[PathIterator] {
        &self.iterators
    }
}

impl FromStr for Expression {
    type Err = HyperlambdaError;

    fn from_str(s: &str) -> Result<Self> {
        Expression::parse(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, iterator) in self.iterators.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            let segment = iterator.to_string();
            if segment.contains('/') || segment.starts_with('"') {
                write!(f, "\"{}\"", segment.replace('\\', "\\\\").replace('"', "\\\""))?;
            } else {
                write!(f, "{segment}")?;
            }
        }
        Ok(())
    }
}

fn split_segments(source: &str) -> Result<Vec<String>> {
    let chars: Vec<char> = source.chars().collect();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut position = 0;
    while let Some(&ch) = chars.get(position) {
        match ch {
            '/' => {
                segments.push(std::mem::take(&mut current));
                position += 1;
            }
            '"' if current.is_empty() => {
                let rest: String = chars[position..].iter().collect();
                let (content, consumed) = read_quoted_prefix(&rest)?;
                current.push_str(&content);
                position += consumed;
            }
            other => {
                current.push(other);
                position += 1;
            }
        }
    }
    segments.push(current);
    Ok(segments)
}
