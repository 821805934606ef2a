use tracing::debug;

use crate::{
    ast::{Token, TokenKind},
    error::{HyperlambdaError, Position, Result},
    lexer::Lexer,
    node::{Lambda, NodeId},
    types::TypeRegistry,
    value::Value,
};

/// Name of the nodes that hold retained comments.
pub const COMMENT_NODE: &str = "..";

/// Builds a [`Lambda`] from Hyperlambda source.
///
/// # Examples
///
/// ```
/// use hyperlambda::{Parser, TypeRegistry, Value};
///
/// let registry = TypeRegistry::new();
/// let lambda = Parser::new(&registry).parse("foo:int:5").unwrap();
/// let foo = lambda.children(lambda.root())[0];
/// assert_eq!(lambda.name(foo), "foo");
/// assert_eq!(lambda.value(foo), Some(&Value::Int(5)));
/// ```
pub struct Parser<'a> {
    registry: &'a TypeRegistry,
    comments: bool,
}

impl<'a> Parser<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Parser {
            registry,
            comments: false,
        }
    }

    /// Keep comments as `..` nodes instead of dropping them.
    pub fn with_comments(mut self) -> Self {
        self.comments = true;
        self
    }

    pub fn parse(&self, source: &str) -> Result<Lambda> {
        let mut lambda = Lambda::new();
        let root = lambda.root();
        self.parse_into(source, &mut lambda, root)?;
        Ok(lambda)
    }

    /// Parse UTF-8 encoded source.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Lambda> {
        let source = std::str::from_utf8(bytes).map_err(|e| {
            let valid = String::from_utf8_lossy(&bytes[..e.valid_up_to()]);
            let line = valid.matches('\n').count() + 1;
            let column = valid.rsplit('\n').next().map_or(0, |tail| tail.chars().count()) + 1;
            let start = valid.len().saturating_sub(40);
            let context = valid.get(start..).unwrap_or_default().to_string();
            HyperlambdaError::syntax("Invalid UTF-8 in input", Position::new(line, column), context)
        })?;
        self.parse(source)
    }

    /// Parse `source`, appending its top level nodes to `container`.
    pub fn parse_into(&self, source: &str, lambda: &mut Lambda, container: NodeId) -> Result<()> {
        let tokens = Lexer::new(source).tokenize()?;
        let mut builder = TreeBuilder {
            lambda,
            registry: self.registry,
            comments: self.comments,
            container,
            parent: container,
            current: None,
            level: 0,
            pending_type: None,
        };
        let mut previous = TokenKind::LineBreak;
        for token in &tokens {
            builder.accept(token, previous)?;
            previous = token.kind;
        }
        debug!(
            tokens = tokens.len(),
            nodes = builder.lambda.children(container).len(),
            "parsed hyperlambda"
        );
        Ok(())
    }
}

/// Parse with the process wide registry.
pub fn parse(source: &str) -> Result<Lambda> {
    Parser::new(TypeRegistry::global()).parse(source)
}

/// Parse with the process wide registry, keeping comments as `..` nodes.
pub fn parse_with_comments(source: &str) -> Result<Lambda> {
    Parser::new(TypeRegistry::global()).with_comments().parse(source)
}

/// Parse UTF-8 bytes with the process wide registry.
pub fn parse_bytes(bytes: &[u8]) -> Result<Lambda> {
    Parser::new(TypeRegistry::global()).parse_bytes(bytes)
}

/// Parse `source` into a new detached container inside `lambda`.
///
/// This is how `node` typed literals become [`Value::Node`].
pub(crate) fn parse_detached(source: &str, lambda: &mut Lambda, registry: &TypeRegistry) -> Result<NodeId> {
    let container = lambda.create("", None);
    Parser::new(registry).parse_into(source, lambda, container)?;
    Ok(container)
}

struct TreeBuilder<'l, 'r> {
    lambda: &'l mut Lambda,
    registry: &'r TypeRegistry,
    comments: bool,
    container: NodeId,
    parent: NodeId,
    current: Option<NodeId>,
    level: usize,
    pending_type: Option<String>,
}

impl TreeBuilder<'_, '_> {
    fn accept(&mut self, token: &Token, previous: TokenKind) -> Result<()> {
        match token.kind {
            TokenKind::Name => {
                self.reset_after_line_break(previous);
                if self.comments && self.lambda.name(self.parent) == COMMENT_NODE && self.parent != self.container {
                    return Err(self.error(token, "A comment cannot have children"));
                }
                let node = self.lambda.create(token.text.as_str(), None);
                self.lambda.add(self.parent, node);
                self.current = Some(node);
                self.pending_type = None;
            }
            TokenKind::LineComment | TokenKind::BlockComment => {
                if self.comments {
                    self.reset_after_line_break(previous);
                    let node = self.lambda.create(COMMENT_NODE, Some(Value::String(token.text.clone())));
                    self.lambda.add(self.parent, node);
                }
            }
            TokenKind::Separator => {
                if previous == TokenKind::Name
                    && let Some(node) = self.current
                {
                    self.lambda.set_value(node, Value::String(String::new()));
                }
            }
            TokenKind::Type => {
                self.pending_type = Some(token.text.clone());
            }
            TokenKind::Value => {
                if let Some(node) = self.current {
                    let value = match self.pending_type.take() {
                        Some(tag) if !tag.is_empty() => self.registry.to_object(&token.text, &tag, self.lambda)?,
                        _ => Value::String(token.text.clone()),
                    };
                    self.lambda.set_value(node, value);
                }
            }
            TokenKind::Space => self.change_level(token)?,
            TokenKind::LineBreak => {}
        }
        Ok(())
    }

    fn reset_after_line_break(&mut self, previous: TokenKind) {
        if previous == TokenKind::LineBreak {
            self.parent = self.container;
            self.level = 0;
        }
    }

    fn change_level(&mut self, token: &Token) -> Result<()> {
        let new_level = token.text.len() / 3;
        if new_level > self.level + 1 {
            return Err(self.error(token, format!(
                "Indentation jumps from level {} to level {new_level}",
                self.level
            )));
        }
        if new_level == self.level + 1 {
            let Some(&last) = self.lambda.children(self.parent).last() else {
                return Err(self.error(token, "Indented line has no node to belong to"));
            };
            self.parent = last;
            self.level = new_level;
            return Ok(());
        }
        while self.level > new_level {
            let Some(parent) = self.lambda.parent(self.parent) else {
                return Err(self.error(token, "Indentation leaves the document"));
            };
            self.parent = parent;
            self.level -= 1;
        }
        Ok(())
    }

    fn error(&self, token: &Token, message: impl Into<String>) -> HyperlambdaError {
        let context = self
            .current
            .map(|node| self.lambda.name(node).to_string())
            .unwrap_or_default();
        HyperlambdaError::syntax(message, token.position, context)
    }
}
