use std::{cell::RefCell, collections::HashSet};

use tracing::trace;

use crate::{
    ast::{Expression, PathIterator},
    error::{HyperlambdaError, Result},
    node::{Lambda, NodeId},
    types::TypeRegistry,
    value::Value,
};

/// Evaluates expressions against the nodes of one [`Lambda`].
///
/// The registry is only needed where values are compared by their string
/// form (`=value` and `{n}`).
pub struct Evaluator<'a> {
    lambda: &'a Lambda,
    registry: &'a TypeRegistry,
    /// Nodes whose expression values are being followed by `stringify`
    following: RefCell<Vec<NodeId>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(lambda: &'a Lambda, registry: &'a TypeRegistry) -> Self {
        Evaluator {
            lambda,
            registry,
            following: RefCell::new(Vec::new()),
        }
    }

    /// Evaluates an expression with `identity` as its starting point.
    ///
    /// Threads the node list through every iterator in turn, stopping early
    /// once the list is empty.
    ///
    /// # Arguments
    ///
    /// * `expression` - The compiled expression
    /// * `identity` - The node the expression is evaluated from, usually the
    ///   node holding the expression as its value
    ///
    /// # Returns
    ///
    /// The resulting nodes in order. Duplicates are possible, for instance
    /// when `-` is applied to two siblings that share a neighbour.
    ///
    /// # Examples
    ///
    /// ```
    /// use hyperlambda::{Evaluator, Parser, TypeRegistry};
    ///
    /// let registry = TypeRegistry::new();
    /// let lambda = Parser::new(&registry)
    ///     .parse("foo\n   bar\n   xxx\n   bar")
    ///     .unwrap();
    /// let foo = lambda.children(lambda.root())[0];
    ///
    /// let expression = "../*/foo/*/bar".parse().unwrap();
    /// let result = Evaluator::new(&lambda, &registry)
    ///     .evaluate(&expression, foo)
    ///     .unwrap();
    /// assert_eq!(result.len(), 2);
    /// assert!(result.iter().all(|&n| lambda.name(n) == "bar"));
    /// ```
    #[tracing::instrument(level = "trace", skip_all, fields(expression = %expression))]
    pub fn evaluate(&self, expression: &Expression, identity: NodeId) -> Result<Vec<NodeId>> {
        let mut result = vec![identity];
        for iterator in expression.iterators() {
            result = self.apply(iterator, identity, &result)?;
            trace!(%iterator, count = result.len(), "applied iterator");
            if result.is_empty() {
                break;
            }
        }
        Ok(result)
    }

    /// Applies a single iterator to `input`.
    pub fn apply(&self, iterator: &PathIterator, identity: NodeId, input: &[NodeId]) -> Result<Vec<NodeId>> {
        let lambda = self.lambda;
        let result: Vec<NodeId> = match iterator {
            PathIterator::Children => input
                .iter()
                .flat_map(|&node| lambda.children(node).iter().copied())
                .collect(),
            PathIterator::Dereference => input
                .iter()
                .map(|&node| match lambda.value(node) {
                    Some(Value::Node(nested)) => Ok(*nested),
                    _ => Err(HyperlambdaError::NotANode(lambda.name(node).to_string())),
                })
                .collect::<Result<_>>()?,
            PathIterator::Previous => input
                .iter()
                .filter_map(|&node| {
                    let parent = lambda.parent(node)?;
                    lambda.previous(node).or_else(|| lambda.children(parent).last().copied())
                })
                .collect(),
            PathIterator::Next => input
                .iter()
                .filter_map(|&node| {
                    let parent = lambda.parent(node)?;
                    lambda.next(node).or_else(|| lambda.children(parent).first().copied())
                })
                .collect(),
            PathIterator::Parent => {
                let mut seen = HashSet::new();
                input
                    .iter()
                    .filter_map(|&node| lambda.parent(node))
                    .filter(|&parent| seen.insert(parent))
                    .collect()
            }
            PathIterator::Root => input.first().map(|&node| lambda.root_of(node)).into_iter().collect(),
            PathIterator::Descendants => input.iter().flat_map(|&node| lambda.descendants(node)).collect(),
            PathIterator::Extrapolation(index) => {
                let Some(&source) = lambda.children(identity).get(*index) else {
                    return Err(HyperlambdaError::ExtrapolationOutOfRange { index: *index });
                };
                let name = self.stringify(source)?;
                self.filter_by_name(input, &name)
            }
            PathIterator::ValueEquals(literal) => input
                .iter()
                .copied()
                .filter(|&node| self.value_equals(node, literal))
                .collect(),
            PathIterator::Subscript { start, count } => input.iter().skip(*start).take(*count).copied().collect(),
            PathIterator::Ancestor(name) => self.find_ancestor(input, name).into_iter().collect(),
            PathIterator::Escaped(name) | PathIterator::Name(name) => self.filter_by_name(input, name),
            PathIterator::Child(index) => input
                .iter()
                .filter_map(|&node| lambda.children(node).get(*index).copied())
                .collect(),
        };
        Ok(result)
    }

    fn filter_by_name(&self, input: &[NodeId], name: &str) -> Vec<NodeId> {
        input
            .iter()
            .copied()
            .filter(|&node| self.lambda.name(node) == name)
            .collect()
    }

    fn value_equals(&self, node: NodeId, literal: &str) -> bool {
        match self.lambda.value(node) {
            None => literal.is_empty(),
            Some(Value::String(s)) => s == literal,
            Some(value) => self.registry.describe(value, self.lambda).1 == literal,
        }
    }

    /// Closest older sibling or ancestor of the first input node named `name`.
    fn find_ancestor(&self, input: &[NodeId], name: &str) -> Option<NodeId> {
        let lambda = self.lambda;
        let step = |node: NodeId| lambda.previous(node).or_else(|| lambda.parent(node));
        let mut current = step(*input.first()?);
        while let Some(node) = current {
            if lambda.name(node) == name {
                return Some(node);
            }
            current = step(node);
        }
        None
    }

    /// String a node stands for when used as an extrapolation source.
    ///
    /// Expression values are followed until they land on a node without one.
    /// Landing on a node that is already being followed is an error.
    fn stringify(&self, node: NodeId) -> Result<String> {
        match self.lambda.value(node) {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Expression(expression)) => {
                if self.following.borrow().contains(&node) {
                    return Err(HyperlambdaError::CircularExpression {
                        expression: expression.to_string(),
                    });
                }
                self.following.borrow_mut().push(node);
                let result = self.follow(expression, node);
                self.following.borrow_mut().pop();
                result
            }
            Some(value) => Ok(self.registry.describe(value, self.lambda).1),
        }
    }

    fn follow(&self, expression: &Expression, node: NodeId) -> Result<String> {
        let result = self.evaluate(expression, node)?;
        match result.as_slice() {
            [] => Ok(String::new()),
            [single] => self.stringify(*single),
            _ => Err(HyperlambdaError::MultipleResults {
                expression: expression.to_string(),
            }),
        }
    }
}
