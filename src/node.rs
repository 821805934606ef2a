//! The node tree.
//!
//! A [`Lambda`] owns every node it creates in a flat arena and hands out
//! [`NodeId`] handles. Structure lives in the slots (parent link plus ordered
//! child list), so moving a node between parents never copies its subtree.
//!
//! # Examples
//!
//! ```
//! use hyperlambda::{Lambda, Value};
//!
//! let mut lambda = Lambda::new();
//! let foo = lambda.create("foo", None);
//! let bar = lambda.create("bar", Some(Value::Int(5)));
//! lambda.add(lambda.root(), foo);
//! lambda.add(foo, bar);
//!
//! assert_eq!(lambda.parent(bar), Some(foo));
//! assert_eq!(lambda.get::<i32>(bar).unwrap(), 5);
//! ```

use tracing::trace;

use crate::{
    error::{HyperlambdaError, Result},
    evaluator::Evaluator,
    output::HyperlambdaPrinter,
    types::TypeRegistry,
    value::{FromValue, Value},
};

/// Handle to a node inside the [`Lambda`] that created it.
///
/// Handles are only meaningful for their own arena; using one with another
/// `Lambda` addresses an unrelated node or panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    value: Option<Value>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// Arena of nodes with a synthetic root.
///
/// Parsing puts the top level siblings of a document under [`Lambda::root`].
/// Nodes created with [`Lambda::create`] start out detached and become part of
/// a tree once added somewhere. Slots are never reclaimed: a node that is
/// untied or cleared away keeps its slot for the lifetime of the arena.
#[derive(Debug, Clone)]
pub struct Lambda {
    slots: Vec<Slot>,
    root: NodeId,
}

impl Default for Lambda {
    fn default() -> Self {
        Self::new()
    }
}

impl Lambda {
    pub fn new() -> Self {
        let mut lambda = Lambda {
            slots: Vec::new(),
            root: NodeId(0),
        };
        lambda.root = lambda.create("", None);
        lambda
    }

    /// The synthetic container of the document's top level nodes.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever created in this arena, detached ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the synthetic root has no children.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Create a detached node.
    pub fn create(&mut self, name: impl Into<String>, value: Option<Value>) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            name: name.into(),
            value,
            children: Vec::new(),
            parent: None,
        });
        id
    }

    /// Create a detached node and move `children` into it.
    pub fn create_with_children(
        &mut self,
        name: impl Into<String>,
        value: Option<Value>,
        children: impl IntoIterator<Item = NodeId>,
    ) -> NodeId {
        let id = self.create(name, value);
        self.add_range(id, children);
        id
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.slots[id.0].name
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) {
        self.slots[id.0].name = name.into();
    }

    pub fn value(&self, id: NodeId) -> Option<&Value> {
        self.slots[id.0].value.as_ref()
    }

    pub fn set_value(&mut self, id: NodeId, value: impl Into<Option<Value>>) {
        self.slots[id.0].value = value.into();
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.0].parent
    }

    /// Previous sibling, `None` for the first child or a detached node.
    pub fn previous(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, index) = self.position(id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    /// Next sibling, `None` for the last child or a detached node.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, index) = self.position(id)?;
        siblings.get(index + 1).copied()
    }

    /// Top most ancestor of `id`, which is `id` itself when detached.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// `id` followed by all its descendants, pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        result
    }

    /// True when `id` is `ancestor` or sits somewhere below it.
    fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    fn position(&self, id: NodeId) -> Option<(&[NodeId], usize)> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        Some((siblings, index))
    }

    /// Append `child` to `parent`, detaching it from its previous parent.
    ///
    /// Adding a node below itself would close a cycle and is ignored.
    pub fn add(&mut self, parent: NodeId, child: NodeId) {
        if self.is_within(parent, child) {
            trace!(parent = parent.0, child = child.0, "refusing to add a node below itself");
            return;
        }
        self.untie(child);
        self.slots[parent.0].children.push(child);
        self.slots[child.0].parent = Some(parent);
    }

    /// Move `nodes` into `parent` in order.
    pub fn add_range(&mut self, parent: NodeId, nodes: impl IntoIterator<Item = NodeId>) {
        for node in nodes {
            self.add(parent, node);
        }
    }

    /// Splice `node` in right before `sibling`.
    ///
    /// When `sibling` is detached there is no list to splice into and `node`
    /// is only detached.
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) {
        self.splice(sibling, node, 0);
    }

    /// Splice `node` in right after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) {
        self.splice(sibling, node, 1);
    }

    fn splice(&mut self, sibling: NodeId, node: NodeId, offset: usize) {
        if self.is_within(sibling, node) {
            return;
        }
        self.untie(node);
        let Some(parent) = self.parent(sibling) else {
            return;
        };
        let Some(index) = self.slots[parent.0].children.iter().position(|&c| c == sibling) else {
            return;
        };
        self.slots[parent.0].children.insert(index + offset, node);
        self.slots[node.0].parent = Some(parent);
    }

    /// Detach `id` from its parent. Its own children stay with it.
    pub fn untie(&mut self, id: NodeId) {
        if let Some(parent) = self.slots[id.0].parent.take() {
            self.slots[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Detach every child of `id`. The children survive as detached nodes.
    pub fn clear(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.slots[id.0].children);
        for child in children {
            self.slots[child.0].parent = None;
        }
    }

    /// Value of `id` coerced to `T`, without evaluating expressions.
    pub fn get<T: FromValue>(&self, id: NodeId) -> Result<T> {
        match self.value(id) {
            Some(value) => T::from_value(value),
            None => T::from_null(),
        }
    }

    /// Value of `id` coerced to `T`, following expressions.
    ///
    /// An expression value is evaluated with `id` as identity. No result
    /// yields `T::default()`, one result is read the same way in turn, more
    /// than one is an error. Coming back to a node already followed fails
    /// with `CircularExpression`.
    pub fn get_ex<T: FromValue + Default>(&self, id: NodeId, registry: &TypeRegistry) -> Result<T> {
        let evaluator = Evaluator::new(self, registry);
        let mut followed = Vec::new();
        let mut current = id;
        while let Some(Value::Expression(expression)) = self.value(current) {
            if followed.contains(&current) {
                return Err(HyperlambdaError::CircularExpression {
                    expression: expression.to_string(),
                });
            }
            followed.push(current);
            let result = evaluator.evaluate(expression, current)?;
            current = match result.as_slice() {
                [] => return Ok(T::default()),
                [single] => *single,
                _ => {
                    return Err(HyperlambdaError::MultipleResults {
                        expression: expression.to_string(),
                    });
                }
            };
        }
        self.get(current)
    }

    /// Evaluate the expression stored as the value of `id`, with `id` as identity.
    pub fn evaluate(&self, id: NodeId, registry: &TypeRegistry) -> Result<Vec<NodeId>> {
        match self.value(id) {
            Some(Value::Expression(expression)) => Evaluator::new(self, registry).evaluate(expression, id),
            _ => Err(HyperlambdaError::NotAnExpression(self.name(id).to_string())),
        }
    }

    /// Copy `id` and its subtree into new detached nodes.
    ///
    /// Nested tree values are copied as well, so the clone shares nothing
    /// with the original.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let value = match self.value(id) {
            Some(Value::Node(nested)) => {
                let nested = *nested;
                Some(Value::Node(self.deep_clone(nested)))
            }
            other => other.cloned(),
        };
        let name = self.name(id).to_string();
        let copy = self.create(name, value);
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.add(copy, child_copy);
        }
        trace!(source = id.0, copy = copy.0, "cloned subtree");
        copy
    }

    /// Compare names, values and children recursively.
    ///
    /// `other` may be a different arena. Nested tree values compare by
    /// structure rather than by handle.
    pub fn structurally_equal(&self, a: NodeId, other: &Lambda, b: NodeId) -> bool {
        if self.name(a) != other.name(b) {
            return false;
        }
        let values_equal = match (self.value(a), other.value(b)) {
            (None, None) => true,
            (Some(Value::Node(x)), Some(Value::Node(y))) => self.structurally_equal(*x, other, *y),
            (Some(x), Some(y)) => x == y,
            _ => false,
        };
        if !values_equal {
            return false;
        }
        let (left, right) = (self.children(a), other.children(b));
        left.len() == right.len()
            && left
                .iter()
                .zip(right)
                .all(|(&x, &y)| self.structurally_equal(x, other, y))
    }

    /// Hyperlambda for `id` and its children, `id` at indentation level zero.
    pub fn to_hyperlambda(&self, id: NodeId, registry: &TypeRegistry) -> String {
        HyperlambdaPrinter::new(self, registry).print_nodes(&[id])
    }
}
