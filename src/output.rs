//! Hyperlambda output for node trees.
//!
//! This module turns a [`Lambda`] (or any list of its nodes) back into
//! canonical Hyperlambda text. Output is deterministic, so generating,
//! parsing and generating again gives the same text.
//!
//! # Format
//!
//! - **Lines** end in `\r\n`, each level of nesting indents by 3 spaces
//! - **Values** are written as `name:value`, or `name:tag:value` for anything
//!   that is not a string
//! - **Quoting** only happens when the bare form would not read back the same:
//!   `@"…"` for text with line breaks, `"…"` for text with colons, quotes or
//!   edge whitespace
//! - **Comments** (`..` nodes) are written as `//` or `/* */` comments when
//!   enabled, and as ordinary nodes otherwise
//!
//! # Examples
//!
//! ```
//! use hyperlambda::output::to_hyperlambda;
//! use hyperlambda::{Lambda, Value};
//!
//! let mut lambda = Lambda::new();
//! let foo = lambda.create("foo", Some(Value::Int(5)));
//! let bar = lambda.create("bar", Some(Value::from("a:b")));
//! lambda.add(lambda.root(), foo);
//! lambda.add(foo, bar);
//!
//! assert_eq!(to_hyperlambda(&lambda), "foo:int:5\r\n   bar:\"a:b\"\r\n");
//! ```

use std::borrow::Cow;

use tracing::debug;

use crate::{
    node::{Lambda, NodeId},
    parser::COMMENT_NODE,
    types::TypeRegistry,
    value::Value,
};

const INDENT: &str = "   ";
const LINE_BREAK: &str = "\r\n";

pub struct HyperlambdaPrinter<'a> {
    lambda: &'a Lambda,
    registry: &'a TypeRegistry,
    comments: bool,
}

impl<'a> HyperlambdaPrinter<'a> {
    pub fn new(lambda: &'a Lambda, registry: &'a TypeRegistry) -> Self {
        HyperlambdaPrinter {
            lambda,
            registry,
            comments: false,
        }
    }

    /// Write `..` nodes as comments.
    pub fn with_comments(mut self) -> Self {
        self.comments = true;
        self
    }

    /// The whole document, meaning the children of the synthetic root.
    pub fn print(&self) -> String {
        let lambda = self.lambda;
        self.print_nodes(lambda.children(lambda.root()))
    }

    /// `nodes` at indentation level zero, followed by their descendants.
    pub fn print_nodes(&self, nodes: &[NodeId]) -> String {
        let mut out = String::new();
        for &node in nodes {
            self.print_node(&mut out, node, 0);
        }
        debug!(nodes = nodes.len(), bytes = out.len(), "generated hyperlambda");
        out
    }

    fn print_node(&self, out: &mut String, id: NodeId, level: usize) {
        if self.comments && self.lambda.name(id) == COMMENT_NODE {
            self.print_comment(out, id, level);
        } else {
            out.push_str(&INDENT.repeat(level));
            self.print_name(out, id);
            if let Some(value) = self.lambda.value(id) {
                self.print_value(out, value);
            }
        }
        out.push_str(LINE_BREAK);
        for &child in self.lambda.children(id) {
            self.print_node(out, child, level + 1);
        }
    }

    fn print_name(&self, out: &mut String, id: NodeId) {
        let name = self.lambda.name(id);
        if name.is_empty() && self.lambda.value(id).is_none() {
            out.push_str("\"\"");
        } else {
            out.push_str(&quote(name, false));
        }
    }

    fn print_value(&self, out: &mut String, value: &Value) {
        let (tag, text) = self.registry.describe(value, self.lambda);
        out.push(':');
        if !tag.is_empty() && tag != "string" {
            out.push_str(&tag);
            out.push(':');
        }
        if text.is_empty() && tag != "string" {
            out.push_str("\"\"");
        } else {
            out.push_str(&quote(&text, true));
        }
    }

    fn print_comment(&self, out: &mut String, id: NodeId, level: usize) {
        let text = match self.lambda.value(id) {
            Some(value) => self.registry.describe(value, self.lambda).1,
            None => String::new(),
        };
        let indent = INDENT.repeat(level);
        let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();

        out.push_str(LINE_BREAK);
        out.push_str(&indent);
        if lines.len() <= 1 {
            out.push_str("// ");
            out.push_str(text.trim());
            return;
        }
        out.push_str("/*");
        out.push_str(LINE_BREAK);
        for line in lines {
            out.push_str(&indent);
            out.push_str(" * ");
            out.push_str(line.trim_end());
            out.push_str(LINE_BREAK);
        }
        out.push_str(&indent);
        out.push_str(" */");
    }
}

/// Quote `text` if its bare form would not read back as the same string.
///
/// Values are also quoted when they contain a `'` anywhere.
fn quote(text: &str, is_value: bool) -> Cow<'_, str> {
    if text.contains('\n') && !has_bare_carriage_return(text) && !has_bare_line_feed(text) {
        return Cow::Owned(format!("@\"{}\"", text.replace('"', "\"\"")));
    }
    let needs_quotes = text.contains([':', '"', '\r', '\n'])
        || text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace)
        || text.starts_with('\'')
        || text.starts_with("//")
        || text.starts_with("/*")
        || text.starts_with("@\"")
        || (is_value && text.contains('\''));
    if !needs_quotes {
        return Cow::Borrowed(text);
    }
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\x000D"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

fn has_bare_carriage_return(text: &str) -> bool {
    text.split("\r\n").any(|part| part.contains('\r'))
}

fn has_bare_line_feed(text: &str) -> bool {
    text.split("\r\n").any(|part| part.contains('\n'))
}

/// Generate the whole document with the process wide registry.
pub fn to_hyperlambda(lambda: &Lambda) -> String {
    HyperlambdaPrinter::new(lambda, TypeRegistry::global()).print()
}

/// Like [`to_hyperlambda`], writing `..` nodes as comments.
pub fn to_hyperlambda_with_comments(lambda: &Lambda) -> String {
    HyperlambdaPrinter::new(lambda, TypeRegistry::global())
        .with_comments()
        .print()
}
