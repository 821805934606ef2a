//! # Hyperlambda - Syntax
//!
//! This module holds the syntax of both languages this crate reads: the
//! tokens of the Hyperlambda tree format and the compiled form of path
//! expressions.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Tokens produced by the [`Lexer`](crate::Lexer)
//! - **[iterators]** - The segments of an expression
//! - **[expressions]** - Complete expressions, parsing and printing
//!
//! ## Quick Start
//!
//! ```text
//! foo
//!    bar:int:5
//!    howdy:x:../*/foo/*/bar
//! ```
//!
//! The value of `howdy` is an expression. Evaluated with `howdy` as the
//! identity node it starts at the document root, goes to every top level
//! node, keeps the ones named `foo`, goes to their children and keeps the
//! ones named `bar`.
//!
//! ## Core Concepts
//!
//! ### Lines
//!
//! Every line of Hyperlambda is one node, indented 3 spaces per level:
//!
//! ```text
//! name
//! name:value
//! name:type:value
//! ```
//!
//! ### Expressions
//!
//! An expression is evaluated against an identity node. Each segment takes
//! the nodes produced so far and yields a new list:
//!
//! - **Navigation** `*`, `**`, `.`, `..`, `-`, `+`, `#`, `0`
//! - **Filters** `name`, `\name`, `=value`, `{0}`
//! - **Slicing** `[start,count]`
//! - **Lookup** `@name` finds the closest older sibling or ancestor
//!
//! ## Examples
//!
//! ### Children by name
//!
//! ```text
//! ../*/foo/*/bar
//! ```
//!
//! ### Second and third child
//!
//! ```text
//! ../*/foo/*/[1,2]
//! ```
//!
//! ### Names with slashes
//!
//! ```text
//! ../*/"path/to/file"
//! ```
pub mod expressions;
pub mod iterators;
pub mod tokens;

pub use expressions::Expression;
pub use iterators::PathIterator;
pub use tokens::{Token, TokenKind};
