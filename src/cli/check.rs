//! Parse, canonicalise and query Hyperlambda input

use tracing::debug;

use super::{CliError, json_to_lambda, lambda_to_json, node_to_json};
use crate::{Evaluator, Expression, HyperlambdaPrinter, Parser, TypeRegistry};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Hyperlambda input
    pub input: Option<String>,
    /// Keep comments as `..` nodes and write them back as comments
    pub comments: bool,
    /// Only validate syntax, don't print anything back
    pub syntax_only: bool,
    /// Print the JSON projection instead of Hyperlambda
    pub json: bool,
    /// The input is the JSON projection of a document rather than Hyperlambda
    pub from_json: bool,
}

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// The expression to evaluate against the document root
    pub expression: String,
    /// Hyperlambda input
    pub input: Option<String>,
    /// Print the result nodes as JSON
    pub json: bool,
}

/// Result of a check or eval operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Canonical Hyperlambda
    Hyperlambda(String),
    /// JSON projection
    Json(serde_json::Value),
}

/// Parse the input and print it back in canonical form
pub fn execute_check(options: &CheckOptions, registry: &TypeRegistry) -> Result<CheckResult, CliError> {
    let source = options.input.as_ref().ok_or(CliError::NoInput)?;

    let lambda = if options.from_json {
        let json: serde_json::Value = serde_json::from_str(source)?;
        json_to_lambda(&json, registry)?
    } else {
        let mut parser = Parser::new(registry);
        if options.comments {
            parser = parser.with_comments();
        }
        parser.parse(source)?
    };
    debug!(nodes = lambda.len(), "checked input");

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }
    if options.json {
        return Ok(CheckResult::Json(lambda_to_json(&lambda, registry)));
    }

    let mut printer = HyperlambdaPrinter::new(&lambda, registry);
    if options.comments {
        printer = printer.with_comments();
    }
    Ok(CheckResult::Hyperlambda(printer.print()))
}

/// Evaluate an expression with the document root as identity node
pub fn execute_eval(options: &EvalOptions, registry: &TypeRegistry) -> Result<CheckResult, CliError> {
    let expression: Expression = options.expression.parse()?;
    let source = options.input.as_ref().ok_or(CliError::NoInput)?;
    let lambda = Parser::new(registry).parse(source)?;

    let result = Evaluator::new(&lambda, registry).evaluate(&expression, lambda.root())?;
    debug!(expression = %expression, results = result.len(), "evaluated expression");

    if options.json {
        let nodes = result
            .iter()
            .map(|&node| node_to_json(&lambda, node, registry))
            .collect();
        return Ok(CheckResult::Json(serde_json::Value::Array(nodes)));
    }
    Ok(CheckResult::Hyperlambda(
        HyperlambdaPrinter::new(&lambda, registry).print_nodes(&result),
    ))
}

/// Every type tag the registry can read
pub fn list_types(registry: &TypeRegistry) -> Vec<String> {
    registry.types()
}
