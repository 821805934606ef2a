//! CLI support for hyperlambda
//!
//! Provides programmatic access to the `hl` commands for embedding in other
//! tools.

mod check;
mod convert;

pub use check::{CheckOptions, CheckResult, EvalOptions, execute_check, execute_eval, list_types};
pub use convert::{json_to_lambda, lambda_to_json, node_to_json};

use std::io;

use thiserror::Error;

use crate::HyperlambdaError;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Tokenizer, parser, conversion or evaluation error
    #[error(transparent)]
    Hyperlambda(#[from] HyperlambdaError),

    /// JSON parsing error
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON that parses but does not describe nodes
    #[error("Invalid node JSON: {0}")]
    NodeShape(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No input provided
    #[error("No input provided. Use --input or pipe Hyperlambda to stdin.")]
    NoInput,
}
