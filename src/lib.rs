pub mod ast;
pub mod cli;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod node;
pub mod output;
pub mod parser;
pub mod sync;
pub mod types;
pub mod value;

pub use ast::{Expression, PathIterator, Token, TokenKind};
pub use error::{HyperlambdaError, Position, Result};
pub use evaluator::Evaluator;
pub use lexer::{Lexer, tokenize};
pub use node::{Lambda, NodeId};
pub use output::{HyperlambdaPrinter, to_hyperlambda, to_hyperlambda_with_comments};
pub use parser::{Parser, parse, parse_bytes, parse_with_comments};
pub use sync::Synchronizer;
pub use types::TypeRegistry;
pub use value::{CustomValue, FromValue, Value};
