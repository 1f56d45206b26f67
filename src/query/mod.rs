//! Query language: tokenizing, token rewriting, parsing and evaluation.
//!
//! The pipeline is
//!
//! ```text
//! raw string -> tokenize -> replace -> parse -> check -> eval -> ResultStream
//! ```
//!
//! [`Query`] holds the normalized tokens between tokenizing and parsing so
//! callers can apply their own [`TokenReplacement`] rules first.

pub mod cancel;
pub mod executor;
pub mod explain;
pub mod node;
pub mod parser;
pub mod replace;
pub mod tokenizer;

pub use cancel::CancellationToken;
pub use executor::{EvalOptions, ResultStream, evaluate, evaluate_with};
pub use explain::Explain;
pub use node::{CompareOp, QueryNode};
pub use replace::{TokenReplacement, builtin_rules, replace};
pub use tokenizer::tokenize;

use crate::error::Result;
use crate::index::Index;
use std::sync::Arc;

/// A tokenized query, operators already fused, not yet parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    tokens: Vec<String>,
}

impl Query {
    /// Tokenize `input` and fuse the builtin operators (`&&`, `<=`, ...).
    pub fn new(input: &str) -> Result<Self> {
        let tokens = tokenize(input)?;
        Ok(Self {
            tokens: replace(&builtin_rules(), &tokens),
        })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Apply caller-supplied rewrite rules, e.g. query shortcuts.
    pub fn replace(&mut self, rules: &[TokenReplacement]) {
        self.tokens = replace(rules, &self.tokens);
    }

    pub fn parse(&self) -> Result<QueryNode> {
        parser::parse(&self.tokens)
    }

    /// Parse, validate and start evaluating in one step.
    pub fn evaluate(&self, index: Arc<dyn Index>, options: EvalOptions) -> Result<ResultStream> {
        let root = self.parse()?;
        evaluate_with(&root, index, options)
    }
}

/// Parse a query string into an expression tree.
pub fn create_query(input: &str) -> Result<QueryNode> {
    Query::new(input)?.parse()
}
