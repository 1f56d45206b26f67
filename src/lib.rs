//! # tagq - tag query engine
//!
//! A small query language and cost-based evaluator for boolean tag search
//! over a document index, such as a photo collection tagged with free-form
//! labels and typed attributes like `year:2011`.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`index`] - The [`Index`] trait the engine queries, plus [`MemoryIndex`]
//! - [`query`] - Tokenizing, rewriting, parsing, costing and evaluation
//! - [`error`] - Syntax and type errors
//!
//! ## Query language
//!
//! - tags: `germany` matches fuzzily, `^germany$` exactly
//! - typed tags: `year:2011` matches exactly, `year<2011`, `year>=2004`,
//!   `year==2011` compare numerically
//! - booleans: `&&`, `||`, `!`, grouped with parentheses
//! - quoted text (`"new york"`) is a single tag
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use tagq::{create_query, evaluate, Document, MemoryIndex};
//!
//! let index = Arc::new(MemoryIndex::new(vec![
//!     Document::new(1).with_tag("germany").with_attribute("year", "2011"),
//!     Document::new(2).with_tag("france").with_attribute("year", "2011"),
//! ]));
//!
//! let tree = create_query("year:2011 && !germany").unwrap();
//! let ids: Vec<u64> = evaluate(&tree, index).unwrap().collect();
//! assert_eq!(ids, vec![2]);
//! ```
//!
//! ## Evaluation
//!
//! Every node is costed against the index before it runs. An AND drains
//! its cheaper side first, then runs the other side against an index
//! filtered down to those documents. Results stream out of background
//! producer threads as a [`ResultStream`]; an OR may yield a document
//! twice when both sides match it.

pub mod error;
pub mod index;
pub mod query;

pub use error::{QueryError, Result};
pub use index::{Document, IdSet, Index, MemoryIndex, ResultIdentifier, TypedResult};
pub use query::{
    CancellationToken, CompareOp, EvalOptions, Query, QueryNode, ResultStream, TokenReplacement,
    create_query, evaluate, evaluate_with,
};
