//! The document store the query engine runs against.
//!
//! The engine only reads from an [`Index`]. Queries are costed first
//! (`cost_*`), then run in the cheapest order the costs suggest
//! (`query_*`). To prune the expensive side of an AND, the engine asks
//! for a filtered view restricted to the documents the cheap side found;
//! `query_*` on such a view is expected to return only those documents.
//!
//! [`MemoryIndex`] is a complete in-memory implementation.

pub mod memory;
pub mod types;

pub use memory::MemoryIndex;
pub use types::*;

use std::sync::Arc;

/// A queryable document store.
///
/// Every method may be called concurrently from several evaluation
/// threads. Costs are relative and only steer evaluation order; they do
/// not have to be exact. Implementations should canonicalize tags so that
/// `Cat` and `cat` find the same documents.
pub trait Index: Send + Sync {
    /// All documents.
    fn query_all(&self) -> Vec<ResultIdentifier>;

    /// Documents carrying exactly this tag.
    fn query_tag_exact(&self, tag: &str) -> Vec<ResultIdentifier>;

    /// Documents carrying this tag or something close to it (think
    /// `LIKE '%tag%'`).
    fn query_tag_fuzzy(&self, tag: &str) -> Vec<ResultIdentifier>;

    /// Every document with a value for the typed attribute `name`,
    /// paired with that value.
    fn query_typed_tags(&self, name: &str) -> Vec<TypedResult>;

    fn cost_tag_exact(&self, tag: &str) -> u64;

    fn cost_tag_fuzzy(&self, tag: &str) -> u64;

    fn cost_typed_tags(&self, name: &str) -> u64;

    fn cost_all(&self) -> u64;

    /// A new, independent view answering the same queries but only for
    /// documents in `filter`.
    fn create_filtered_index(&self, filter: IdSet) -> Arc<dyn Index>;
}
