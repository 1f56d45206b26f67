//! In-memory [`Index`] implementation.
//!
//! Tags and attribute names are lowercased on load, and queries are
//! lowercased before matching, so lookups are case-insensitive. Exact
//! tag queries of the form `name:value` also match documents whose typed
//! attribute `name` equals `value` (compared case-insensitively), which is
//! what the `year:2011` query syntax produces.
//!
//! Costs are posting counts taken from per-tag counters built at load
//! time, capped at the number of visible documents.

use super::types::{Document, IdSet, ResultIdentifier, TypedResult};
use super::Index;
use anyhow::{Context, Result};
use memchr::memmem;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// On-disk JSON layout: `{"documents": [...]}`
#[derive(Serialize, Deserialize)]
struct Snapshot {
    documents: Vec<Document>,
}

/// Shared, immutable document table
#[derive(Debug)]
struct Store {
    documents: Vec<Document>,
    /// Number of documents carrying each tag
    tag_counts: FxHashMap<String, u64>,
    /// Number of documents carrying each typed attribute
    attribute_counts: FxHashMap<String, u64>,
}

/// An index held entirely in memory.
///
/// Cloning and filtering are cheap: views share the document table and
/// only differ in their allow-list.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    store: Arc<Store>,
    filter: Option<Arc<IdSet>>,
}

impl MemoryIndex {
    pub fn new(documents: Vec<Document>) -> Self {
        let mut tag_counts: FxHashMap<String, u64> = FxHashMap::default();
        let mut attribute_counts: FxHashMap<String, u64> = FxHashMap::default();

        let documents: Vec<Document> = documents
            .into_iter()
            .map(|doc| {
                let mut tags: Vec<String> = doc.tags.iter().map(|t| t.to_lowercase()).collect();
                tags.sort_unstable();
                tags.dedup();

                let attributes = doc
                    .attributes
                    .into_iter()
                    .map(|(name, value)| (name.to_lowercase(), value))
                    .collect();

                Document {
                    id: doc.id,
                    tags,
                    attributes,
                }
            })
            .collect();

        for doc in &documents {
            for tag in &doc.tags {
                *tag_counts.entry(tag.clone()).or_default() += 1;
            }
            for name in doc.attributes.keys() {
                *attribute_counts.entry(name.clone()).or_default() += 1;
            }
        }

        Self {
            store: Arc::new(Store {
                documents,
                tag_counts,
                attribute_counts,
            }),
            filter: None,
        }
    }

    /// Load from a JSON document of the form `{"documents": [...]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(json).context("Failed to parse index JSON")?;
        Ok(Self::new(snapshot.documents))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read index file {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Invalid index file {}", path.display()))
    }

    /// Serialize the visible documents back to the JSON layout.
    pub fn to_json_string(&self) -> Result<String> {
        let snapshot = Snapshot {
            documents: self.documents().cloned().collect(),
        };
        serde_json::to_string(&snapshot).context("Failed to serialize index")
    }

    /// Documents visible through this view, in load order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.store
            .documents
            .iter()
            .filter(move |doc| self.is_visible(doc.id))
    }

    /// Number of documents visible through this view
    pub fn len(&self) -> usize {
        self.documents().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_visible(&self, id: ResultIdentifier) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter.contains(id))
    }

    /// Upper bound on what any query against this view can return
    fn visible_bound(&self) -> u64 {
        let total = self.store.documents.len() as u64;
        match &self.filter {
            Some(filter) => filter.len().min(total),
            None => total,
        }
    }

    fn matching_ids<F>(&self, predicate: F) -> Vec<ResultIdentifier>
    where
        F: Fn(&Document) -> bool + Sync,
    {
        self.store
            .documents
            .par_iter()
            .filter(|doc| self.is_visible(doc.id) && predicate(doc))
            .map(|doc| doc.id)
            .collect()
    }
}

/// `tag` must already be lowercased. Attribute values keep their case in
/// the store, so they are lowercased for the comparison.
fn matches_exact(doc: &Document, tag: &str) -> bool {
    if doc.tags.iter().any(|t| t == tag) {
        return true;
    }
    match tag.split_once(':') {
        Some((name, value)) => doc
            .attributes
            .get(name)
            .is_some_and(|v| v.to_lowercase() == value),
        None => false,
    }
}

impl Index for MemoryIndex {
    fn query_all(&self) -> Vec<ResultIdentifier> {
        self.documents().map(|doc| doc.id).collect()
    }

    fn query_tag_exact(&self, tag: &str) -> Vec<ResultIdentifier> {
        let tag = tag.to_lowercase();
        self.matching_ids(|doc| matches_exact(doc, &tag))
    }

    fn query_tag_fuzzy(&self, tag: &str) -> Vec<ResultIdentifier> {
        let needle = tag.to_lowercase();
        let finder = memmem::Finder::new(needle.as_bytes());
        self.matching_ids(|doc| {
            doc.tags
                .iter()
                .any(|t| finder.find(t.as_bytes()).is_some())
        })
    }

    fn query_typed_tags(&self, name: &str) -> Vec<TypedResult> {
        let name = name.to_lowercase();
        self.store
            .documents
            .par_iter()
            .filter(|doc| self.is_visible(doc.id))
            .filter_map(|doc| {
                doc.attributes
                    .get(&name)
                    .map(|value| TypedResult::new(doc.id, value.clone()))
            })
            .collect()
    }

    fn cost_tag_exact(&self, tag: &str) -> u64 {
        let tag = tag.to_lowercase();
        let mut postings = self.store.tag_counts.get(&tag).copied().unwrap_or(0);
        if let Some((name, _)) = tag.split_once(':') {
            postings += self.store.attribute_counts.get(name).copied().unwrap_or(0);
        }
        postings.min(self.visible_bound())
    }

    fn cost_tag_fuzzy(&self, tag: &str) -> u64 {
        let needle = tag.to_lowercase();
        let finder = memmem::Finder::new(needle.as_bytes());
        let postings: u64 = self
            .store
            .tag_counts
            .iter()
            .filter(|(t, _)| finder.find(t.as_bytes()).is_some())
            .map(|(_, count)| *count)
            .sum();
        postings.min(self.visible_bound())
    }

    fn cost_typed_tags(&self, name: &str) -> u64 {
        self.store
            .attribute_counts
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or(0)
            .min(self.visible_bound())
    }

    fn cost_all(&self) -> u64 {
        self.visible_bound()
    }

    fn create_filtered_index(&self, filter: IdSet) -> Arc<dyn Index> {
        let filter = match &self.filter {
            Some(existing) => &filter & existing.as_ref(),
            None => filter,
        };
        Arc::new(MemoryIndex {
            store: Arc::clone(&self.store),
            filter: Some(Arc::new(filter)),
        })
    }
}
