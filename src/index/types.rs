use roaring::RoaringTreemap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for a document in the index
pub type ResultIdentifier = u64;

/// Set of document identifiers, used for membership tests and filtered views
pub type IdSet = RoaringTreemap;

/// One answer to a typed query: document `id` carries `value` for the
/// queried attribute (e.g. `year` = `"2011"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedResult {
    pub id: ResultIdentifier,
    pub value: String,
}

impl TypedResult {
    pub fn new(id: ResultIdentifier, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }
}

/// A tagged document as stored by [`MemoryIndex`](super::MemoryIndex)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: ResultIdentifier,
    /// Free-form labels
    #[serde(default)]
    pub tags: Vec<String>,
    /// Typed attributes, e.g. `year` -> `2011`
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: ResultIdentifier) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}
