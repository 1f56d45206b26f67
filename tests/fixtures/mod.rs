//! Shared fixture indexes for integration tests.

#![allow(dead_code)]

use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};
use tagq::{IdSet, Index, ResultIdentifier, TypedResult};

/// One tag lookup made against a [`FixtureIndex`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub tag: String,
    pub filtered: bool,
}

/// Five documents, ids 0 to 4:
///
/// - `"0"` .. `"4"` each tag exactly one document
/// - `undertwo` tags 0 and 1, `abovetwo` tags 3 and 4
/// - `all` tags every document
///
/// Fuzzy and exact lookups behave the same. Costs are 0 unless set with
/// [`with_cost`](Self::with_cost). Every tag lookup is recorded.
#[derive(Clone, Default)]
pub struct FixtureIndex {
    filter: Option<Arc<IdSet>>,
    costs: Arc<FxHashMap<String, u64>>,
    lookups: Arc<Mutex<Vec<Lookup>>>,
}

impl FixtureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cost(mut self, tag: &str, cost: u64) -> Self {
        Arc::make_mut(&mut self.costs).insert(tag.to_string(), cost);
        self
    }

    pub fn lookups(&self) -> Vec<Lookup> {
        self.lookups.lock().unwrap().clone()
    }

    fn visible(&self, ids: &[ResultIdentifier]) -> Vec<ResultIdentifier> {
        ids.iter()
            .copied()
            .filter(|id| self.filter.as_ref().is_none_or(|f| f.contains(*id)))
            .collect()
    }

    fn lookup(&self, tag: &str) -> Vec<ResultIdentifier> {
        self.lookups.lock().unwrap().push(Lookup {
            tag: tag.to_string(),
            filtered: self.filter.is_some(),
        });

        let ids: &[ResultIdentifier] = match tag {
            "0" => &[0],
            "1" => &[1],
            "2" => &[2],
            "3" => &[3],
            "4" => &[4],
            "undertwo" => &[0, 1],
            "abovetwo" => &[3, 4],
            "all" => &[0, 1, 2, 3, 4],
            _ => &[],
        };
        self.visible(ids)
    }

    fn cost(&self, tag: &str) -> u64 {
        self.costs.get(tag).copied().unwrap_or(0)
    }
}

impl Index for FixtureIndex {
    fn query_all(&self) -> Vec<ResultIdentifier> {
        self.visible(&[0, 1, 2, 3, 4])
    }

    fn query_tag_exact(&self, tag: &str) -> Vec<ResultIdentifier> {
        self.lookup(tag)
    }

    fn query_tag_fuzzy(&self, tag: &str) -> Vec<ResultIdentifier> {
        self.lookup(tag)
    }

    fn query_typed_tags(&self, _name: &str) -> Vec<TypedResult> {
        Vec::new()
    }

    fn cost_tag_exact(&self, tag: &str) -> u64 {
        self.cost(tag)
    }

    fn cost_tag_fuzzy(&self, tag: &str) -> u64 {
        self.cost(tag)
    }

    fn cost_typed_tags(&self, name: &str) -> u64 {
        self.cost(name)
    }

    fn cost_all(&self) -> u64 {
        0
    }

    fn create_filtered_index(&self, filter: IdSet) -> Arc<dyn Index> {
        Arc::new(FixtureIndex {
            filter: Some(Arc::new(filter)),
            costs: Arc::clone(&self.costs),
            lookups: Arc::clone(&self.lookups),
        })
    }
}

/// An index with no documents at all.
pub struct EmptyIndex;

impl Index for EmptyIndex {
    fn query_all(&self) -> Vec<ResultIdentifier> {
        Vec::new()
    }

    fn query_tag_exact(&self, _tag: &str) -> Vec<ResultIdentifier> {
        Vec::new()
    }

    fn query_tag_fuzzy(&self, _tag: &str) -> Vec<ResultIdentifier> {
        Vec::new()
    }

    fn query_typed_tags(&self, _name: &str) -> Vec<TypedResult> {
        Vec::new()
    }

    fn cost_tag_exact(&self, _tag: &str) -> u64 {
        0
    }

    fn cost_tag_fuzzy(&self, _tag: &str) -> u64 {
        0
    }

    fn cost_typed_tags(&self, _name: &str) -> u64 {
        0
    }

    fn cost_all(&self) -> u64 {
        0
    }

    fn create_filtered_index(&self, _filter: IdSet) -> Arc<dyn Index> {
        Arc::new(EmptyIndex)
    }
}
