//! Aggregation targets for paged results

use serde_json::Value;
use std::collections::BTreeMap;

/// Collects items across pages
pub trait AggregateSink {
    /// Add one item after all previously appended items
    fn append(&mut self, item: Value);

    /// Number of items collected so far
    fn len(&self) -> usize;

    /// Whether nothing has been collected
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every collected item in append order
    fn drain(&mut self) -> Vec<Value>;
}

/// Plain ordered sequence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceSink {
    items: Vec<Value>,
}

impl SequenceSink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }
}

impl AggregateSink for SequenceSink {
    fn append(&mut self, item: Value) {
        self.items.push(item);
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn drain(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.items)
    }
}

/// Mapping keyed by a synthetic index.
///
/// Each appended item is stored under the current length, so keys run
/// `0, 1, 2, ...` across pages; [`AggregateSink::drain`] yields values in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedSink {
    items: BTreeMap<usize, Value>,
}

impl IndexedSink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyed view of the collected items
    pub fn entries(&self) -> impl Iterator<Item = (String, &Value)> {
        self.items.iter().map(|(key, value)| (key.to_string(), value))
    }

    /// Item stored under `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.parse().ok().and_then(|index: usize| self.items.get(&index))
    }
}

impl AggregateSink for IndexedSink {
    fn append(&mut self, item: Value) {
        let key = self.items.len();
        self.items.insert(key, item);
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn drain(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.items).into_values().collect()
    }
}
