//! The tagged value tree stored in a staleness cache.
//!
//! Keys are hierarchical, split on `/`. Interior segments resolve to nested
//! maps and the final segment to a string value, so `"PC/__cookerVersion"`
//! and `"IOS/__cookerVersion"` hold independent values. A path can hold a
//! string or a subtree, never both.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node in the cache value tree: either a leaf string or a nested map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// A leaf string value.
    Str(String),
    /// A nested namespace of values.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Creates an empty map node.
    pub fn empty_map() -> Value {
        Value::Map(BTreeMap::new())
    }

    /// Looks up a hierarchical key, returning the leaf string if present.
    ///
    /// Returns `None` when any segment is missing or when the path ends on a
    /// subtree instead of a leaf.
    pub fn get(&self, key: &str) -> Option<&str> {
        let mut node = self;
        for segment in key.split('/') {
            match node {
                Value::Map(map) => node = map.get(segment)?,
                Value::Str(_) => return None,
            }
        }
        match node {
            Value::Str(s) => Some(s),
            Value::Map(_) => None,
        }
    }

    /// Sets a hierarchical key to a leaf string, creating interior maps as
    /// needed.
    ///
    /// A leaf encountered in an interior position is replaced by a map; a
    /// subtree at the final position is replaced by the leaf. For any path,
    /// at most one value exists afterwards.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let mut node = self;
        let mut segments = key.split('/').peekable();
        while let Some(segment) = segments.next() {
            let map = match node {
                Value::Map(map) => map,
                Value::Str(_) => {
                    *node = Value::empty_map();
                    match node {
                        Value::Map(map) => map,
                        Value::Str(_) => unreachable!(),
                    }
                }
            };
            if segments.peek().is_none() {
                map.insert(segment.to_string(), Value::Str(value.into()));
                return;
            }
            node = map
                .entry(segment.to_string())
                .or_insert_with(Value::empty_map);
        }
    }

    /// Returns `true` if the tree holds no leaf values.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Str(_) => false,
            Value::Map(map) => map.values().all(Value::is_empty),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::empty_map()
    }
}
