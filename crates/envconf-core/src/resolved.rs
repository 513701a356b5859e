//! The resolved configuration.

use crate::{Error, Result, Value};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::collections::HashMap;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Environment,
    Default,
}

/// One resolved variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub value: Value,
    pub source: Source,
}

/// Mapping from variable name to its final typed value, in resolution
/// order. Each variable is recorded at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl ResolvedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved variable. A variable cannot be recorded twice.
    pub fn insert(&mut self, name: impl Into<String>, value: Value, source: Source) -> Result<()> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(Error::Duplicate(name));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(Entry {
            name,
            value,
            source,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entry(name).map(|e| &e.value)
    }

    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Like [`get`](Self::get), but an absent variable is an error.
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.get(name).ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn source(&self, name: &str) -> Option<Source> {
        self.entry(name).map(|e| e.source)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_str_items(&self, name: &str) -> Option<Vec<&str>> {
        self.get(name).and_then(Value::as_str_items)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}

/// Serializes as a map from name to value, in resolution order.
impl Serialize for ResolvedConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.value)?;
        }
        map.end()
    }
}
