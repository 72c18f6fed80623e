pub mod cache;
pub mod loader;

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use cache::{CacheError, CachePort, CacheRecord, FileCache, MemoryCache};
pub use loader::{IndexOrigin, LoadReport, LoaderOptions, NameIndexLoader};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameIndexEntry {
    pub name: String,
    pub target_url: String,
}

/// Searchable entity names mapped to their navigation targets.
///
/// Names are unique. Iteration follows first-insertion order; re-inserting
/// an existing name replaces its target in place (last write wins).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameIndex {
    entries: Vec<NameIndexEntry>,
    positions: HashMap<String, usize>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous target when `name` was already present.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        target_url: impl Into<String>,
    ) -> Option<String> {
        let name = name.into();
        let target_url = target_url.into();
        match self.positions.get(&name) {
            Some(&pos) => Some(std::mem::replace(
                &mut self.entries[pos].target_url,
                target_url,
            )),
            None => {
                self.positions.insert(name.clone(), self.entries.len());
                self.entries.push(NameIndexEntry { name, target_url });
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.positions
            .get(name)
            .map(|&pos| self.entries[pos].target_url.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = &NameIndexEntry> {
        self.entries.iter()
    }

    /// Merges `other` into `self`, returning how many names were overwritten.
    pub fn merge(&mut self, other: NameIndex) -> usize {
        let mut overwritten = 0;
        for entry in other.entries {
            if self.insert(entry.name, entry.target_url).is_some() {
                overwritten += 1;
            }
        }
        overwritten
    }
}

impl<K, V> FromIterator<(K, V)> for NameIndex
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut index = NameIndex::new();
        for (name, target) in iter {
            index.insert(name, target);
        }
        index
    }
}

impl Serialize for NameIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in self.entries.iter() {
            map.serialize_entry(&entry.name, &entry.target_url)?;
        }
        map.end()
    }
}

struct NameIndexVisitor;

impl<'de> Visitor<'de> for NameIndexVisitor {
    type Value = NameIndex;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of names to target urls")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut index = NameIndex::new();
        while let Some((name, target)) = access.next_entry::<String, String>()? {
            index.insert(name, target);
        }
        Ok(index)
    }
}

impl<'de> Deserialize<'de> for NameIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(NameIndexVisitor)
    }
}
