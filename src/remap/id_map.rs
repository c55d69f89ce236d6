use crate::core::{CloneError, RecordId, Result};
use std::collections::HashMap;

/// Outcome of looking up an old id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    Target(&'a RecordId),
    /// The old id was never cloned; the reference must be dropped.
    NoTarget,
}

impl<'a> Resolved<'a> {
    pub fn target(self) -> Option<&'a RecordId> {
        match self {
            Resolved::Target(id) => Some(id),
            Resolved::NoTarget => None,
        }
    }

    pub fn is_target(&self) -> bool {
        matches!(self, Resolved::Target(_))
    }
}

/// Old-id → new-id table for one collection.
///
/// Entries are write-once and keep creation order.
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    collection: String,
    lookup: HashMap<RecordId, usize>,
    entries: Vec<(RecordId, RecordId)>,
}

impl IdMap {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn insert(&mut self, old: RecordId, new: RecordId) -> Result<()> {
        if self.lookup.contains_key(&old) {
            return Err(CloneError::DuplicateSourceId {
                collection: self.collection.clone(),
                id: old.to_string(),
            });
        }
        if old == new {
            return Err(CloneError::InvalidRecord(format!(
                "new id for '{}' in '{}' equals the source id",
                old, self.collection
            )));
        }
        self.lookup.insert(old.clone(), self.entries.len());
        self.entries.push((old, new));
        Ok(())
    }

    pub fn resolve(&self, old: &str) -> Resolved<'_> {
        match self.lookup.get(&RecordId::from(old)) {
            Some(&pos) => Resolved::Target(&self.entries[pos].1),
            None => Resolved::NoTarget,
        }
    }

    pub fn contains(&self, old: &RecordId) -> bool {
        self.lookup.contains_key(old)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(old, new)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &RecordId)> {
        self.entries.iter().map(|(old, new)| (old, new))
    }

    /// New ids in creation order.
    pub fn new_ids(&self) -> impl Iterator<Item = &RecordId> {
        self.entries.iter().map(|(_, new)| new)
    }
}

/// ID maps of every collection taking part in one clone.
#[derive(Debug, Clone, Default)]
pub struct IdMaps {
    maps: HashMap<String, IdMap>,
}

impl IdMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, collection: &str) -> Option<&IdMap> {
        self.maps.get(collection)
    }

    pub fn map_mut(&mut self, collection: &str) -> &mut IdMap {
        self.maps
            .entry(collection.to_string())
            .or_insert_with(|| IdMap::new(collection))
    }

    pub fn insert(&mut self, collection: &str, old: RecordId, new: RecordId) -> Result<()> {
        self.map_mut(collection).insert(old, new)
    }

    /// Resolves `old` in `collection`; a collection with no map yields `NoTarget`.
    pub fn resolve(&self, collection: &str, old: &str) -> Resolved<'_> {
        self.maps
            .get(collection)
            .map_or(Resolved::NoTarget, |map| map.resolve(old))
    }

    pub fn len(&self, collection: &str) -> usize {
        self.maps.get(collection).map_or(0, IdMap::len)
    }
}
