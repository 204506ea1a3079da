use std::fmt::Debug;
use std::hash::Hash;

use hashbrown::HashMap;
use strata_geom::{ColumnPos, CubePos};
use thiserror::Error;

use crate::column::Column;
use crate::cube::Cube;

/// Anything stored by its own coordinate.
pub trait Positioned {
    type Key: Copy + Eq + Hash + Debug;
    fn pos(&self) -> Self::Key;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("duplicate entity at {0}")]
    Duplicate(String),
}

/// Coordinate-keyed container. No policy: it never loads, generates, or
/// evicts on its own.
#[derive(Debug)]
pub struct CoordMap<K, V> {
    entries: HashMap<K, V>,
}

pub type ColumnMap = CoordMap<ColumnPos, Column>;
pub type CubeMap = CoordMap<CubePos, Cube>;

impl<K, V> CoordMap<K, V>
where
    K: Copy + Eq + Hash + Debug,
    V: Positioned<Key = K>,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.entries.get(&key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.entries.get_mut(&key)
    }

    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    /// Inserts a new entity. An occupied coordinate is rejected and the
    /// existing entry is left untouched.
    pub fn put(&mut self, value: V) -> Result<(), StoreError> {
        let key = value.pos();
        if self.entries.contains_key(&key) {
            return Err(StoreError::Duplicate(format!("{key:?}")));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        self.entries.remove(&key)
    }

    /// Snapshot of the current keys; the store may change while it is walked.
    pub fn keys(&self) -> Vec<K> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Default for CoordMap<K, V>
where
    K: Copy + Eq + Hash + Debug,
    V: Positioned<Key = K>,
{
    fn default() -> Self {
        Self::new()
    }
}
