//! Ordered tables with secondary indexes.
//!
//! A [`Table`] keeps rows in a `BTreeMap` by primary key. Each secondary index
//! is a pure function of the row ([`IndexDef::key`]) and is kept as a
//! `BTreeSet<(u128, primary key)>`, recomputed on every insert, modify and
//! remove. Only rows are serialized; indexes are rebuilt on load.

use crate::StoreError;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::ops::RangeInclusive;

/// A secondary index: a name and a key function.
pub struct IndexDef<R> {
    pub name: &'static str,
    pub key: fn(&R) -> u128,
}

/// A row type stored in a [`Table`].
pub trait Record: Clone + Debug + 'static {
    type Key: Ord + Clone + Debug;

    fn primary_key(&self) -> Self::Key;

    /// Secondary indexes maintained for this row type.
    fn indexes() -> &'static [IndexDef<Self>] {
        &[]
    }
}

#[derive(Clone, Debug)]
pub struct Table<R: Record> {
    rows: BTreeMap<R::Key, R>,
    indexes: Vec<BTreeSet<(u128, R::Key)>>,
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Table<R> {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            indexes: R::indexes().iter().map(|_| BTreeSet::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.rows.get(key)
    }

    pub fn contains(&self, key: &R::Key) -> bool {
        self.rows.contains_key(key)
    }

    /// Rows in primary-key order.
    pub fn iter(&self) -> impl Iterator<Item = &R> + '_ {
        self.rows.values()
    }

    /// Rows with primary key in `[from, ..)`.
    pub fn iter_from(&self, from: &R::Key) -> impl Iterator<Item = &R> + '_ {
        self.rows.range(from.clone()..).map(|(_, row)| row)
    }

    pub fn keys(&self) -> impl Iterator<Item = &R::Key> + '_ {
        self.rows.keys()
    }

    pub fn last(&self) -> Option<&R> {
        self.rows.values().next_back()
    }

    /// Insert a new row. Fails if the primary key is taken.
    pub fn insert(&mut self, row: R) -> Result<(), StoreError> {
        let key = row.primary_key();
        if self.rows.contains_key(&key) {
            return Err(StoreError::Duplicate(format!("{key:?}")));
        }
        self.index_row(&row, &key);
        self.rows.insert(key, row);
        Ok(())
    }

    /// Insert or replace a row.
    pub fn upsert(&mut self, row: R) {
        let key = row.primary_key();
        if let Some(old) = self.rows.remove(&key) {
            self.unindex_row(&old, &key);
        }
        self.index_row(&row, &key);
        self.rows.insert(key, row);
    }

    /// Mutate a row in place. The primary key must not change.
    pub fn modify<T>(&mut self, key: &R::Key, f: impl FnOnce(&mut R) -> T) -> Result<T, StoreError> {
        let mut row = self
            .rows
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(format!("{key:?}")))?;
        self.unindex_row(&row, key);
        let out = f(&mut row);
        let new_key = row.primary_key();
        if &new_key != key {
            return Err(StoreError::Corruption(format!(
                "primary key changed from {key:?} to {new_key:?}"
            )));
        }
        self.index_row(&row, key);
        self.rows.insert(new_key, row);
        Ok(out)
    }

    pub fn remove(&mut self, key: &R::Key) -> Option<R> {
        let row = self.rows.remove(key)?;
        self.unindex_row(&row, key);
        Some(row)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        for index in &mut self.indexes {
            index.clear();
        }
    }

    /// Keep only rows for which `f` returns true.
    pub fn retain(&mut self, mut f: impl FnMut(&R) -> bool) {
        let dropped: Vec<R::Key> = self
            .rows
            .iter()
            .filter(|(_, row)| !f(row))
            .map(|(key, _)| key.clone())
            .collect();
        for key in dropped {
            self.remove(&key);
        }
    }

    fn index_pos(&self, name: &str) -> Result<usize, StoreError> {
        R::indexes()
            .iter()
            .position(|def| def.name == name)
            .ok_or_else(|| StoreError::NotFound(format!("index {name}")))
    }

    /// Rows in ascending order of the named secondary index.
    pub fn by_index(&self, name: &str) -> Result<impl Iterator<Item = &R> + '_, StoreError> {
        self.index_range(name, 0..=u128::MAX)
    }

    /// Rows whose secondary key lies in `range`, ascending.
    pub fn index_range(
        &self,
        name: &str,
        range: RangeInclusive<u128>,
    ) -> Result<impl Iterator<Item = &R> + '_, StoreError> {
        let pos = self.index_pos(name)?;
        let (lo, hi) = range.into_inner();
        Ok(self.indexes[pos]
            .iter()
            .skip_while(move |(k, _)| *k < lo)
            .take_while(move |(k, _)| *k <= hi)
            .filter_map(move |(_, key)| self.rows.get(key)))
    }

    /// First row whose secondary key equals `value`.
    pub fn find_by_index(&self, name: &str, value: u128) -> Result<Option<&R>, StoreError> {
        Ok(self.index_range(name, value..=value)?.next())
    }

    fn index_row(&mut self, row: &R, key: &R::Key) {
        for (def, index) in R::indexes().iter().zip(self.indexes.iter_mut()) {
            index.insert(((def.key)(row), key.clone()));
        }
    }

    fn unindex_row(&mut self, row: &R, key: &R::Key) {
        for (def, index) in R::indexes().iter().zip(self.indexes.iter_mut()) {
            index.remove(&((def.key)(row), key.clone()));
        }
    }
}

impl<R: Record + Serialize> Serialize for Table<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows.values())
    }
}

impl<'de, R: Record + Deserialize<'de>> Deserialize<'de> for Table<R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<R>::deserialize(deserializer)?;
        let mut table = Table::new();
        for row in rows {
            table.insert(row).map_err(serde::de::Error::custom)?;
        }
        Ok(table)
    }
}

/// Combine two 64-bit keys into one composite index key.
pub fn combine_ids(high: u64, low: u64) -> u128 {
    ((high as u128) << 64) | low as u128
}
