//! Determinism utilities: stable first-appearance ordering.
//!
//! Every tie in the engine is broken by "table order": the position at which
//! a party or district first appeared in the input. `TableOrder` records that
//! position once so later stages never depend on map iteration order.

use std::collections::BTreeMap;

/// Insertion-ordered set with O(log n) position lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableOrder<K: Ord + Clone> {
    order: Vec<K>,
    index: BTreeMap<K, usize>,
}

impl<K: Ord + Clone> Default for TableOrder<K> {
    fn default() -> Self {
        Self { order: Vec::new(), index: BTreeMap::new() }
    }
}

impl<K: Ord + Clone> TableOrder<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` if unseen; returns its (possibly pre-existing) position.
    pub fn insert(&mut self, key: &K) -> usize {
        if let Some(&ix) = self.index.get(key) {
            return ix;
        }
        let ix = self.order.len();
        self.order.push(key.clone());
        self.index.insert(key.clone(), ix);
        ix
    }

    #[inline]
    pub fn position(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[K] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }
}
