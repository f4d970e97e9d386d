//! Occurrence counts keyed by composite key

use indexmap::map::{self, IndexMap};

/// Composite key → occurrence count.
///
/// Keys keep the order in which they were first counted. One table is owned
/// by each scan; partial tables are combined with [`CountTable::merge`],
/// whose counts are associative and commutative. Merging in chunk order
/// keeps keys in order of first appearance in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    counts: IndexMap<Vec<u8>, u64>,
}

impl CountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `key`, allocating only for unseen keys.
    pub fn increment(&mut self, key: &[u8]) {
        self.add(key, 1);
    }

    pub fn add(&mut self, key: &[u8], count: u64) {
        if let Some(existing) = self.counts.get_mut(key) {
            *existing += count;
        } else {
            self.counts.insert(key.to_vec(), count);
        }
    }

    /// Fold `other` into `self` by summing counters of equal keys.
    ///
    /// Keys new to `self` are appended in `other`'s order.
    pub fn merge(&mut self, other: CountTable) {
        if self.counts.is_empty() {
            self.counts = other.counts;
            return;
        }
        for (key, count) in other.counts {
            *self.counts.entry(key).or_insert(0) += count;
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<u64> {
        self.counts.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> map::Iter<'_, Vec<u8>, u64> {
        self.counts.iter()
    }
}

impl<'a> IntoIterator for &'a CountTable {
    type Item = (&'a Vec<u8>, &'a u64);
    type IntoIter = map::Iter<'a, Vec<u8>, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.iter()
    }
}

impl FromIterator<(Vec<u8>, u64)> for CountTable {
    fn from_iter<I: IntoIterator<Item = (Vec<u8>, u64)>>(iter: I) -> Self {
        let mut table = CountTable::new();
        for (key, count) in iter {
            table.add(&key, count);
        }
        table
    }
}
