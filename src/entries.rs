//! Normalization of input collections into an ordered sequence
//! of `(position, value)` entries.
//!
//! Sequential collections yield their indices as positions.
//! Associative collections yield their keys, in the order the
//! collection itself enumerates them: key order for a
//! `BTreeMap`, insertion order for an `IndexMap`, and whatever
//! the hasher gives for a `HashMap`.
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::iter::FromIterator;

use indexmap::IndexMap;

/// One element of the input, with its index or key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<P, V> {
    pub position: P,
    pub value: V,
}

/// The ordered entries of one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence<P, V> {
    entries: Vec<Entry<P, V>>,
}

impl<P, V> Sequence<P, V> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry<P, V>> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry<P, V>> {
        self.entries.iter()
    }

    pub fn positions(&self) -> impl Iterator<Item = &P> + '_ {
        self.entries.iter().map(|e| &e.position)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.iter().map(|e| &e.value)
    }

    pub(crate) fn into_entries(self) -> Vec<Entry<P, V>> {
        self.entries
    }
}

impl<V> Sequence<usize, V> {
    /// Index the values of an iterator from zero.
    pub fn from_values<I: IntoIterator<Item = V>>(values: I) -> Self {
        values.into_iter().enumerate().collect()
    }
}

impl<P, V> Default for Sequence<P, V> {
    fn default() -> Self {
        Sequence { entries: Vec::new() }
    }
}

impl<P, V> FromIterator<(P, V)> for Sequence<P, V> {
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        Sequence {
            entries: iter.into_iter()
                .map(|(position, value)| Entry { position, value })
                .collect(),
        }
    }
}

impl<P, V> IntoIterator for Sequence<P, V> {
    type Item = Entry<P, V>;
    type IntoIter = std::vec::IntoIter<Entry<P, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, P, V> IntoIterator for &'a Sequence<P, V> {
    type Item = &'a Entry<P, V>;
    type IntoIter = std::slice::Iter<'a, Entry<P, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Anything that can be searched.
pub trait IntoSequence {
    type Position;
    type Value;

    fn into_sequence(self) -> Sequence<Self::Position, Self::Value>;
}

impl<P, V> IntoSequence for Sequence<P, V> {
    type Position = P;
    type Value = V;

    fn into_sequence(self) -> Sequence<P, V> {
        self
    }
}

impl<V> IntoSequence for Vec<V> {
    type Position = usize;
    type Value = V;

    fn into_sequence(self) -> Sequence<usize, V> {
        Sequence::from_values(self)
    }
}

impl<V> IntoSequence for VecDeque<V> {
    type Position = usize;
    type Value = V;

    fn into_sequence(self) -> Sequence<usize, V> {
        Sequence::from_values(self)
    }
}

impl<V, const N: usize> IntoSequence for [V; N] {
    type Position = usize;
    type Value = V;

    fn into_sequence(self) -> Sequence<usize, V> {
        Sequence::from_values(self)
    }
}

impl<'a, V: Clone> IntoSequence for &'a [V] {
    type Position = usize;
    type Value = V;

    fn into_sequence(self) -> Sequence<usize, V> {
        Sequence::from_values(self.iter().cloned())
    }
}

impl<K: Ord, V> IntoSequence for BTreeMap<K, V> {
    type Position = K;
    type Value = V;

    fn into_sequence(self) -> Sequence<K, V> {
        self.into_iter().collect()
    }
}

impl<K: Eq + Hash, V, S: BuildHasher> IntoSequence for HashMap<K, V, S> {
    type Position = K;
    type Value = V;

    fn into_sequence(self) -> Sequence<K, V> {
        self.into_iter().collect()
    }
}

impl<K: Eq + Hash, V, S: BuildHasher> IntoSequence for IndexMap<K, V, S> {
    type Position = K;
    type Value = V;

    fn into_sequence(self) -> Sequence<K, V> {
        self.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_positions_are_indices() {
        let seq = vec!['x', 'y', 'z'].into_sequence();
        assert_eq!(seq.positions().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(seq.values().copied().collect::<Vec<_>>(), vec!['x', 'y', 'z']);
    }

    #[test]
    fn keyed_positions_keep_insertion_order() {
        let mut map = IndexMap::new();
        map.insert("a", 5);
        map.insert("b", 3);
        map.insert("c", 2);
        let seq = map.into_sequence();
        assert_eq!(seq.get(0), Some(&Entry { position: "a", value: 5 }));
        assert_eq!(seq.positions().copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn btree_is_key_ordered() {
        let map: BTreeMap<_, _> = vec![("c", 2), ("a", 5), ("b", 3)].into_iter().collect();
        let seq = map.into_sequence();
        assert_eq!(seq.values().copied().collect::<Vec<_>>(), vec![5, 3, 2]);
    }

    #[test]
    fn empty_inputs() {
        assert!(Vec::<u8>::new().into_sequence().is_empty());
        assert!(HashMap::<String, u8>::new().into_sequence().is_empty());
        assert!(IndexMap::<String, u8>::new().into_sequence().is_empty());
        let slice: &[u8] = &[];
        assert_eq!(slice.into_sequence().len(), 0);
    }
}
