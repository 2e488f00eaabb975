//! Sorted associative map over the chunked sequence.
//!
//! Entries live in a weighted sequence measured by item count and by the
//! min-key algebra, kept sorted in descending key order. Every map
//! operation reduces to a key-directed split followed by a concat: the
//! running prefix of min-keys over a sorted run is the boundary key, so
//! "first position whose prefix key is at most the target" lands exactly
//! on the target's slot.

use serde::de::MapAccess;
use serde::de::Visitor;
use serde::ser::SerializeMap;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::chunk::Ring;
use crate::measure::ByKey;
use crate::measure::Count;
use crate::measure::Keyed;
use crate::measure::MinKey;
use crate::measure::Pair;
use crate::seq::ChunkedSeq;

/// A key-value entry. The key is the ordering and measurement handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
}

impl<K: Ord + Clone, V> Keyed for Entry<K, V> {
    type Key = K;

    fn key(&self) -> K {
        return self.key.clone();
    }
}

type MapSeq<K, V> = ChunkedSeq<Entry<K, V>, Pair<Count, ByKey>, Ring<Entry<K, V>>>;

/// An ordered map with O(log n) insert, lookup, and removal, stored as a
/// chunked sequence in descending key order.
pub struct SortedMap<K: Ord + Clone, V> {
    seq: MapSeq<K, V>,
}

impl<K: Ord + Clone, V> SortedMap<K, V> {
    pub fn new() -> Self {
        return SortedMap { seq: ChunkedSeq::new() };
    }

    pub fn with_chunk_capacity(cap: usize) -> Self {
        return SortedMap {
            seq: ChunkedSeq::with_chunk_capacity(cap),
        };
    }

    pub fn len(&self) -> usize {
        return self.seq.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.seq.is_empty();
    }

    pub fn clear(&mut self) {
        self.seq.clear();
    }

    /// Look up a key. O(log n).
    pub fn get(&self, key: &K) -> Option<&V> {
        let (entry, _) = self.seq.search_by(|acc: &(usize, MinKey<K>)| {
            match acc.1.key() {
                Some(seen) => return seen <= key,
                None => return false,
            }
        })?;
        if entry.key == *key {
            return Some(&entry.value);
        }
        return None;
    }

    pub fn contains_key(&self, key: &K) -> bool {
        return self.get(key).is_some();
    }

    /// Insert a binding, returning the previous value for the key.
    /// O(log n): split at the key's slot, place the entry, concat.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut tail = self.seq.split_off_by(|acc: &(usize, MinKey<K>)| {
            match acc.1.key() {
                Some(seen) => return *seen <= key,
                None => return false,
            }
        });
        let mut old = None;
        if tail.front().map(|entry| entry.key == key).unwrap_or(false) {
            old = tail.pop_front().map(|entry| entry.value);
        }
        self.seq.push_back(Entry { key, value });
        self.seq.concat(&mut tail);
        return old;
    }

    /// Remove a binding, returning its value. O(log n).
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let mut tail = self.seq.split_off_by(|acc: &(usize, MinKey<K>)| {
            match acc.1.key() {
                Some(seen) => return seen <= key,
                None => return false,
            }
        });
        let mut old = None;
        if tail.front().map(|entry| entry.key == *key).unwrap_or(false) {
            old = tail.pop_front().map(|entry| entry.value);
        }
        self.seq.concat(&mut tail);
        return old;
    }

    /// Iterate bindings in descending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        return self.seq.iter().map(|entry| (&entry.key, &entry.value));
    }

    /// The largest key present.
    pub fn first_key(&self) -> Option<&K> {
        return self.seq.front().map(|entry| &entry.key);
    }

    /// The smallest key present.
    pub fn last_key(&self) -> Option<&K> {
        return self.seq.back().map(|entry| &entry.key);
    }
}

impl<K: Ord + Clone, V> Default for SortedMap<K, V> {
    fn default() -> Self {
        return Self::new();
    }
}

impl<K: Ord + Clone, V: Clone> Clone for SortedMap<K, V> {
    fn clone(&self) -> Self {
        return SortedMap { seq: self.seq.clone() };
    }
}

impl<K: Ord + Clone + std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for SortedMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.debug_map().entries(self.iter()).finish();
    }
}

impl<K: Ord + Clone, V> FromIterator<(K, V)> for SortedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        return map;
    }
}

impl<K: Ord + Clone + Serialize, V: Serialize> Serialize for SortedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        return map.end();
    }
}

impl<'de, K, V> Deserialize<'de> for SortedMap<K, V>
where
    K: Ord + Clone + Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SortedMapVisitor<K, V>(std::marker::PhantomData<(K, V)>);

        impl<'de, K, V> Visitor<'de> for SortedMapVisitor<K, V>
        where
            K: Ord + Clone + Deserialize<'de>,
            V: Deserialize<'de>,
        {
            type Value = SortedMap<K, V>;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                return write!(f, "a map");
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = SortedMap::new();
                while let Some((key, value)) = access.next_entry()? {
                    map.insert(key, value);
                }
                return Ok(map);
            }
        }

        return deserializer.deserialize_map(SortedMapVisitor(std::marker::PhantomData));
    }
}
