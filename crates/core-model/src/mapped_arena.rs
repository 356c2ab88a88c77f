// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A wrapper around a `typed_generational_arena::Arena` that also provides fast lookup by name.
//!
//! We use `MappedArena` to store the models of a schema. Both the resolver and the runtime need to
//! find a model given its name (for example, when resolving the target of a relation or when a
//! generated accessor asks for the model it operates on).
//!
//! Unlike a plain hash map, the name index remembers the insertion order, so iterating over the
//! arena yields the models in declaration order. Code generation relies on that to produce the
//! same output for the same schema.

use std::ops;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use typed_generational_arena::{Arena, IgnoreGeneration, Index};

pub type SerializableSlab<T> = Arena<T, usize, IgnoreGeneration>;
pub type SerializableSlabIndex<T> = Index<T, usize, IgnoreGeneration>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappedArena<V> {
    values: SerializableSlab<V>,
    map: IndexMap<String, SerializableSlabIndex<V>>,
}

impl<V> MappedArena<V> {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.map.keys()
    }

    pub fn get_id(&self, key: &str) -> Option<SerializableSlabIndex<V>> {
        self.map.get(key).copied()
    }

    pub fn get_by_key(&self, key: &str) -> Option<&V> {
        self.get_id(key).map(|id| &self[id])
    }

    pub fn get_by_key_mut(&mut self, key: &str) -> Option<&mut V> {
        self.get_id(key).map(|id| &mut self.values[id])
    }

    pub fn get_by_id(&self, id: SerializableSlabIndex<V>) -> Option<&V> {
        self.values.get(id)
    }

    /// Add a value under the given key. If the key is already present, the existing id is returned
    /// and the value is dropped.
    pub fn add(&mut self, key: &str, value: V) -> SerializableSlabIndex<V> {
        if let Some(existing) = self.get_id(key) {
            return existing;
        }

        let id = self.values.insert(value);
        self.map.insert(key.to_string(), id);
        id
    }

    /// Iterate over `(id, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (SerializableSlabIndex<V>, &V)> {
        self.map.values().map(|id| (*id, &self.values[*id]))
    }

    /// Iterate over values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

impl<V> Default for MappedArena<V> {
    fn default() -> Self {
        MappedArena {
            values: SerializableSlab::new(),
            map: IndexMap::default(),
        }
    }
}

impl<V: PartialEq> PartialEq for MappedArena<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((_, lhs), (_, rhs))| lhs == rhs)
            && self.keys().eq(other.keys())
    }
}

impl<V> ops::Index<SerializableSlabIndex<V>> for MappedArena<V> {
    type Output = V;

    #[inline]
    fn index(&self, id: SerializableSlabIndex<V>) -> &V {
        &self.values[id]
    }
}

impl<V> ops::IndexMut<SerializableSlabIndex<V>> for MappedArena<V> {
    #[inline]
    fn index_mut(&mut self, id: SerializableSlabIndex<V>) -> &mut V {
        &mut self.values[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn iterates_in_insertion_order() {
        let mut arena = MappedArena::default();
        arena.add("zeta", 1);
        arena.add("alpha", 2);
        arena.add("mid", 3);

        let keys: Vec<_> = arena.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

        let values: Vec<_> = arena.values().copied().collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[multiplatform_test]
    fn add_keeps_first_value() {
        let mut arena = MappedArena::default();
        let first = arena.add("a", 1);
        let second = arena.add("a", 2);

        assert_eq!(first, second);
        assert_eq!(arena.get_by_key("a"), Some(&1));
        assert_eq!(arena.len(), 1);
    }

    #[multiplatform_test]
    fn equality_considers_order() {
        let mut a = MappedArena::default();
        a.add("x", 1);
        a.add("y", 2);

        let mut b = MappedArena::default();
        b.add("y", 2);
        b.add("x", 1);

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
