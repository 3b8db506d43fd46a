//! Collection model + results accumulator.
//!
//! A collection is one of three shapes:
//! - sequence (`Vec<T>`), keyed by index
//! - mapping (`BTreeMap` / `HashMap`), keyed by its own keys
//! - text (`Text`), keyed by character position
//!
//! The shape is fixed by the type, so the engine never inspects values to
//! decide how to enumerate or how to rebuild the output.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write as _};
use std::hash::{BuildHasher, Hash};

// ════════════════════════════════════════════════════════════════════
// Shape
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Sequence,
    Mapping,
    Text,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Sequence => "sequence",
            Shape::Mapping => "mapping",
            Shape::Text => "text",
        };
        f.write_str(name)
    }
}

// ════════════════════════════════════════════════════════════════════
// Traits
// ════════════════════════════════════════════════════════════════════

/// Anything the engine can iterate: an ordered set of keys, each mapping to
/// an item.
pub trait Collection {
    type Key: Clone + fmt::Debug;
    type Item: Clone;

    fn shape(&self) -> Shape;

    /// Keys in enumeration order.
    fn keys(&self) -> Vec<Self::Key>;

    fn get(&self, key: &Self::Key) -> Option<&Self::Item>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rebuilds per-element results into the output shape of the collection.
pub trait Gather<R>: Collection {
    type Output;

    fn gather(&self, results: Results<Self::Key, R>) -> Self::Output;
}

// ════════════════════════════════════════════════════════════════════
// Results
// ════════════════════════════════════════════════════════════════════

/// One slot per enumeration position. Slots are filled in whatever order
/// elements settle and read back in key order.
#[derive(Debug)]
pub struct Results<K, R> {
    slots: Vec<Option<(K, R)>>,
}

impl<K, R> Results<K, R> {
    pub fn with_len(len: usize) -> Self {
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, || None);
        Self { slots }
    }

    pub fn set(&mut self, position: usize, key: K, value: R) {
        if position >= self.slots.len() {
            self.slots.resize_with(position + 1, || None);
        }
        self.slots[position] = Some((key, value));
    }

    /// Number of filled slots.
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

impl<K, R> IntoIterator for Results<K, R> {
    type Item = (K, R);
    type IntoIter = std::iter::Flatten<std::vec::IntoIter<Option<(K, R)>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter().flatten()
    }
}

// ════════════════════════════════════════════════════════════════════
// Sequence
// ════════════════════════════════════════════════════════════════════

impl<T: Clone> Collection for Vec<T> {
    type Key = usize;
    type Item = T;

    fn shape(&self) -> Shape {
        Shape::Sequence
    }

    fn keys(&self) -> Vec<usize> {
        (0..self.len()).collect()
    }

    fn get(&self, key: &usize) -> Option<&T> {
        self.as_slice().get(*key)
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<T: Clone, R> Gather<R> for Vec<T> {
    type Output = Vec<R>;

    fn gather(&self, results: Results<usize, R>) -> Vec<R> {
        results.into_iter().map(|(_, value)| value).collect()
    }
}

// ════════════════════════════════════════════════════════════════════
// Mapping
// ════════════════════════════════════════════════════════════════════

impl<K, T> Collection for BTreeMap<K, T>
where
    K: Ord + Clone + fmt::Debug,
    T: Clone,
{
    type Key = K;
    type Item = T;

    fn shape(&self) -> Shape {
        Shape::Mapping
    }

    fn keys(&self) -> Vec<K> {
        BTreeMap::keys(self).cloned().collect()
    }

    fn get(&self, key: &K) -> Option<&T> {
        BTreeMap::get(self, key)
    }

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }
}

impl<K, T, R> Gather<R> for BTreeMap<K, T>
where
    K: Ord + Clone + fmt::Debug,
    T: Clone,
{
    type Output = BTreeMap<K, R>;

    fn gather(&self, results: Results<K, R>) -> BTreeMap<K, R> {
        results.into_iter().collect()
    }
}

// Enumeration order is whatever the hasher produces.
impl<K, T, S> Collection for HashMap<K, T, S>
where
    K: Hash + Eq + Clone + fmt::Debug,
    T: Clone,
    S: BuildHasher,
{
    type Key = K;
    type Item = T;

    fn shape(&self) -> Shape {
        Shape::Mapping
    }

    fn keys(&self) -> Vec<K> {
        HashMap::keys(self).cloned().collect()
    }

    fn get(&self, key: &K) -> Option<&T> {
        HashMap::get(self, key)
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }
}

impl<K, T, S, R> Gather<R> for HashMap<K, T, S>
where
    K: Hash + Eq + Clone + fmt::Debug,
    T: Clone,
    S: BuildHasher + Default,
{
    type Output = HashMap<K, R, S>;

    fn gather(&self, results: Results<K, R>) -> HashMap<K, R, S> {
        results.into_iter().collect()
    }
}

// ════════════════════════════════════════════════════════════════════
// Text
// ════════════════════════════════════════════════════════════════════

/// A character sequence. Iterated per `char`; mapped output is joined back
/// into a single `String`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    chars: Vec<char>,
}

impl Text {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
        }
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Self::new(&text)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chars.iter().try_for_each(|c| f.write_char(*c))
    }
}

impl Collection for Text {
    type Key = usize;
    type Item = char;

    fn shape(&self) -> Shape {
        Shape::Text
    }

    fn keys(&self) -> Vec<usize> {
        (0..self.chars.len()).collect()
    }

    fn get(&self, key: &usize) -> Option<&char> {
        self.chars.as_slice().get(*key)
    }

    fn len(&self) -> usize {
        self.chars.len()
    }
}

impl<R: fmt::Display> Gather<R> for Text {
    type Output = String;

    fn gather(&self, results: Results<usize, R>) -> String {
        let mut joined = String::with_capacity(self.chars.len());
        for (_, value) in results {
            joined.push_str(&value.to_string());
        }
        joined
    }
}
