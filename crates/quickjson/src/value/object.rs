//! Insertion-ordered JSON object with a lazy hash index.
//!
//! Lookup is a linear key scan while the object stays small; once it holds
//! [`INDEX_THRESHOLD`] entries, a hash index (key → entry position) is
//! built on the next mutable lookup or insert and answers lookups in O(1).
//! The index stores its own key copies, so appends update it incrementally;
//! `remove` shifts positions and rebuilds it.

use std::fmt;

use ahash::AHashMap;

use crate::arena::Arena;
use crate::value::storage::ArenaVec;
use crate::value::string::Str;
use crate::value::Value;

/// Entry count at which lookups switch from linear scan to the hash index.
pub(crate) const INDEX_THRESHOLD: usize = 16;

pub(crate) struct Entry {
    pub(crate) key: Str,
    pub(crate) value: Value,
}

impl Clone for Entry {
    fn clone(&self) -> Entry {
        Entry {
            key: self.key.clone(),
            value: self.value.clone(),
        }
    }
}

type KeyIndex = AHashMap<Box<str>, u32>;

/// A JSON object: key/value entries in insertion order, unique keys.
pub struct Object {
    entries: ArenaVec<Entry>,
    /// Lazily built lookup index; always rebuildable from `entries`.
    index: Option<Box<KeyIndex>>,
}

impl Object {
    pub fn new() -> Object {
        Object {
            entries: ArenaVec::new(),
            index: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Object {
        crate::arena::with_active(|active| Object::with_capacity_in(capacity, active))
    }

    pub(crate) fn with_capacity_in(capacity: usize, active: Option<&Arena>) -> Object {
        Object {
            entries: ArenaVec::with_capacity_in(capacity, active),
            index: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.entries.reserve(additional);
    }

    /// Find the value for `key` without creating an entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.position_of(key)
            .map(|pos| &self.entries.as_slice()[pos].value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.ensure_index();
        self.position_of(key)
            .map(|pos| &mut self.entries.as_mut_slice()[pos].value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position_of(key).is_some()
    }

    /// Insert or update; returns the previous value if the key existed.
    /// Updates in place keep the index intact; appends update it in O(1).
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<Value>) -> Option<Value> {
        let key = key.as_ref();
        let value = value.into();
        self.ensure_index();
        match self.position_of(key) {
            Some(pos) => {
                let slot = &mut self.entries.as_mut_slice()[pos].value;
                Some(std::mem::replace(slot, value))
            }
            None => {
                self.push_unchecked(Str::new(key), value);
                None
            }
        }
    }

    /// Remove the entry for `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.position_of(key)?;
        let entry = self.entries.remove(pos);
        // Positions after `pos` shifted; the index must be rebuilt.
        if self.index.is_some() {
            self.rebuild_index();
        }
        Some(entry.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }

    /// Value for `key`, inserting a null entry on miss.
    pub fn entry_or_null(&mut self, key: &str) -> &mut Value {
        self.ensure_index();
        let pos = match self.position_of(key) {
            Some(pos) => pos,
            None => {
                self.push_unchecked(Str::new(key), Value::null());
                self.entries.len() - 1
            }
        };
        &mut self.entries.as_mut_slice()[pos].value
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.as_slice().iter().map(|e| e.key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.as_slice().iter().map(|e| &e.value)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.entries.as_mut_slice().iter_mut().map(|e| &mut e.value)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.as_slice().iter().map(|e| (e.key.as_str(), &e.value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.entries
            .as_mut_slice()
            .iter_mut()
            .map(|e| (e.key.as_str(), &mut e.value))
    }

    // ─── Internals shared with the parser ───

    pub(crate) fn entries(&self) -> &[Entry] {
        self.entries.as_slice()
    }

    /// Append without a duplicate check; the parser bulk-loads entries and
    /// deduplicates once in [`finalize`](Object::finalize).
    pub(crate) fn push_entry(&mut self, key: Str, value: Value, active: Option<&Arena>) {
        let pos = self.entries.len();
        self.entries.push_with(Entry { key, value }, active);
        if let Some(index) = &mut self.index {
            let key = Box::from(self.entries.as_slice()[pos].key.as_str());
            index.insert(key, pos as u32);
        }
    }

    fn push_unchecked(&mut self, key: Str, value: Value) {
        let pos = self.entries.len();
        self.entries.push(Entry { key, value });
        if let Some(index) = &mut self.index {
            let key = Box::from(self.entries.as_slice()[pos].key.as_str());
            index.insert(key, pos as u32);
        }
    }

    fn position_of(&self, key: &str) -> Option<usize> {
        if let Some(index) = &self.index {
            return index.get(key).map(|&pos| pos as usize);
        }
        self.entries
            .as_slice()
            .iter()
            .position(|entry| entry.key.as_str() == key)
    }

    fn ensure_index(&mut self) {
        if self.index.is_none() && self.entries.len() >= INDEX_THRESHOLD {
            self.rebuild_index();
        }
    }

    /// Rebuild the index in a single forward pass. Later occurrences of a
    /// key overwrite earlier positions, so the map naturally records the
    /// last one.
    pub(crate) fn rebuild_index(&mut self) {
        let entries = self.entries.as_slice();
        let index = self.index.get_or_insert_with(|| {
            Box::new(KeyIndex::with_capacity(entries.len() * 2))
        });
        index.clear();
        for (pos, entry) in entries.iter().enumerate() {
            index.insert(Box::from(entry.key.as_str()), pos as u32);
        }
    }

    /// Called once after parsing a `}`: establish last-value-wins semantics
    /// over the bulk-loaded entries.
    ///
    /// Large objects build the index (one forward pass); if duplicates were
    /// present the entry list is compacted to the recorded positions and the
    /// index rebuilt. Small objects do a quadratic forward scan, erasing an
    /// entry whenever a later one has the same key.
    pub(crate) fn finalize(&mut self) {
        let n = self.entries.len();
        if n >= INDEX_THRESHOLD {
            self.rebuild_index();
            let index_len = match &self.index {
                Some(index) => index.len(),
                None => return,
            };
            if index_len < n {
                let index = match self.index.take() {
                    Some(index) => index,
                    None => return,
                };
                self.entries.retain_positions(|pos, entry| {
                    index.get(entry.key.as_str()) == Some(&(pos as u32))
                });
                self.rebuild_index();
            }
        } else if n >= 2 {
            let mut i = 0;
            while i < self.entries.len() {
                let entries = self.entries.as_slice();
                let has_later_duplicate = entries[i + 1..]
                    .iter()
                    .any(|later| later.key == entries[i].key);
                if has_later_duplicate {
                    drop(self.entries.remove(i));
                } else {
                    i += 1;
                }
            }
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Object::new()
    }
}

impl Clone for Object {
    fn clone(&self) -> Object {
        // The index is a cache; the copy rebuilds it on demand.
        Object {
            entries: self.entries.clone(),
            index: None,
        }
    }
}

impl PartialEq for Object {
    /// Structural, order-insensitive comparison. Relies on keys being
    /// unique, which parsing and the mutation API both maintain.
    fn eq(&self, other: &Object) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Object {
        let mut object = Object::new();
        for (key, value) in iter {
            object.insert(key.as_ref(), value);
        }
        object
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_preserved() {
        let mut object = Object::new();
        object.insert("b", 1i64);
        object.insert("a", 2i64);
        object.insert("c", 3i64);
        let keys: Vec<_> = object.keys().collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn insert_overwrites_and_returns_previous() {
        let mut object = Object::new();
        assert!(object.insert("k", 1i64).is_none());
        let previous = object.insert("k", 2i64);
        assert_eq!(previous.unwrap().as_integer().unwrap(), 1);
        assert_eq!(object.len(), 1);
    }

    #[test]
    fn index_builds_at_threshold_and_stays_consistent() {
        let mut object = Object::new();
        for i in 0..INDEX_THRESHOLD {
            object.insert(format!("key{i}"), i as i64);
        }
        assert!(object.index.is_none());
        // First mutable lookup at the threshold builds the index.
        assert!(object.get_mut("key3").is_some());
        assert!(object.index.is_some());

        object.insert("extra", 99i64);
        assert_eq!(object.get("extra").unwrap().as_integer().unwrap(), 99);
        assert!(object.remove("key0").is_some());
        assert_eq!(object.get("key1").unwrap().as_integer().unwrap(), 1);
        assert!(object.get("key0").is_none());
        let keys: Vec<_> = object.keys().collect();
        assert_eq!(keys[0], "key1");
    }

    #[test]
    fn finalize_small_keeps_last_occurrence() {
        let mut object = Object::new();
        object.push_entry(Str::new("a"), Value::from(1i64), None);
        object.push_entry(Str::new("b"), Value::from(2i64), None);
        object.push_entry(Str::new("a"), Value::from(3i64), None);
        object.finalize();
        assert_eq!(object.len(), 2);
        assert_eq!(object.get("a").unwrap().as_integer().unwrap(), 3);
        let keys: Vec<_> = object.keys().collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn finalize_large_compacts_duplicates() {
        let mut object = Object::new();
        for i in 0..20 {
            object.push_entry(Str::new(&format!("key{i}")), Value::from(i as i64), None);
        }
        object.push_entry(Str::new("key5"), Value::from(500i64), None);
        object.push_entry(Str::new("key7"), Value::from(700i64), None);
        object.finalize();
        assert_eq!(object.len(), 20);
        assert_eq!(object.get("key5").unwrap().as_integer().unwrap(), 500);
        assert_eq!(object.get("key7").unwrap().as_integer().unwrap(), 700);
        assert_eq!(object.get("key4").unwrap().as_integer().unwrap(), 4);
        assert_eq!(object.index.as_ref().map(|index| index.len()), Some(20));
    }
}
