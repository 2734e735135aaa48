//! An in-memory session over a lock-free skip map.
//!
//! This is the reference [`Session`] implementation, used by the test
//! suite and useful for embedding. It provides no durability and no
//! multi-statement isolation; it does provide the full session contract,
//! including half-open range deletes and bidirectional bounded iteration.

use std::ops::Bound;

use crossbeam_skiplist::SkipMap;

use crate::errdata;
use crate::error::{Error, Result};
use crate::session::{Session, SessionIter};

/// An in-memory key/value session.
pub struct Memory {
    data: SkipMap<Vec<u8>, Vec<u8>>,
}

impl Memory {
    /// Creates a new empty session.
    pub fn new() -> Self {
        Self { data: SkipMap::new() }
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for Memory {
    type Iter<'a> = MemoryIter<'a>;

    fn insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.data.contains_key(key) {
            return Err(Error::KeyAlreadyExists);
        }
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        match self.data.get(key) {
            Some(entry) => Ok(entry.value().clone()),
            None => Err(Error::KeyNotFound),
        }
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.data.contains_key(key))
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        match self.data.remove(key) {
            Some(_) => Ok(()),
            None => Err(Error::KeyNotFound),
        }
    }

    fn delete_range(&self, lower: &[u8], upper: &[u8]) -> Result<()> {
        let doomed: Vec<Vec<u8>> = self
            .data
            .range::<[u8], _>((Bound::Included(lower), Bound::Excluded(upper)))
            .map(|entry| entry.key().clone())
            .collect();
        for key in doomed {
            self.data.remove(&key);
        }
        Ok(())
    }

    fn iterator<'a>(&'a self, lower: &[u8], upper: &[u8]) -> Result<Self::Iter<'a>> {
        Ok(MemoryIter {
            data: &self.data,
            lower: lower.to_vec(),
            upper: upper.to_vec(),
            current: None,
        })
    }
}

/// A bounded, bidirectional iterator over a [`Memory`] session.
///
/// Positioning re-seeks the skip map on every move, so concurrent writes
/// are observed but never invalidate the iterator.
pub struct MemoryIter<'a> {
    data: &'a SkipMap<Vec<u8>, Vec<u8>>,
    lower: Vec<u8>,
    upper: Vec<u8>,
    current: Option<(Vec<u8>, Vec<u8>)>,
}

impl SessionIter for MemoryIter<'_> {
    fn first(&mut self) -> bool {
        self.current = self
            .data
            .lower_bound(Bound::Included(self.lower.as_slice()))
            .filter(|entry| entry.key().as_slice() < self.upper.as_slice())
            .map(|entry| (entry.key().clone(), entry.value().clone()));
        self.current.is_some()
    }

    fn last(&mut self) -> bool {
        self.current = self
            .data
            .upper_bound(Bound::Excluded(self.upper.as_slice()))
            .filter(|entry| entry.key().as_slice() >= self.lower.as_slice())
            .map(|entry| (entry.key().clone(), entry.value().clone()));
        self.current.is_some()
    }

    fn next(&mut self) -> bool {
        let Some((key, _)) = &self.current else {
            return false;
        };
        let key = key.clone();
        self.current = self
            .data
            .lower_bound(Bound::Excluded(key.as_slice()))
            .filter(|entry| entry.key().as_slice() < self.upper.as_slice())
            .map(|entry| (entry.key().clone(), entry.value().clone()));
        self.current.is_some()
    }

    fn prev(&mut self) -> bool {
        let Some((key, _)) = &self.current else {
            return false;
        };
        let key = key.clone();
        self.current = self
            .data
            .upper_bound(Bound::Excluded(key.as_slice()))
            .filter(|entry| entry.key().as_slice() >= self.lower.as_slice())
            .map(|entry| (entry.key().clone(), entry.value().clone()));
        self.current.is_some()
    }

    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        match &self.current {
            Some((key, _)) => key,
            None => &[],
        }
    }

    fn value(&self) -> Result<Vec<u8>> {
        match &self.current {
            Some((_, value)) => Ok(value.clone()),
            None => errdata!("value read on an invalid iterator"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Memory {
        let mem = Memory::new();
        for key in [b"a", b"c", b"e", b"g"] {
            mem.put(key, b"v").expect("put failed");
        }
        mem
    }

    fn collect_forward(iter: &mut MemoryIter) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        let mut ok = iter.first();
        while ok {
            keys.push(iter.key().to_vec());
            ok = iter.next();
        }
        keys
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mem = Memory::new();
        mem.insert(b"k", b"v1").unwrap();
        assert_eq!(mem.insert(b"k", b"v2"), Err(Error::KeyAlreadyExists));
        assert_eq!(mem.get(b"k").unwrap(), b"v1");

        mem.put(b"k", b"v2").unwrap();
        assert_eq!(mem.get(b"k").unwrap(), b"v2");
    }

    #[test]
    fn test_get_and_delete_missing() {
        let mem = Memory::new();
        assert_eq!(mem.get(b"nope"), Err(Error::KeyNotFound));
        assert_eq!(mem.delete(b"nope"), Err(Error::KeyNotFound));
        assert!(!mem.exists(b"nope").unwrap());
    }

    #[test]
    fn test_iterator_half_open() {
        let mem = seeded();
        let mut iter = mem.iterator(b"c", b"g").unwrap();
        assert_eq!(collect_forward(&mut iter), vec![b"c".to_vec(), b"e".to_vec()]);
    }

    #[test]
    fn test_iterator_reverse() {
        let mem = seeded();
        let mut iter = mem.iterator(b"a", b"z").unwrap();
        let mut keys = Vec::new();
        let mut ok = iter.last();
        while ok {
            keys.push(iter.key().to_vec());
            ok = iter.prev();
        }
        assert_eq!(keys, vec![b"g".to_vec(), b"e".to_vec(), b"c".to_vec(), b"a".to_vec()]);
    }

    #[test]
    fn test_iterator_empty_interval() {
        let mem = seeded();
        let mut iter = mem.iterator(b"c", b"c").unwrap();
        assert!(!iter.first());
        assert!(!iter.last());
        assert!(!iter.valid());
        assert!(iter.value().is_err());
    }

    #[test]
    fn test_iterator_exhaustion_is_sticky() {
        let mem = seeded();
        let mut iter = mem.iterator(b"a", b"b").unwrap();
        assert!(iter.first());
        assert!(!iter.next());
        assert!(!iter.next());
        assert!(!iter.valid());
    }

    #[test]
    fn test_delete_range() {
        let mem = seeded();
        mem.delete_range(b"c", b"g").unwrap();
        assert!(!mem.exists(b"c").unwrap());
        assert!(!mem.exists(b"e").unwrap());
        assert!(mem.exists(b"a").unwrap());
        assert!(mem.exists(b"g").unwrap());
        assert_eq!(mem.len(), 2);
    }
}
