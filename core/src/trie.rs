//! Prefix Index: string keys with dense integer ordinals.
use ahash::AHashMap;

use crate::error::{ModelError, Result};

/// Associative store from non-empty string keys to records.
///
/// Every key receives an ordinal the first time it is stored: the number of
/// keys already present. Ordinals are dense, never reused and never
/// renumbered, so other structures can reference a key by its ordinal alone
/// and resolve it back through [`PrefixIndex::key`].
///
/// # Example
/// ```
/// use anomalia_core::trie::PrefixIndex;
///
/// let mut index = PrefixIndex::new();
/// assert_eq!(index.put("gatto", 3u32).unwrap(), 0);
/// assert_eq!(index.put("cane", 1u32).unwrap(), 1);
///
/// assert_eq!(index.get("gatto"), Some(&3));
/// assert_eq!(index.key(1), Some("cane"));
/// assert!(index.put("", 0).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct PrefixIndex<T> {
    ordinals: AHashMap<String, u32>,
    /// ordinal -> key
    keys: Vec<String>,
    /// ordinal -> record
    records: Vec<T>,
}

impl<T> PrefixIndex<T> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            ordinals: AHashMap::new(),
            keys: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Record stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&T> {
        let ordinal = *self.ordinals.get(key)?;
        self.records.get(ordinal as usize)
    }

    /// Mutable record stored under `key`, if any.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        let ordinal = *self.ordinals.get(key)?;
        self.records.get_mut(ordinal as usize)
    }

    /// Store `record` under `key` and return the key's ordinal.
    ///
    /// An existing key keeps its ordinal and has its record replaced.
    pub fn put(&mut self, key: &str, record: T) -> Result<u32> {
        if key.is_empty() {
            return Err(ModelError::EmptyKey);
        }
        if let Some(&ordinal) = self.ordinals.get(key) {
            self.records[ordinal as usize] = record;
            return Ok(ordinal);
        }
        let ordinal = self.keys.len() as u32;
        self.ordinals.insert(key.to_string(), ordinal);
        self.keys.push(key.to_string());
        self.records.push(record);
        Ok(ordinal)
    }

    /// Return the record under `key`, creating it with `make(ordinal)` first
    /// when the key is new.
    pub fn get_or_insert_with<F>(&mut self, key: &str, make: F) -> Result<(u32, &mut T)>
    where
        F: FnOnce(u32) -> T,
    {
        if key.is_empty() {
            return Err(ModelError::EmptyKey);
        }
        let ordinal = match self.ordinals.get(key) {
            Some(&ordinal) => ordinal,
            None => {
                let ordinal = self.keys.len() as u32;
                self.ordinals.insert(key.to_string(), ordinal);
                self.keys.push(key.to_string());
                self.records.push(make(ordinal));
                ordinal
            }
        };
        Ok((ordinal, &mut self.records[ordinal as usize]))
    }

    /// Ordinal assigned to `key`.
    pub fn ordinal(&self, key: &str) -> Option<u32> {
        self.ordinals.get(key).copied()
    }

    /// Key that was assigned `ordinal`.
    pub fn key(&self, ordinal: u32) -> Option<&str> {
        self.keys.get(ordinal as usize).map(String::as_str)
    }

    /// Record stored for `ordinal`.
    pub fn record(&self, ordinal: u32) -> Option<&T> {
        self.records.get(ordinal as usize)
    }

    /// Mutable record stored for `ordinal`.
    pub fn record_mut(&mut self, ordinal: u32) -> Option<&mut T> {
        self.records.get_mut(ordinal as usize)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ordinals.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// All keys in ordinal order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.keys.iter().map(String::as_str)
    }

    /// `(ordinal, key, record)` triples in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str, &T)> + '_ {
        self.keys
            .iter()
            .zip(self.records.iter())
            .enumerate()
            .map(|(i, (k, r))| (i as u32, k.as_str(), r))
    }
}

impl<T> Default for PrefixIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_are_dense_and_stable() {
        let mut index = PrefixIndex::new();
        assert_eq!(index.put("il", ()).unwrap(), 0);
        assert_eq!(index.put("gatto", ()).unwrap(), 1);
        assert_eq!(index.put("corre", ()).unwrap(), 2);
        // re-putting keeps the ordinal
        assert_eq!(index.put("il", ()).unwrap(), 0);
        assert_eq!(index.size(), 3);

        assert_eq!(index.ordinal("gatto"), Some(1));
        assert_eq!(index.key(2), Some("corre"));
        assert_eq!(index.key(3), None);
    }

    #[test]
    fn put_replaces_record() {
        let mut index = PrefixIndex::new();
        index.put("città", 1u32).unwrap();
        index.put("città", 7u32).unwrap();
        assert_eq!(index.get("città"), Some(&7));
        assert_eq!(index.size(), 1);
    }

    #[test]
    fn empty_keys_are_rejected() {
        let mut index: PrefixIndex<u32> = PrefixIndex::new();
        assert_eq!(index.put("", 1), Err(ModelError::EmptyKey));
        assert!(index.get_or_insert_with("", |_| 0).is_err());
        assert!(index.is_empty());
    }

    #[test]
    fn get_or_insert_with_sees_ordinal() {
        let mut index = PrefixIndex::new();
        index.put("a", 0u32).unwrap();
        let (ordinal, record) = index.get_or_insert_with("b", |o| o * 10).unwrap();
        assert_eq!(ordinal, 1);
        assert_eq!(*record, 10);
        *record += 1;

        let (ordinal, record) = index.get_or_insert_with("b", |_| 99).unwrap();
        assert_eq!(ordinal, 1);
        assert_eq!(*record, 11);
    }

    #[test]
    fn keys_follow_ordinal_order() {
        let mut index = PrefixIndex::new();
        for k in ["perché", "però", "poi"] {
            index.put(k, k.len()).unwrap();
        }
        let keys: Vec<&str> = index.keys().collect();
        assert_eq!(keys, vec!["perché", "però", "poi"]);

        let triples: Vec<(u32, &str, usize)> = index.iter().map(|(o, k, r)| (o, k, *r)).collect();
        assert_eq!(triples[1], (1, "però", "però".len()));
    }
}
