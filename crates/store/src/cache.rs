//! Write-back cache branch over a parent store

use crate::error::StoreResult;
use crate::kv::{bounds, KvStore};
use std::collections::BTreeMap;

/// Buffered branch of a parent store.
///
/// Reads see the branch's own writes first. Nothing reaches the parent until
/// [`CacheStore::write`]; dropping the branch discards it.
pub struct CacheStore<'p> {
    parent: &'p mut dyn KvStore,
    /// `None` marks a pending delete
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'p> CacheStore<'p> {
    pub fn new(parent: &'p mut dyn KvStore) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Number of buffered writes and deletes
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Flush buffered writes into the parent
    pub fn write(self) -> StoreResult<()> {
        let CacheStore { parent, writes } = self;
        tracing::debug!(writes = writes.len(), "Flushing cache branch");
        for (key, value) in writes {
            match value {
                Some(v) => parent.set(&key, v)?,
                None => parent.delete(&key)?,
            }
        }
        Ok(())
    }
}

impl KvStore for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(pending) => Ok(pending.clone()),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> StoreResult<()> {
        self.writes.insert(key.to_vec(), Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        if end.is_some_and(|e| e <= start) {
            return Ok(Vec::new());
        }

        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.range(start, end)?.into_iter().collect();

        for (key, pending) in self.writes.range::<[u8], _>(bounds(start, end)) {
            match pending {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }
}
