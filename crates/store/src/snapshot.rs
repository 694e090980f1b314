//! JSONL store snapshots
//!
//! One line per key-value pair, both hex encoded, in key order. A snapshot
//! taken from one store and restored into an empty one reproduces it.

use crate::error::{StoreError, StoreResult};
use crate::kv::KvStore;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A single exported pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub key: String,
    pub value: String,
}

impl SnapshotEntry {
    fn from_pair(key: &[u8], value: &[u8]) -> Self {
        Self {
            key: hex::encode(key),
            value: hex::encode(value),
        }
    }

    fn decode(&self) -> StoreResult<(Vec<u8>, Vec<u8>)> {
        let key = hex::decode(&self.key)
            .map_err(|e| StoreError::InvalidSnapshot(format!("bad key {}: {e}", self.key)))?;
        let value = hex::decode(&self.value)
            .map_err(|e| StoreError::InvalidSnapshot(format!("bad value at {}: {e}", self.key)))?;
        Ok((key, value))
    }
}

/// Writes a full store export to a JSONL file
pub struct SnapshotWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SnapshotWriter {
    /// Create (or truncate) the snapshot file at `path`
    pub fn create(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Export every pair in `store`, returning the number written
    pub fn write_store(&mut self, store: &dyn KvStore) -> StoreResult<usize> {
        let pairs = store.range(&[], None)?;
        for (key, value) in &pairs {
            let json = serde_json::to_string(&SnapshotEntry::from_pair(key, value))?;
            writeln!(self.writer, "{}", json)?;
        }
        self.writer.flush()?;

        tracing::debug!(path = %self.path.display(), entries = pairs.len(), "Wrote store snapshot");
        Ok(pairs.len())
    }
}

/// Reads a JSONL snapshot back
pub struct SnapshotReader {
    path: PathBuf,
}

impl SnapshotReader {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(StoreError::InvalidSnapshot(format!(
                "{} does not exist",
                path.display()
            )));
        }
        Ok(Self { path })
    }

    /// Read all entries in file order
    pub fn read_all(&self) -> StoreResult<Vec<SnapshotEntry>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }

    /// Write every entry into `store`, returning the number restored
    pub fn restore_into(&self, store: &mut dyn KvStore) -> StoreResult<usize> {
        let entries = self.read_all()?;
        for entry in &entries {
            let (key, value) = entry.decode()?;
            store.set(&key, value)?;
        }

        tracing::debug!(path = %self.path.display(), entries = entries.len(), "Restored store snapshot");
        Ok(entries.len())
    }
}
