//! Store errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupted value at key {key}: {reason}")]
    Corrupted { key: String, reason: String },

    #[error("Invalid snapshot file: {0}")]
    InvalidSnapshot(String),
}

impl StoreError {
    pub fn corrupted(key: &[u8], reason: impl Into<String>) -> Self {
        StoreError::Corrupted {
            key: hex::encode(key),
            reason: reason.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
