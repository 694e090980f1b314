//! Ledger errors

use lockup_core::{Address, Amount, UnlockDate};
use lockup_store::StoreError;
use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Lock doesn't exist at index {index} (address {address} has {len} locks)")]
    IndexOutOfRange {
        address: Address,
        index: usize,
        len: usize,
    },

    #[error("Cannot remove {requested} from expiration index for {address} at {unlock_date}, only {stored} available")]
    ExpirationUnderflow {
        address: Address,
        unlock_date: UnlockDate,
        stored: Amount,
        requested: Amount,
    },

    #[error("Lock amount must be positive")]
    ZeroAmount,

    #[error("Amount overflow: {0}")]
    Overflow(String),

    #[error("Corrupted ledger data: {0}")]
    Corrupted(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Corrupted(e.to_string())
    }
}
