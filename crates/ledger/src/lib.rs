//! Lockup Ledger - Lock storage and indexing
//!
//! Two keyspaces hold every lock:
//! - `locks_by_address || addr` -> the address's lock list, sorted by date
//! - `locks_by_date || be_u64(day_ts) || addr` -> amount unlocking that day
//!
//! The second is derived from the first. For every address the index
//! entries sum to the list amounts; [`audit`] checks exactly that.
//!
//! This crate is pure storage. Callers pair list and index mutations.

pub mod audit;
pub mod by_address;
pub mod by_date;
pub mod error;
pub mod keys;
pub mod lock;

pub use audit::{audit_indexes, verify_index_consistency, AuditReport, IndexMismatch};
pub use by_address::{
    delete_lock_at_index, find_lock, get_locks, locked_amount, set_locks, update_lock_at_index,
    upsert_lock,
};
pub use by_date::{
    add_to_expiration_index, get_expiration_amount, iterate_active, iterate_and_purge_expired,
    remove_from_expiration_index, total_active,
};
pub use error::LedgerError;
pub use lock::{ExpirationEntry, Lock};
