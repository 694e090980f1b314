//! Lockup Keeper - Lock handlers, queries and maintenance
//!
//! - `msg_server`: Lock, Extend, SendDelegateAndLock, MultiSendDelegateAndLock
//! - `query`: Locks, ActiveLocks, TotalLockedAmount, AccountLocks
//! - `sweep`: expired lock purge
//! - `contract`: contract VM entry point

pub mod config;
pub mod contract;
pub mod error;
pub mod events;
pub mod keeper;
pub mod msg_server;
pub mod query;
pub mod sweep;

pub use config::LockupConfig;
pub use contract::ContractGateway;
pub use error::{ErrorKind, LockupError, LockupResult};
pub use events::EventType;
pub use keeper::{credit_lock, debit_lock, Keeper};
pub use query::{
    parse_address_list, AccountLocksResource, ActiveLockResource, LockResource, PageRequest,
    PageResponse, QueryAccountLocksResponse, QueryActiveLocksResponse, QueryLocksResponse,
};
