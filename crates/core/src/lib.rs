//! Lockup Core - Domain types
//!
//! This crate contains the fundamental types used across the lockup engine:
//! - `Amount`: Non-negative integer token amount
//! - `Denom` / `Coin`: Type-safe denominations
//! - `Address` / `ValidatorAddress`: 20-byte identifiers
//! - `UnlockDate`: Calendar-day unlock dates
//! - Lockup messages (`MsgLock`, `MsgExtend`, ...)

pub mod address;
pub mod amount;
pub mod coin;
pub mod date;
pub mod msgs;

pub use address::{Address, AddressError, ValidatorAddress};
pub use amount::{Amount, AmountError};
pub use coin::{amount_of, Coin, Denom, DenomError};
pub use date::{block_day, is_locked, DateError, UnlockDate};
pub use msgs::{
    Extension, LockupMsg, MsgExtend, MsgLock, MsgMultiSendDelegateAndLock,
    MsgSendDelegateAndLock, MultiSendDelegateAndLockOutput, ValidationError,
};
