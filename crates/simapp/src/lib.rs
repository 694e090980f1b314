//! Lockup SimApp - In-memory chain harness
//!
//! Bank, staking and account collaborators backed by the same KV store as
//! the lockup ledger, wired to the lockup keeper and its three guards. Used
//! to exercise the engine end to end.

pub mod accounts;
pub mod app;
pub mod bank;
pub mod error;
pub mod staking;

pub use accounts::{module_address, SimAccounts};
pub use app::{Modules, SimApp};
pub use bank::SimBank;
pub use error::{AppError, AppResult};
pub use staking::SimStaking;
