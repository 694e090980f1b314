//! Lockup Hooks - Enforcement guards
//!
//! Three independent call sites keep locked value in place:
//!
//! ```text
//! Tx received
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ ANTE CHAIN                  │ ← LockupAnteDecorator (advisory pre-flight)
//! └─────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ MESSAGE EXECUTION           │
//! │  bank.send ─────────────────┼─ LockupSendRestriction (every transfer)
//! │  staking.undelegate ────────┼─ LockupStakingHooks (every reduction)
//! └─────────────────────────────┘
//! ```
//!
//! All three delegate the arithmetic to `lockup_risk::LockupSnapshot`.

pub mod ante;
pub mod error;
pub mod msgs;
pub mod send_restriction;
pub mod staking_hooks;
pub mod traits;

pub use ante::{AnteChain, LockupAnteDecorator};
pub use error::{HookError, HookResult};
pub use msgs::{Authorization, FeeAllowance, Tx, TxMsg};
pub use send_restriction::LockupSendRestriction;
pub use staking_hooks::LockupStakingHooks;
pub use traits::AnteDecorator;
