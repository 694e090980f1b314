//! Lockup Risk - The shared invariant checker
//!
//! Every enforcement point (ante decorator, bank send restriction, staking
//! hooks) and every lockup handler asks the same question through
//! [`InvariantChecker`]: how much of this address's locked value is not
//! backed by delegated stake, and how much of its balance may therefore
//! move?
//!
//! This crate also defines the collaborator interfaces the engine expects
//! from the bank, staking and account subsystems.

pub mod checker;
pub mod error;
pub mod expected;

pub use checker::{InvariantChecker, LockupSnapshot};
pub use error::{CollaboratorError, RiskError};
pub use expected::{
    Account, AccountKeeper, AccountKind, BalanceView, BankKeeper, Delegation, DelegationEvent,
    SendRestriction, StakingHooks, StakingKeeper, StakingView, Validator,
};
