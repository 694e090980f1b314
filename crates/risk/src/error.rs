//! Risk and collaborator errors

use lockup_core::{Address, Amount, ValidatorAddress};
use lockup_ledger::LedgerError;
use lockup_store::StoreError;
use thiserror::Error;

/// Invariant violations and failures while evaluating them
#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Insufficient unlocked balance for {address}: available {available}, required {required} (locked: {locked}, delegated: {delegated})")]
    InsufficientFunds {
        address: Address,
        available: Amount,
        required: Amount,
        locked: Amount,
        delegated: Amount,
    },

    #[error("Insufficient delegations for {address}: delegated {delegated} < locked {locked}")]
    InsufficientDelegations {
        address: Address,
        delegated: Amount,
        locked: Amount,
    },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Amount overflow: {0}")]
    Overflow(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Collaborator error: {0}")]
    Upstream(Box<CollaboratorError>),
}

impl From<CollaboratorError> for RiskError {
    fn from(e: CollaboratorError) -> Self {
        match e {
            CollaboratorError::Guard(inner) => inner,
            other => RiskError::Upstream(Box::new(other)),
        }
    }
}

/// Errors surfaced by the bank, staking and account subsystems
#[derive(Error, Debug)]
pub enum CollaboratorError {
    /// A registered guard rejected the operation
    #[error("{0}")]
    Guard(RiskError),

    #[error("Insufficient balance for {address}: available {available}, required {required}")]
    InsufficientBalance {
        address: Address,
        available: Amount,
        required: Amount,
    },

    #[error("Validator not found: {0}")]
    ValidatorNotFound(ValidatorAddress),

    #[error("Delegation not found: {delegator} -> {validator}")]
    DelegationNotFound {
        delegator: Address,
        validator: ValidatorAddress,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Corrupted state: {0}")]
    Corrupted(String),
}

impl From<RiskError> for CollaboratorError {
    fn from(e: RiskError) -> Self {
        match e {
            RiskError::Upstream(inner) => *inner,
            other => CollaboratorError::Guard(other),
        }
    }
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(e: serde_json::Error) -> Self {
        CollaboratorError::Corrupted(e.to_string())
    }
}
