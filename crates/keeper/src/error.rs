//! Lockup module errors

use lockup_core::{Address, UnlockDate, ValidationError};
use lockup_ledger::LedgerError;
use lockup_risk::{CollaboratorError, RiskError};
use lockup_store::StoreError;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

/// Codespace of the module-registered error codes
pub const MODULE_CODESPACE: &str = "lockup";

/// Codespace of the framework-wide error codes
pub const SDK_CODESPACE: &str = "sdk";

/// Errors returned by the lockup handlers and queries
#[derive(Error, Debug)]
pub enum LockupError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Lockup not found for {address} at {unlock_date}")]
    LockupNotFound {
        address: Address,
        unlock_date: UnlockDate,
    },

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Unauthorized: caller {caller} cannot act for {address}")]
    Unauthorized { caller: Address, address: Address },

    #[error("Insufficient delegations for {address}: delegated {delegated} < locked {locked}")]
    InsufficientDelegations {
        address: Address,
        delegated: lockup_core::Amount,
        locked: lockup_core::Amount,
    },

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Collaborator error: {0}")]
    Collaborator(CollaboratorError),
}

/// Stable, string-convertible classification of [`LockupError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    InvalidAddress,
    InvalidAmount,
    InvalidDate,
    InvalidRequest,
    LockupNotFound,
    InvalidAccount,
    Unauthorized,
    InsufficientDelegations,
    InsufficientFunds,
    Internal,
}

impl LockupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LockupError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            LockupError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            LockupError::InvalidDate(_) => ErrorKind::InvalidDate,
            LockupError::InvalidRequest(_) | LockupError::Config(_) => ErrorKind::InvalidRequest,
            LockupError::LockupNotFound { .. } => ErrorKind::LockupNotFound,
            LockupError::InvalidAccount(_) => ErrorKind::InvalidAccount,
            LockupError::Unauthorized { .. } => ErrorKind::Unauthorized,
            LockupError::InsufficientDelegations { .. } => ErrorKind::InsufficientDelegations,
            LockupError::InsufficientFunds(_) => ErrorKind::InsufficientFunds,
            LockupError::Ledger(_) | LockupError::Store(_) | LockupError::Collaborator(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl ErrorKind {
    /// ABCI-style code within [`ErrorKind::codespace`]
    pub fn code(&self) -> u32 {
        match self {
            ErrorKind::InvalidAccount => 1101,
            ErrorKind::InsufficientDelegations => 1102,
            ErrorKind::LockupNotFound => 1103,
            ErrorKind::InvalidDate => 1104,
            ErrorKind::InvalidAmount => 1105,
            ErrorKind::Internal => 1,
            ErrorKind::Unauthorized => 4,
            ErrorKind::InsufficientFunds => 5,
            ErrorKind::InvalidAddress => 7,
            ErrorKind::InvalidRequest => 18,
        }
    }

    pub fn codespace(&self) -> &'static str {
        match self.code() {
            1101..=1105 => MODULE_CODESPACE,
            _ => SDK_CODESPACE,
        }
    }
}

impl LockupError {
    pub fn code(&self) -> u32 {
        self.kind().code()
    }
}

impl From<ValidationError> for LockupError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::InvalidAddress { .. } => LockupError::InvalidAddress(e.to_string()),
            ValidationError::InvalidDate { .. } => LockupError::InvalidDate(e.to_string()),
            ValidationError::InvalidAmount(msg) => LockupError::InvalidAmount(msg),
            ValidationError::InvalidRequest(msg) => LockupError::InvalidRequest(msg),
        }
    }
}

impl From<RiskError> for LockupError {
    fn from(e: RiskError) -> Self {
        match e {
            RiskError::InsufficientDelegations {
                address,
                delegated,
                locked,
            } => LockupError::InsufficientDelegations {
                address,
                delegated,
                locked,
            },
            RiskError::InsufficientFunds { .. } => LockupError::InsufficientFunds(e.to_string()),
            RiskError::InvalidAddress(msg) => LockupError::InvalidAddress(msg),
            RiskError::Overflow(msg) => LockupError::InvalidAmount(format!("overflow: {msg}")),
            RiskError::Ledger(inner) => LockupError::Ledger(inner),
            RiskError::Upstream(inner) => (*inner).into(),
        }
    }
}

impl From<CollaboratorError> for LockupError {
    fn from(e: CollaboratorError) -> Self {
        match e {
            CollaboratorError::Guard(inner) => inner.into(),
            CollaboratorError::InsufficientBalance { .. } => {
                LockupError::InsufficientFunds(e.to_string())
            }
            CollaboratorError::InvalidAmount(msg) => LockupError::InvalidAmount(msg),
            CollaboratorError::InvalidAccount(msg) => LockupError::InvalidAccount(msg),
            CollaboratorError::Store(inner) => LockupError::Store(inner),
            other => LockupError::Collaborator(other),
        }
    }
}

pub type LockupResult<T> = Result<T, LockupError>;
