//! Lockup messages
//!
//! Messages carry addresses and dates in their wire (string) form, the way
//! they arrive in a transaction. `validate_basic` performs the stateless
//! checks; everything that needs the block day or the store happens in the
//! message server.

use crate::address::Address;
use crate::coin::Coin;
use crate::date::UnlockDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stateless validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid {field} address: {reason}")]
    InvalidAddress { field: &'static str, reason: String },

    #[error("invalid {field} date: {reason}")]
    InvalidDate { field: &'static str, reason: String },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

fn check_address(field: &'static str, value: &str) -> Result<Address, ValidationError> {
    value.parse().map_err(|e: crate::address::AddressError| ValidationError::InvalidAddress {
        field,
        reason: e.to_string(),
    })
}

fn check_date(field: &'static str, value: &str) -> Result<UnlockDate, ValidationError> {
    value.parse().map_err(|e: crate::date::DateError| ValidationError::InvalidDate {
        field,
        reason: e.to_string(),
    })
}

fn check_positive(coin: &Coin) -> Result<(), ValidationError> {
    if coin.is_positive() {
        Ok(())
    } else {
        Err(ValidationError::InvalidAmount(format!(
            "amount must be positive: {coin}"
        )))
    }
}

/// Lock `amount` of the bond denom for `address` until `unlock_date`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgLock {
    pub address: String,
    pub unlock_date: String,
    pub amount: Coin,
}

impl MsgLock {
    pub fn new(address: impl Into<String>, unlock_date: impl Into<String>, amount: Coin) -> Self {
        Self {
            address: address.into(),
            unlock_date: unlock_date.into(),
            amount,
        }
    }

    pub fn validate_basic(&self) -> Result<(), ValidationError> {
        check_address("lock", &self.address)?;
        check_date("unlock", &self.unlock_date)?;
        check_positive(&self.amount)
    }
}

/// Move `amount` from the `from_date` bucket to the `to_date` bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub from_date: String,
    pub to_date: String,
    pub amount: Coin,
}

impl Extension {
    pub fn new(from_date: impl Into<String>, to_date: impl Into<String>, amount: Coin) -> Self {
        Self {
            from_date: from_date.into(),
            to_date: to_date.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgExtend {
    pub address: String,
    pub extensions: Vec<Extension>,
}

impl MsgExtend {
    pub fn new(address: impl Into<String>, extensions: Vec<Extension>) -> Self {
        Self {
            address: address.into(),
            extensions,
        }
    }

    pub fn validate_basic(&self) -> Result<(), ValidationError> {
        check_address("extending", &self.address)?;

        if self.extensions.is_empty() {
            return Err(ValidationError::InvalidRequest(
                "at least one extension is required".to_string(),
            ));
        }

        for (i, extension) in self.extensions.iter().enumerate() {
            let from = check_date("from", &extension.from_date)?;
            let to = check_date("to", &extension.to_date)?;
            check_positive(&extension.amount)?;
            if to <= from {
                return Err(ValidationError::InvalidRequest(format!(
                    "extension {i}: to date {to} must be after from date {from}"
                )));
            }
        }

        Ok(())
    }
}

/// Send from `from_address`, delegate as `to_address`, then lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSendDelegateAndLock {
    pub from_address: String,
    pub to_address: String,
    pub validator_address: String,
    pub unlock_date: String,
    pub amount: Coin,
}

impl MsgSendDelegateAndLock {
    pub fn validate_basic(&self) -> Result<(), ValidationError> {
        check_address("from", &self.from_address)?;
        check_address("to", &self.to_address)?;
        self.validator_address
            .parse::<crate::address::ValidatorAddress>()
            .map_err(|e| ValidationError::InvalidAddress {
                field: "validator",
                reason: e.to_string(),
            })?;
        check_date("unlock", &self.unlock_date)?;
        check_positive(&self.amount)
    }
}

/// One recipient of a multi send-delegate-and-lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSendDelegateAndLockOutput {
    pub to_address: String,
    pub validator_address: String,
    pub unlock_date: String,
    pub amount: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMultiSendDelegateAndLock {
    pub from_address: String,
    pub total_amount: Coin,
    pub outputs: Vec<MultiSendDelegateAndLockOutput>,
}

impl MsgMultiSendDelegateAndLock {
    pub fn validate_basic(&self) -> Result<(), ValidationError> {
        check_address("from", &self.from_address)?;
        if self.outputs.is_empty() {
            return Err(ValidationError::InvalidRequest(
                "at least one output is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Expand into one send-delegate-and-lock per output
    pub fn split(&self) -> Vec<MsgSendDelegateAndLock> {
        self.outputs
            .iter()
            .map(|output| MsgSendDelegateAndLock {
                from_address: self.from_address.clone(),
                to_address: output.to_address.clone(),
                validator_address: output.validator_address.clone(),
                unlock_date: output.unlock_date.clone(),
                amount: output.amount.clone(),
            })
            .collect()
    }
}

/// Any lockup message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LockupMsg {
    Lock(MsgLock),
    Extend(MsgExtend),
    SendDelegateAndLock(MsgSendDelegateAndLock),
    MultiSendDelegateAndLock(MsgMultiSendDelegateAndLock),
}

impl LockupMsg {
    /// The address whose authorization the message requires
    pub fn signer(&self) -> &str {
        match self {
            LockupMsg::Lock(m) => &m.address,
            LockupMsg::Extend(m) => &m.address,
            LockupMsg::SendDelegateAndLock(m) => &m.from_address,
            LockupMsg::MultiSendDelegateAndLock(m) => &m.from_address,
        }
    }

    pub fn validate_basic(&self) -> Result<(), ValidationError> {
        match self {
            LockupMsg::Lock(m) => m.validate_basic(),
            LockupMsg::Extend(m) => m.validate_basic(),
            LockupMsg::SendDelegateAndLock(m) => m.validate_basic(),
            LockupMsg::MultiSendDelegateAndLock(m) => m.validate_basic(),
        }
    }
}
