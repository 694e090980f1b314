//! Lock records

use lockup_core::{Address, Amount, UnlockDate};
use serde::{Deserialize, Serialize};

/// An amount pledged until a calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub unlock_date: UnlockDate,
    pub amount: Amount,
}

impl Lock {
    pub fn new(unlock_date: UnlockDate, amount: Amount) -> Self {
        Self { unlock_date, amount }
    }
}

/// A decoded expiration index entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationEntry {
    pub address: Address,
    pub unlock_date: UnlockDate,
    pub amount: Amount,
}
