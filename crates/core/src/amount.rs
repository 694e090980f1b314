//! Amount - Non-negative integer amount in base token units
//!
//! Token amounts are whole numbers of the smallest denomination unit.
//! Delegation shares are decimals, so conversion from a `Decimal` is
//! explicit and always rounds up.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount overflow: {0}")]
    Overflow(String),

    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),
}

/// A non-negative integer amount of tokens.
///
/// Serialized as a decimal string so that values above 2^53 survive JSON.
///
/// # Example
/// ```
/// use lockup_core::Amount;
///
/// let amount: Amount = "1000".parse().unwrap();
/// assert_eq!(amount.value(), 1000);
/// assert!("-5".parse::<Amount>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u128);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Get the inner value
    #[inline]
    pub const fn value(&self) -> u128 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checked addition - returns None on overflow
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction - returns None if result would be negative
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Subtraction floored at zero
    pub fn saturating_sub(&self, other: &Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Convert a decimal token value to an amount, rounding up.
    ///
    /// Used for delegated stake so that fractional tokens never
    /// undercount the backing of a lock.
    pub fn from_decimal_ceil(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::NegativeAmount(value));
        }
        value
            .ceil()
            .to_u128()
            .map(Amount)
            .ok_or_else(|| AmountError::Overflow(value.to_string()))
    }

    /// Convert to a decimal for share arithmetic.
    pub fn to_decimal(&self) -> Result<Decimal, AmountError> {
        Decimal::from_u128(self.0).ok_or_else(|| AmountError::Overflow(self.0.to_string()))
    }

    /// Sum amounts, failing on overflow
    pub fn checked_sum<'a>(amounts: impl IntoIterator<Item = &'a Amount>) -> Option<Amount> {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, a| acc.checked_add(a))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(AmountError::InvalidFormat(s.to_string()));
        }
        s.parse::<u128>()
            .map(Amount)
            .map_err(|_| AmountError::Overflow(s.to_string()))
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.0.to_string()
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Amount(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(value as u128)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}
