//! Denom and Coin - Type-safe token denominations
//!
//! A denom follows the usual chain rules: starts with a letter, then
//! 2-127 characters from `[a-zA-Z0-9/:._-]`.

use crate::amount::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing denoms and coins
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DenomError {
    #[error("Empty denom")]
    Empty,

    #[error("Invalid denom length (3-128 chars): {0}")]
    InvalidLength(String),

    #[error("Invalid denom format: {0}")]
    InvalidFormat(String),

    #[error("Invalid coin: {0}")]
    InvalidCoin(String),
}

/// Token denomination
///
/// # Examples
/// ```
/// use lockup_core::Denom;
///
/// let denom: Denom = "utsc".parse().unwrap();
/// assert_eq!(denom.as_str(), "utsc");
/// assert!("1abc".parse::<Denom>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Denom(String);

impl Denom {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Denom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Denom {
    type Err = DenomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() {
            return Err(DenomError::Empty);
        }

        if s.len() < 3 || s.len() > 128 {
            return Err(DenomError::InvalidLength(s.to_string()));
        }

        let mut chars = s.chars();
        let leading_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let valid_rest =
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'));
        if !leading_letter || !valid_rest {
            return Err(DenomError::InvalidFormat(s.to_string()));
        }

        Ok(Denom(s.to_string()))
    }
}

impl TryFrom<String> for Denom {
    type Error = DenomError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Denom> for String {
    fn from(d: Denom) -> Self {
        d.0
    }
}

/// An amount of a single denomination
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: Denom,
    pub amount: Amount,
}

impl Coin {
    pub fn new(amount: impl Into<Amount>, denom: Denom) -> Self {
        Self {
            denom,
            amount: amount.into(),
        }
    }

    pub fn is_positive(&self) -> bool {
        self.amount.is_positive()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = DenomError;

    /// Parse `"1000utsc"` style coins
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| DenomError::InvalidCoin(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        let amount: Amount = amount
            .parse()
            .map_err(|_| DenomError::InvalidCoin(s.to_string()))?;
        Ok(Coin {
            denom: denom.parse()?,
            amount,
        })
    }
}

/// Sum the amounts of `denom` in a coin list.
///
/// Returns None on overflow.
pub fn amount_of(coins: &[Coin], denom: &Denom) -> Option<Amount> {
    Amount::checked_sum(coins.iter().filter(|c| &c.denom == denom).map(|c| &c.amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utsc() -> Denom {
        "utsc".parse().unwrap()
    }

    #[test]
    fn test_parse_denoms() {
        assert_eq!(utsc().as_str(), "utsc");
        assert!("ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2"
            .parse::<Denom>()
            .is_ok());
    }

    #[test]
    fn test_invalid_denoms() {
        assert!(matches!("".parse::<Denom>(), Err(DenomError::Empty)));
        assert!(matches!("ab".parse::<Denom>(), Err(DenomError::InvalidLength(_))));
        assert!(matches!("9abc".parse::<Denom>(), Err(DenomError::InvalidFormat(_))));
        assert!(matches!("ab c".parse::<Denom>(), Err(DenomError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_coin() {
        let coin: Coin = "1500utsc".parse().unwrap();
        assert_eq!(coin.amount, Amount::new(1500));
        assert_eq!(coin.denom, utsc());
        assert_eq!(coin.to_string(), "1500utsc");
        assert!("utsc".parse::<Coin>().is_err());
        assert!("100".parse::<Coin>().is_err());
    }

    #[test]
    fn test_amount_of() {
        let other: Denom = "uatom".parse().unwrap();
        let coins = vec![
            Coin::new(10u64, utsc()),
            Coin::new(99u64, other),
            Coin::new(5u64, utsc()),
        ];
        assert_eq!(amount_of(&coins, &utsc()), Some(Amount::new(15)));
    }
}
