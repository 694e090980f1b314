//! Account and validator addresses
//!
//! Both are 20-byte identifiers rendered as `0x`-prefixed lowercase hex.
//! They are distinct types so a validator operator can never be passed
//! where an account is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of every address in bytes
pub const ADDRESS_LEN: usize = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Empty address")]
    Empty,

    #[error("Invalid hex in address {0}")]
    InvalidHex(String),

    #[error("Invalid address length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

fn decode(s: &str) -> Result<[u8; ADDRESS_LEN], AddressError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AddressError::Empty);
    }
    let body = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let bytes = hex::decode(body).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| AddressError::InvalidLength {
            expected: ADDRESS_LEN,
            actual: bytes.len(),
        })
}

macro_rules! address_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name([u8; ADDRESS_LEN]);

        impl $name {
            pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Decode from raw key bytes
            pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
                bytes
                    .try_into()
                    .map(Self)
                    .map_err(|_| AddressError::InvalidLength {
                        expected: ADDRESS_LEN,
                        actual: bytes.len(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = AddressError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode(s).map(Self)
            }
        }

        impl TryFrom<String> for $name {
            type Error = AddressError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(addr: $name) -> Self {
                addr.to_string()
            }
        }
    };
}

address_type!(
    /// Account address
    Address
);

address_type!(
    /// Validator operator address
    ValidatorAddress
);
