//! Key layout

use crate::error::LedgerError;
use lockup_core::address::ADDRESS_LEN;
use lockup_core::{Address, UnlockDate};

pub const LOCKS_BY_ADDRESS_PREFIX: &[u8] = b"locks_by_address";
pub const LOCKS_BY_DATE_PREFIX: &[u8] = b"locks_by_date";

const TIMESTAMP_LEN: usize = 8;

/// `locks_by_address || addr`
pub fn locks_by_address_key(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(LOCKS_BY_ADDRESS_PREFIX.len() + ADDRESS_LEN);
    key.extend_from_slice(LOCKS_BY_ADDRESS_PREFIX);
    key.extend_from_slice(address.as_bytes());
    key
}

/// `locks_by_date || be_u64(ts)`: the first key of day `ts`
pub fn expiration_time_prefix(ts: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(LOCKS_BY_DATE_PREFIX.len() + TIMESTAMP_LEN + ADDRESS_LEN);
    key.extend_from_slice(LOCKS_BY_DATE_PREFIX);
    key.extend_from_slice(&ts.to_be_bytes());
    key
}

/// `locks_by_date || be_u64(ts) || addr`
pub fn expiration_key(unlock_date: &UnlockDate, address: &Address) -> Vec<u8> {
    let mut key = expiration_time_prefix(unlock_date.day_timestamp());
    key.extend_from_slice(address.as_bytes());
    key
}

pub fn parse_address_key(key: &[u8]) -> Result<Address, LedgerError> {
    let body = key
        .strip_prefix(LOCKS_BY_ADDRESS_PREFIX)
        .ok_or_else(|| LedgerError::Corrupted(format!("not a lock list key: {key:02x?}")))?;
    Address::from_slice(body).map_err(|e| LedgerError::Corrupted(e.to_string()))
}

pub fn parse_expiration_key(key: &[u8]) -> Result<(UnlockDate, Address), LedgerError> {
    let body = key
        .strip_prefix(LOCKS_BY_DATE_PREFIX)
        .ok_or_else(|| LedgerError::Corrupted(format!("not an expiration key: {key:02x?}")))?;
    if body.len() != TIMESTAMP_LEN + ADDRESS_LEN {
        return Err(LedgerError::Corrupted(format!(
            "expiration key has {} bytes after prefix",
            body.len()
        )));
    }

    let (ts_bytes, addr_bytes) = body.split_at(TIMESTAMP_LEN);
    let mut ts = [0u8; TIMESTAMP_LEN];
    ts.copy_from_slice(ts_bytes);
    let unlock_date = UnlockDate::from_day_timestamp(u64::from_be_bytes(ts))
        .map_err(|e| LedgerError::Corrupted(e.to_string()))?;
    let address = Address::from_slice(addr_bytes).map_err(|e| LedgerError::Corrupted(e.to_string()))?;
    Ok((unlock_date, address))
}
