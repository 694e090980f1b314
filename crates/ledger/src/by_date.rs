//! Expiration index
//!
//! Keys sort by big-endian day timestamp, so a range scan from a given day
//! walks locks in unlock order.

use crate::error::LedgerError;
use crate::keys::{
    expiration_key, expiration_time_prefix, parse_expiration_key, LOCKS_BY_DATE_PREFIX,
};
use crate::lock::ExpirationEntry;
use chrono::NaiveDate;
use lockup_core::date::day_timestamp;
use lockup_core::{Address, Amount, UnlockDate};
use lockup_store::{prefix_end, KvStore};
use std::ops::ControlFlow;

fn decode_amount(bz: &[u8]) -> Result<Amount, LedgerError> {
    Ok(serde_json::from_slice(bz)?)
}

fn decode_entry(key: &[u8], value: &[u8]) -> Result<ExpirationEntry, LedgerError> {
    let (unlock_date, address) = parse_expiration_key(key)?;
    Ok(ExpirationEntry {
        address,
        unlock_date,
        amount: decode_amount(value)?,
    })
}

/// Amount indexed for `address` at `unlock_date` (zero if absent)
pub fn get_expiration_amount(
    store: &dyn KvStore,
    unlock_date: &UnlockDate,
    address: &Address,
) -> Result<Amount, LedgerError> {
    match store.get(&expiration_key(unlock_date, address))? {
        Some(bz) => decode_amount(&bz),
        None => Ok(Amount::ZERO),
    }
}

pub fn add_to_expiration_index(
    store: &mut dyn KvStore,
    unlock_date: &UnlockDate,
    address: &Address,
    amount: Amount,
) -> Result<Amount, LedgerError> {
    if amount.is_zero() {
        return Err(LedgerError::ZeroAmount);
    }

    let current = get_expiration_amount(&*store, unlock_date, address)?;
    let updated = current
        .checked_add(&amount)
        .ok_or_else(|| LedgerError::Overflow(format!("{current} + {amount}")))?;

    store.set(&expiration_key(unlock_date, address), serde_json::to_vec(&updated)?)?;
    tracing::debug!(%address, %unlock_date, %amount, total = %updated, "Added to expiration index");
    Ok(updated)
}

/// Subtract `amount` from an entry, deleting it at zero.
///
/// Removing more than is stored means the two indexes disagree and is an
/// error rather than a clamp.
pub fn remove_from_expiration_index(
    store: &mut dyn KvStore,
    unlock_date: &UnlockDate,
    address: &Address,
    amount: Amount,
) -> Result<Amount, LedgerError> {
    let key = expiration_key(unlock_date, address);
    let stored = get_expiration_amount(&*store, unlock_date, address)?;
    let remaining = stored
        .checked_sub(&amount)
        .ok_or(LedgerError::ExpirationUnderflow {
            address: *address,
            unlock_date: *unlock_date,
            stored,
            requested: amount,
        })?;

    if remaining.is_zero() {
        store.delete(&key)?;
    } else {
        store.set(&key, serde_json::to_vec(&remaining)?)?;
    }
    tracing::debug!(%address, %unlock_date, %amount, remaining = %remaining, "Removed from expiration index");
    Ok(remaining)
}

/// First key of the entries still active on `as_of_day`
fn active_start(as_of_day: NaiveDate) -> Vec<u8> {
    expiration_time_prefix(day_timestamp(as_of_day).saturating_add(1))
}

/// Walk entries still locked on `as_of_day` (timestamp strictly after the
/// day's midnight), in key order.
///
/// `start_key` resumes a previous walk. A start key before the active range
/// is clamped to it. The callback gets each raw key so callers can build a
/// continuation token, and stops the walk with `ControlFlow::Break`.
pub fn iterate_active<F>(
    store: &dyn KvStore,
    as_of_day: NaiveDate,
    start_key: Option<&[u8]>,
    mut callback: F,
) -> Result<(), LedgerError>
where
    F: FnMut(&[u8], &ExpirationEntry) -> ControlFlow<()>,
{
    let floor = active_start(as_of_day);
    let start = match start_key {
        Some(key) if key > floor.as_slice() => key.to_vec(),
        _ => floor,
    };
    let end = prefix_end(LOCKS_BY_DATE_PREFIX);

    for (key, value) in store.range(&start, end.as_deref())? {
        let entry = decode_entry(&key, &value)?;
        if callback(&key, &entry).is_break() {
            break;
        }
    }
    Ok(())
}

/// Sum of every active entry on `as_of_day`
pub fn total_active(store: &dyn KvStore, as_of_day: NaiveDate) -> Result<Amount, LedgerError> {
    let mut total = Amount::ZERO;
    let mut overflow = false;
    iterate_active(store, as_of_day, None, |_, entry| {
        match total.checked_add(&entry.amount) {
            Some(sum) => {
                total = sum;
                ControlFlow::Continue(())
            }
            None => {
                overflow = true;
                ControlFlow::Break(())
            }
        }
    })?;

    if overflow {
        return Err(LedgerError::Overflow("total active locks".to_string()));
    }
    Ok(total)
}

/// Delete every entry with timestamp at or before `cutoff_day`'s midnight.
///
/// The callback runs before each deletion and receives the store so it can
/// make the matching list change; an error aborts the sweep. Returns the
/// number of entries removed.
pub fn iterate_and_purge_expired<F, E>(
    store: &mut dyn KvStore,
    cutoff_day: NaiveDate,
    mut callback: F,
) -> Result<usize, E>
where
    F: FnMut(&mut dyn KvStore, &ExpirationEntry) -> Result<(), E>,
    E: From<LedgerError>,
{
    let end = expiration_time_prefix(day_timestamp(cutoff_day).saturating_add(1));
    let expired = store
        .range(LOCKS_BY_DATE_PREFIX, Some(end.as_slice()))
        .map_err(LedgerError::from)?;

    let mut purged = 0;
    for (key, value) in expired {
        let entry = decode_entry(&key, &value)?;
        callback(&mut *store, &entry)?;
        store.delete(&key).map_err(LedgerError::from)?;
        purged += 1;
    }

    if purged > 0 {
        tracing::debug!(%cutoff_day, purged, "Purged expired index entries");
    }
    Ok(purged)
}
