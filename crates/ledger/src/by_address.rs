//! Per-address lock lists
//!
//! The list for an address is kept sorted ascending by unlock date with at
//! most one entry per date. An empty list is never stored.

use crate::error::LedgerError;
use crate::keys::locks_by_address_key;
use crate::lock::Lock;
use chrono::NaiveDate;
use lockup_core::{is_locked, Address, Amount, UnlockDate};
use lockup_store::KvStore;

/// All locks for `address`, oldest unlock date first. Empty if none.
pub fn get_locks(store: &dyn KvStore, address: &Address) -> Result<Vec<Lock>, LedgerError> {
    match store.get(&locks_by_address_key(address))? {
        Some(bz) => Ok(serde_json::from_slice(&bz)?),
        None => Ok(Vec::new()),
    }
}

/// Replace the stored list. An empty list deletes the record.
pub fn set_locks(
    store: &mut dyn KvStore,
    address: &Address,
    locks: &[Lock],
) -> Result<(), LedgerError> {
    let key = locks_by_address_key(address);
    if locks.is_empty() {
        store.delete(&key)?;
        return Ok(());
    }
    if locks.iter().any(|l| l.amount.is_zero()) {
        return Err(LedgerError::ZeroAmount);
    }
    store.set(&key, serde_json::to_vec(locks)?)?;
    Ok(())
}

/// Position and value of the lock at exactly `unlock_date`
pub fn find_lock(
    store: &dyn KvStore,
    address: &Address,
    unlock_date: &UnlockDate,
) -> Result<Option<(usize, Lock)>, LedgerError> {
    let locks = get_locks(store, address)?;
    Ok(locks
        .into_iter()
        .enumerate()
        .find(|(_, lock)| &lock.unlock_date == unlock_date))
}

/// Add `amount` to the bucket at `unlock_date`, creating it in sorted
/// position if needed. Returns the bucket's new amount.
pub fn upsert_lock(
    store: &mut dyn KvStore,
    address: &Address,
    unlock_date: UnlockDate,
    amount: Amount,
) -> Result<Amount, LedgerError> {
    if amount.is_zero() {
        return Err(LedgerError::ZeroAmount);
    }

    let mut locks = get_locks(&*store, address)?;
    let new_amount = match locks.binary_search_by(|l| l.unlock_date.cmp(&unlock_date)) {
        Ok(idx) => {
            let merged = locks[idx]
                .amount
                .checked_add(&amount)
                .ok_or_else(|| LedgerError::Overflow(format!("{} + {}", locks[idx].amount, amount)))?;
            locks[idx].amount = merged;
            merged
        }
        Err(idx) => {
            locks.insert(idx, Lock::new(unlock_date, amount));
            amount
        }
    };

    tracing::debug!(%address, %unlock_date, %amount, bucket = %new_amount, "Upserted lock");
    set_locks(store, address, &locks)?;
    Ok(new_amount)
}

pub fn delete_lock_at_index(
    store: &mut dyn KvStore,
    address: &Address,
    index: usize,
) -> Result<Lock, LedgerError> {
    let mut locks = get_locks(&*store, address)?;
    if index >= locks.len() {
        return Err(LedgerError::IndexOutOfRange {
            address: *address,
            index,
            len: locks.len(),
        });
    }
    let removed = locks.remove(index);
    set_locks(store, address, &locks)?;
    Ok(removed)
}

/// Replace the lock at `index`. If the date changes the list is re-sorted
/// and a same-date neighbour is merged into it.
pub fn update_lock_at_index(
    store: &mut dyn KvStore,
    address: &Address,
    index: usize,
    lock: Lock,
) -> Result<(), LedgerError> {
    if lock.amount.is_zero() {
        return Err(LedgerError::ZeroAmount);
    }

    let mut locks = get_locks(&*store, address)?;
    if index >= locks.len() {
        return Err(LedgerError::IndexOutOfRange {
            address: *address,
            index,
            len: locks.len(),
        });
    }

    if locks[index].unlock_date == lock.unlock_date {
        locks[index] = lock;
        return set_locks(store, address, &locks);
    }

    locks.remove(index);
    set_locks(store, address, &locks)?;
    upsert_lock(store, address, lock.unlock_date, lock.amount)?;
    Ok(())
}

/// Sum of the address's locks that are still locked on `day`
pub fn locked_amount(
    store: &dyn KvStore,
    address: &Address,
    day: NaiveDate,
) -> Result<Amount, LedgerError> {
    let locks = get_locks(store, address)?;
    Amount::checked_sum(
        locks
            .iter()
            .filter(|l| is_locked(day, &l.unlock_date))
            .map(|l| &l.amount),
    )
    .ok_or_else(|| LedgerError::Overflow(format!("locked total for {address}")))
}
