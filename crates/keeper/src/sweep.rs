//! Expired lock sweep
//!
//! Locked status is always computed against the block day, so expired
//! entries are harmless. Purging them only reclaims storage.

use crate::error::LockupResult;
use crate::events::lock_expired_event;
use crate::keeper::Keeper;
use chrono::NaiveDate;
use lockup_ledger::{delete_lock_at_index, find_lock, iterate_and_purge_expired, ExpirationEntry};
use lockup_store::{Context, KvStore};

/// Drop the list bucket matching a purged index entry
fn remove_list_bucket(store: &mut dyn KvStore, entry: &ExpirationEntry) -> LockupResult<()> {
    match find_lock(&*store, &entry.address, &entry.unlock_date)? {
        Some((index, lock)) => {
            if lock.amount != entry.amount {
                tracing::warn!(
                    address = %entry.address,
                    unlock_date = %entry.unlock_date,
                    list_amount = %lock.amount,
                    index_amount = %entry.amount,
                    "Expired bucket disagrees with expiration index"
                );
            }
            delete_lock_at_index(store, &entry.address, index)?;
        }
        None => {
            tracing::debug!(
                address = %entry.address,
                unlock_date = %entry.unlock_date,
                "No list bucket for expired index entry"
            );
        }
    }
    Ok(())
}

impl Keeper {
    /// Purge every lock whose unlock date is on or before `cutoff_day`,
    /// from both indexes. Returns the number of buckets removed.
    pub fn purge_expired(&self, ctx: &mut Context<'_>, cutoff_day: NaiveDate) -> LockupResult<usize> {
        ctx.cache_context(|ctx| {
            let mut expired = Vec::new();
            let purged = iterate_and_purge_expired(ctx.store_mut(), cutoff_day, |store, entry| -> LockupResult<()> {
                remove_list_bucket(store, entry)?;
                expired.push(*entry);
                Ok(())
            })?;

            for entry in &expired {
                ctx.emit(lock_expired_event(&entry.address, &entry.unlock_date, entry.amount));
            }
            if purged > 0 {
                tracing::info!(%cutoff_day, purged, "Purged expired locks");
            }
            Ok(purged)
        })
    }
}
