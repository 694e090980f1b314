//! Cross-index audit
//!
//! Recomputes both indexes from the store and compares them bucket by
//! bucket. Used by tests and by maintenance tooling after imports.

use crate::error::LedgerError;
use crate::keys::{parse_address_key, parse_expiration_key, LOCKS_BY_ADDRESS_PREFIX, LOCKS_BY_DATE_PREFIX};
use crate::lock::Lock;
use lockup_core::{Address, Amount, UnlockDate};
use lockup_store::KvStore;
use std::collections::BTreeMap;

/// A bucket whose list amount and index amount disagree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMismatch {
    pub address: Address,
    pub unlock_date: UnlockDate,
    pub list_amount: Amount,
    pub index_amount: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub addresses: usize,
    pub buckets: usize,
    pub mismatches: Vec<IndexMismatch>,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

type Buckets = BTreeMap<(Address, UnlockDate), Amount>;

fn list_buckets(store: &dyn KvStore) -> Result<(Buckets, usize), LedgerError> {
    let mut buckets = Buckets::new();
    let records = store.prefix_range(LOCKS_BY_ADDRESS_PREFIX)?;
    let addresses = records.len();

    for (key, value) in records {
        let address = parse_address_key(&key)?;
        let locks: Vec<Lock> = serde_json::from_slice(&value)?;
        for pair in locks.windows(2) {
            if pair[0].unlock_date >= pair[1].unlock_date {
                return Err(LedgerError::Corrupted(format!(
                    "lock list for {address} is not strictly sorted"
                )));
            }
        }
        for lock in locks {
            if lock.amount.is_zero() {
                return Err(LedgerError::Corrupted(format!(
                    "zero lock stored for {address} at {}",
                    lock.unlock_date
                )));
            }
            buckets.insert((address, lock.unlock_date), lock.amount);
        }
    }
    Ok((buckets, addresses))
}

fn index_buckets(store: &dyn KvStore) -> Result<Buckets, LedgerError> {
    let mut buckets = Buckets::new();
    for (key, value) in store.prefix_range(LOCKS_BY_DATE_PREFIX)? {
        let (unlock_date, address) = parse_expiration_key(&key)?;
        let amount: Amount = serde_json::from_slice(&value)?;
        buckets.insert((address, unlock_date), amount);
    }
    Ok(buckets)
}

/// Compare every list bucket against its index entry
pub fn audit_indexes(store: &dyn KvStore) -> Result<AuditReport, LedgerError> {
    let (lists, addresses) = list_buckets(store)?;
    let index = index_buckets(store)?;

    let mut report = AuditReport {
        addresses,
        buckets: lists.len(),
        mismatches: Vec::new(),
    };

    let keys: std::collections::BTreeSet<_> = lists.keys().chain(index.keys()).copied().collect();
    for key in keys {
        let list_amount = lists.get(&key).copied().unwrap_or_default();
        let index_amount = index.get(&key).copied().unwrap_or_default();
        if list_amount != index_amount {
            report.mismatches.push(IndexMismatch {
                address: key.0,
                unlock_date: key.1,
                list_amount,
                index_amount,
            });
        }
    }

    if !report.is_consistent() {
        tracing::warn!(mismatches = report.mismatches.len(), "Lock indexes disagree");
    }
    Ok(report)
}

/// Fail on the first disagreement between the two indexes
pub fn verify_index_consistency(store: &dyn KvStore) -> Result<(), LedgerError> {
    let report = audit_indexes(store)?;
    match report.mismatches.first() {
        None => Ok(()),
        Some(m) => Err(LedgerError::Corrupted(format!(
            "index mismatch for {} at {}: list {} vs index {}",
            m.address, m.unlock_date, m.list_amount, m.index_amount
        ))),
    }
}
