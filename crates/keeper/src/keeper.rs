//! Lockup keeper
//!
//! Owns the collaborator handles and the only two functions that mutate the
//! lock ledger: [`credit_lock`] and [`debit_lock`]. Each of them changes the
//! per-address list and the expiration index together.

use crate::config::LockupConfig;
use crate::error::{LockupError, LockupResult};
use lockup_core::{Address, Amount, Denom, UnlockDate};
use lockup_ledger::{
    add_to_expiration_index, delete_lock_at_index, find_lock, remove_from_expiration_index,
    update_lock_at_index, upsert_lock, Lock,
};
use lockup_risk::{
    Account, AccountKeeper, AccountKind, BankKeeper, InvariantChecker, StakingKeeper,
};
use lockup_store::{Context, KvStore};
use std::sync::Arc;

pub struct Keeper {
    config: LockupConfig,
    pub(crate) bank: Arc<dyn BankKeeper>,
    pub(crate) staking: Arc<dyn StakingKeeper>,
    pub(crate) accounts: Arc<dyn AccountKeeper>,
}

impl Keeper {
    pub fn new(
        config: LockupConfig,
        bank: Arc<dyn BankKeeper>,
        staking: Arc<dyn StakingKeeper>,
        accounts: Arc<dyn AccountKeeper>,
    ) -> LockupResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            bank,
            staking,
            accounts,
        })
    }

    pub fn config(&self) -> &LockupConfig {
        &self.config
    }

    pub fn bond_denom(&self) -> &Denom {
        self.staking.bond_denom()
    }

    pub fn checker(&self) -> InvariantChecker<'_, dyn StakingKeeper> {
        InvariantChecker::new(&*self.staking, self.config.delegation_page_size)
    }

    /// Tag `address` as lock-bearing, creating the record if needed
    pub(crate) fn materialize_lock_account(
        &self,
        ctx: &mut Context<'_>,
        address: &Address,
    ) -> LockupResult<()> {
        match self.accounts.get_account(ctx, address)? {
            Some(account) if account.is_lock_bearing() => Ok(()),
            Some(Account {
                kind: AccountKind::Module { name },
                ..
            }) => Err(LockupError::InvalidAccount(format!(
                "module account {name} ({address}) cannot hold locks"
            ))),
            Some(_) | None => {
                tracing::debug!(%address, "Marking account lock-bearing");
                self.accounts
                    .set_account(ctx, Account::new(*address, AccountKind::LockBearing))?;
                Ok(())
            }
        }
    }

    /// Reject module accounts before anything is written
    pub(crate) fn check_lockable_account(
        &self,
        ctx: &Context<'_>,
        address: &Address,
    ) -> LockupResult<()> {
        match self.accounts.get_account(ctx, address)? {
            Some(Account {
                kind: AccountKind::Module { name },
                ..
            }) => Err(LockupError::InvalidAccount(format!(
                "module account {name} ({address}) cannot hold locks"
            ))),
            _ => Ok(()),
        }
    }

    /// The account must already exist and be lock-bearing
    pub(crate) fn require_lock_account(
        &self,
        ctx: &Context<'_>,
        address: &Address,
    ) -> LockupResult<()> {
        match self.accounts.get_account(ctx, address)? {
            Some(account) if account.is_lock_bearing() => Ok(()),
            Some(_) => Err(LockupError::InvalidAccount(format!(
                "account is not a lock-bearing account: {address}"
            ))),
            None => Err(LockupError::InvalidAccount(format!(
                "no account found for address: {address}"
            ))),
        }
    }
}

/// Add `amount` to the `(address, unlock_date)` bucket in both indexes.
/// Returns the bucket's new amount.
pub fn credit_lock(
    store: &mut dyn KvStore,
    address: &Address,
    unlock_date: UnlockDate,
    amount: Amount,
) -> LockupResult<Amount> {
    let bucket = upsert_lock(store, address, unlock_date, amount)?;
    add_to_expiration_index(store, &unlock_date, address, amount)?;
    Ok(bucket)
}

/// Remove `amount` from the `(address, unlock_date)` bucket in both
/// indexes. The bucket is deleted when it reaches zero. Returns what is
/// left in it.
pub fn debit_lock(
    store: &mut dyn KvStore,
    address: &Address,
    unlock_date: UnlockDate,
    amount: Amount,
) -> LockupResult<Amount> {
    let (index, existing) =
        find_lock(&*store, address, &unlock_date)?.ok_or(LockupError::LockupNotFound {
            address: *address,
            unlock_date,
        })?;

    let remaining = existing
        .amount
        .checked_sub(&amount)
        .ok_or_else(|| {
            LockupError::InvalidRequest(format!(
                "amount {amount} exceeds lock of {} at {unlock_date}",
                existing.amount
            ))
        })?;

    if remaining.is_zero() {
        delete_lock_at_index(store, address, index)?;
    } else {
        update_lock_at_index(store, address, index, Lock::new(unlock_date, remaining))?;
    }
    remove_from_expiration_index(store, &unlock_date, address, amount)?;
    Ok(remaining)
}
