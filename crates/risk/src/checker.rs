//! Invariant checker
//!
//! `exposure = max(0, locked - delegated)` is the part of an address's
//! locked value that staking does not back, so it must stay in the bank
//! balance. `spendable_ceiling = max(0, balance - exposure)`.

use crate::error::RiskError;
use crate::expected::{Delegation, StakingView, Validator};
use lockup_core::{Address, Amount, ValidatorAddress};
use lockup_store::Context;

/// Locked and delegated totals for one address on one day.
///
/// Pure: every guard and handler derives its verdict from these two numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockupSnapshot {
    pub locked: Amount,
    pub delegated: Amount,
}

impl LockupSnapshot {
    pub fn new(locked: Amount, delegated: Amount) -> Self {
        Self { locked, delegated }
    }

    /// Locked value not backed by delegation
    pub fn exposure(&self) -> Amount {
        self.locked.saturating_sub(&self.delegated)
    }

    /// How much of `balance` may leave the account
    pub fn spendable_ceiling(&self, balance: Amount) -> Amount {
        balance.saturating_sub(&self.exposure())
    }

    /// Whether delegation covers every active lock
    pub fn is_backed(&self) -> bool {
        self.exposure().is_zero()
    }

    /// Reject spending `required` out of `balance` when it would dip into
    /// the exposure. Fully backed addresses are never restricted here.
    pub fn check_spend(
        &self,
        address: &Address,
        balance: Amount,
        required: Amount,
    ) -> Result<(), RiskError> {
        if self.is_backed() {
            return Ok(());
        }
        let available = self.spendable_ceiling(balance);
        if required > available {
            return Err(RiskError::InsufficientFunds {
                address: *address,
                available,
                required,
                locked: self.locked,
                delegated: self.delegated,
            });
        }
        Ok(())
    }

    /// Reject a delegation change that would leave `delegated_after` below
    /// the locked total
    pub fn check_delegated_after(
        &self,
        address: &Address,
        delegated_after: Amount,
    ) -> Result<(), RiskError> {
        if delegated_after < self.locked {
            return Err(RiskError::InsufficientDelegations {
                address: *address,
                delegated: delegated_after,
                locked: self.locked,
            });
        }
        Ok(())
    }

    /// Reject adding `additional` to the locks unless delegation backs the
    /// new total
    pub fn check_new_lock(&self, address: &Address, additional: Amount) -> Result<(), RiskError> {
        let locked_after = self
            .locked
            .checked_add(&additional)
            .ok_or_else(|| RiskError::Overflow(format!("{} + {additional}", self.locked)))?;
        if self.delegated < locked_after {
            return Err(RiskError::InsufficientDelegations {
                address: *address,
                delegated: self.delegated,
                locked: locked_after,
            });
        }
        Ok(())
    }
}

/// Token value of a delegation, rounded up
pub fn delegation_amount(
    validator: &Validator,
    delegation: &Delegation,
) -> Result<Amount, RiskError> {
    let tokens = validator.tokens_from_shares(delegation.shares)?;
    Amount::from_decimal_ceil(tokens).map_err(|e| RiskError::Overflow(e.to_string()))
}

/// Reads lock and delegation totals through the ledger and staking
pub struct InvariantChecker<'k, S: StakingView + ?Sized> {
    staking: &'k S,
    page_size: usize,
}

impl<'k, S: StakingView + ?Sized> InvariantChecker<'k, S> {
    pub fn new(staking: &'k S, page_size: usize) -> Self {
        Self {
            staking,
            page_size: page_size.max(1),
        }
    }

    /// `locked` on the block day
    pub fn total_locked(&self, ctx: &Context<'_>, address: &Address) -> Result<Amount, RiskError> {
        Ok(lockup_ledger::locked_amount(ctx.store(), address, ctx.block_day())?)
    }

    /// Sum of ceil(tokens) over every delegation, paging by offset
    pub fn total_delegated(&self, ctx: &Context<'_>, address: &Address) -> Result<Amount, RiskError> {
        let mut total = Amount::ZERO;
        let mut offset = 0;

        loop {
            let page = self
                .staking
                .get_delegator_delegations(ctx, address, offset, self.page_size)?;
            for delegation in &page {
                let validator = self.staking.get_validator(ctx, &delegation.validator)?;
                let amount = delegation_amount(&validator, delegation)?;
                total = total
                    .checked_add(&amount)
                    .ok_or_else(|| RiskError::Overflow(format!("delegated total for {address}")))?;
            }
            if page.len() < self.page_size {
                break;
            }
            offset += page.len();
        }

        Ok(total)
    }

    /// Token value of one delegation, zero if it does not exist
    pub fn delegation_value(
        &self,
        ctx: &Context<'_>,
        delegator: &Address,
        validator: &ValidatorAddress,
    ) -> Result<Amount, RiskError> {
        match self.staking.get_delegation(ctx, delegator, validator)? {
            Some(delegation) => {
                let validator = self.staking.get_validator(ctx, validator)?;
                delegation_amount(&validator, &delegation)
            }
            None => Ok(Amount::ZERO),
        }
    }

    /// Snapshot for the guards. `delegated` is only filled when `locked`
    /// is positive; use [`Self::full_snapshot`] for the real delegated
    /// total of an address without active locks.
    pub fn snapshot(&self, ctx: &Context<'_>, address: &Address) -> Result<LockupSnapshot, RiskError> {
        let locked = self.total_locked(ctx, address)?;
        // Addresses without active locks never need the delegation scan
        if locked.is_zero() {
            return Ok(LockupSnapshot::default());
        }
        let delegated = self.total_delegated(ctx, address)?;
        tracing::debug!(%address, %locked, %delegated, "Lockup snapshot");
        Ok(LockupSnapshot::new(locked, delegated))
    }

    /// Snapshot with delegation always computed, for lock creation
    pub fn full_snapshot(
        &self,
        ctx: &Context<'_>,
        address: &Address,
    ) -> Result<LockupSnapshot, RiskError> {
        let locked = self.total_locked(ctx, address)?;
        let delegated = self.total_delegated(ctx, address)?;
        Ok(LockupSnapshot::new(locked, delegated))
    }

    /// `exposure(address)` on the block day
    pub fn exposure(&self, ctx: &Context<'_>, address: &Address) -> Result<Amount, RiskError> {
        Ok(self.snapshot(ctx, address)?.exposure())
    }

    pub fn spendable_ceiling(
        &self,
        ctx: &Context<'_>,
        address: &Address,
        balance: Amount,
    ) -> Result<Amount, RiskError> {
        Ok(self.snapshot(ctx, address)?.spendable_ceiling(balance))
    }
}
