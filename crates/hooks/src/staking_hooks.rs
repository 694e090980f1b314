//! Delegation-lifecycle guard
//!
//! Staking dispatches a [`DelegationEvent`] around every change to a
//! delegation record. Reductions are checked against the locked total as
//! the delegation will be after the change; increases pass untouched.

use lockup_core::Address;
use lockup_risk::checker::delegation_amount;
use lockup_risk::{DelegationEvent, InvariantChecker, RiskError, StakingHooks, StakingView};
use lockup_store::Context;
use rust_decimal::Decimal;

pub struct LockupStakingHooks {
    page_size: usize,
}

impl LockupStakingHooks {
    pub const NAME: &'static str = "LockupStakingHooks";

    pub fn new(page_size: usize) -> Self {
        Self { page_size }
    }

    fn reject(&self, delegator: &Address, err: RiskError) -> RiskError {
        tracing::warn!(hook = Self::NAME, %delegator, error = %err, "Delegation change would unback locks");
        err
    }
}

impl StakingHooks for LockupStakingHooks {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_delegation_event(
        &self,
        ctx: &Context<'_>,
        staking: &dyn StakingView,
        event: &DelegationEvent,
    ) -> Result<(), RiskError> {
        let checker = InvariantChecker::new(staking, self.page_size);

        match event {
            DelegationEvent::BeforeSharesModified {
                delegator,
                validator,
                shares_delta,
            } => {
                if *shares_delta >= Decimal::ZERO {
                    return Ok(());
                }
                let snapshot = checker.snapshot(ctx, delegator)?;
                if snapshot.locked.is_zero() {
                    return Ok(());
                }

                let Some(delegation) = staking.get_delegation(ctx, delegator, validator)? else {
                    return Ok(());
                };
                let val = staking.get_validator(ctx, validator)?;
                let before = delegation_amount(&val, &delegation)?;

                let mut after_record = delegation.clone();
                after_record.shares = (delegation.shares + *shares_delta).max(Decimal::ZERO);
                let after = delegation_amount(&val, &after_record)?;

                let delegated_after = snapshot
                    .delegated
                    .saturating_sub(&before)
                    .checked_add(&after)
                    .ok_or_else(|| RiskError::Overflow(format!("delegated total for {delegator}")))?;
                snapshot
                    .check_delegated_after(delegator, delegated_after)
                    .map_err(|e| self.reject(delegator, e))
            }
            DelegationEvent::BeforeRemoved {
                delegator,
                validator,
            } => {
                let snapshot = checker.snapshot(ctx, delegator)?;
                if snapshot.locked.is_zero() {
                    return Ok(());
                }
                // The record still holds its shares at this point
                let removed = checker.delegation_value(ctx, delegator, validator)?;
                let delegated_after = snapshot.delegated.saturating_sub(&removed);
                snapshot
                    .check_delegated_after(delegator, delegated_after)
                    .map_err(|e| self.reject(delegator, e))
            }
            DelegationEvent::AfterModified {
                delegator,
                shares_delta,
                ..
            } => {
                if *shares_delta >= Decimal::ZERO {
                    return Ok(());
                }
                let snapshot = checker.snapshot(ctx, delegator)?;
                snapshot
                    .check_delegated_after(delegator, snapshot.delegated)
                    .map_err(|e| self.reject(delegator, e))
            }
        }
    }
}
