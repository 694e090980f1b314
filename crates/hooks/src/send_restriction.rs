//! Universal transfer guard
//!
//! Registered on the bank, so it sees every transfer no matter which
//! message, contract call or relayer packet caused it.

use std::sync::Arc;

use lockup_core::{amount_of, Address, Coin};
use lockup_risk::{BalanceView, InvariantChecker, RiskError, SendRestriction, StakingView};
use lockup_store::Context;

pub struct LockupSendRestriction {
    staking: Arc<dyn StakingView>,
    page_size: usize,
}

impl LockupSendRestriction {
    pub const NAME: &'static str = "LockupSendRestriction";

    pub fn new(staking: Arc<dyn StakingView>, page_size: usize) -> Self {
        Self { staking, page_size }
    }
}

impl SendRestriction for LockupSendRestriction {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn check(
        &self,
        ctx: &Context<'_>,
        bank: &dyn BalanceView,
        from: &Address,
        to: &Address,
        coins: &[Coin],
    ) -> Result<Address, RiskError> {
        let bond_denom = self.staking.bond_denom();
        let required = amount_of(coins, bond_denom)
            .ok_or_else(|| RiskError::Overflow(format!("sum of {bond_denom} coins")))?;
        if required.is_zero() {
            return Ok(*to);
        }

        let checker = InvariantChecker::new(&*self.staking, self.page_size);
        let snapshot = checker.snapshot(ctx, from)?;
        if snapshot.is_backed() {
            return Ok(*to);
        }

        let balance = bank.get_balance(ctx, from, bond_denom)?;
        if let Err(e) = snapshot.check_spend(from, balance, required) {
            tracing::warn!(
                hook = Self::NAME,
                %from,
                %to,
                %required,
                exposure = %snapshot.exposure(),
                "Transfer would spend locked funds"
            );
            return Err(e);
        }
        Ok(*to)
    }
}
