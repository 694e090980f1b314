//! Pre-execution guard and the ante chain that runs it

use std::sync::Arc;

use crate::error::{HookError, HookResult};
use crate::msgs::{Authorization, Tx, TxMsg};
use crate::traits::AnteDecorator;
use lockup_core::{amount_of, Address, Amount, Coin, Denom};
use lockup_risk::{BalanceView, InvariantChecker, RiskError, StakingView};
use lockup_store::Context;

/// Ordered set of ante decorators
///
/// Decorators run in priority order (lower = first); the first rejection
/// aborts the transaction.
#[derive(Default)]
pub struct AnteChain {
    decorators: Vec<Arc<dyn AnteDecorator>>,
}

impl AnteChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, decorator: Arc<dyn AnteDecorator>) {
        self.decorators.push(decorator);
        self.decorators.sort_by_key(|d| d.priority());
    }

    pub fn with(mut self, decorator: Arc<dyn AnteDecorator>) -> Self {
        self.register(decorator);
        self
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    pub fn run(&self, ctx: &Context<'_>, tx: &Tx) -> HookResult<()> {
        for decorator in &self.decorators {
            if let Err(e) = decorator.ante_handle(ctx, tx) {
                tracing::warn!(
                    hook = decorator.name(),
                    error = %e,
                    "Ante decorator rejected transaction"
                );
                return Err(e);
            }
            tracing::debug!(hook = decorator.name(), "Ante decorator passed");
        }
        Ok(())
    }
}

/// Rejects transactions whose messages would spend locked value that is
/// not backed by delegation, or undelegate below the locked total.
///
/// Advisory: the send restriction and staking hooks enforce the same rule
/// at execution time.
pub struct LockupAnteDecorator {
    bank: Arc<dyn BalanceView>,
    staking: Arc<dyn StakingView>,
    page_size: usize,
}

impl LockupAnteDecorator {
    pub const NAME: &'static str = "LockupAnte";

    pub fn new(bank: Arc<dyn BalanceView>, staking: Arc<dyn StakingView>, page_size: usize) -> Self {
        Self {
            bank,
            staking,
            page_size,
        }
    }

    fn checker(&self) -> InvariantChecker<'_, dyn StakingView> {
        InvariantChecker::new(&*self.staking, self.page_size)
    }

    /// Bond-denom total of `coins` leaving `from` must fit the ceiling
    fn check_spend(&self, ctx: &Context<'_>, from: &Address, coins: &[Coin]) -> HookResult<()> {
        let bond_denom = self.staking.bond_denom();
        let required = bond_amount(coins, bond_denom)?;
        if required.is_zero() {
            return Ok(());
        }

        let snapshot = self.checker().snapshot(ctx, from)?;
        if snapshot.is_backed() {
            return Ok(());
        }

        let balance = self.bank.get_balance(ctx, from, bond_denom)?;
        snapshot
            .check_spend(from, balance, required)
            .map_err(|e| HookError::rejected(Self::NAME, e))
    }

    fn check_undelegate(&self, ctx: &Context<'_>, delegator: &Address, amount: &Coin) -> HookResult<()> {
        if &amount.denom != self.staking.bond_denom() {
            return Ok(());
        }

        let snapshot = self.checker().snapshot(ctx, delegator)?;
        let delegated_after = snapshot.delegated.saturating_sub(&amount.amount);
        snapshot
            .check_delegated_after(delegator, delegated_after)
            .map_err(|e| HookError::rejected(Self::NAME, e))
    }

    fn handle_msgs(&self, ctx: &Context<'_>, msgs: &[TxMsg]) -> HookResult<()> {
        for msg in msgs {
            match msg {
                TxMsg::Send { from, amount, .. } => self.check_spend(ctx, from, amount)?,
                TxMsg::MultiSend { inputs, .. } => {
                    for input in inputs {
                        self.check_spend(ctx, &input.address, &input.coins)?;
                    }
                }
                TxMsg::Grant {
                    granter,
                    authorization,
                    ..
                } => {
                    if let Authorization::Send { spend_limit } = authorization {
                        self.check_spend(ctx, granter, spend_limit)?;
                    }
                }
                TxMsg::Exec { msgs, .. } => self.handle_msgs(ctx, msgs)?,
                TxMsg::Undelegate {
                    delegator, amount, ..
                } => self.check_undelegate(ctx, delegator, amount)?,
                TxMsg::Deposit {
                    depositor, amount, ..
                }
                | TxMsg::FundCommunityPool { depositor, amount }
                | TxMsg::DepositValidatorRewardsPool {
                    depositor, amount, ..
                } => self.check_spend(ctx, depositor, amount)?,
                TxMsg::GrantAllowance {
                    granter, allowance, ..
                } => {
                    if let Some(limit) = allowance.spend_limit() {
                        self.check_spend(ctx, granter, limit)?;
                    }
                }
                TxMsg::IbcTransfer { sender, token, .. } => {
                    self.check_spend(ctx, sender, std::slice::from_ref(token))?
                }
                TxMsg::Delegate { .. } | TxMsg::Lockup(_) => {}
            }
        }
        Ok(())
    }
}

fn bond_amount(coins: &[Coin], bond_denom: &Denom) -> Result<Amount, RiskError> {
    amount_of(coins, bond_denom).ok_or_else(|| RiskError::Overflow(format!("sum of {bond_denom} coins")))
}

impl AnteDecorator for LockupAnteDecorator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn ante_handle(&self, ctx: &Context<'_>, tx: &Tx) -> HookResult<()> {
        // Genesis transactions run before staking is initialised
        if ctx.block_height() == 0 {
            return Ok(());
        }
        self.handle_msgs(ctx, &tx.msgs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Reject;

    impl AnteDecorator for Reject {
        fn name(&self) -> &str {
            "Reject"
        }

        fn priority(&self) -> u32 {
            10
        }

        fn ante_handle(&self, _ctx: &Context<'_>, _tx: &Tx) -> HookResult<()> {
            Err(HookError::Risk(RiskError::InvalidAddress("nope".to_string())))
        }
    }

    struct Allow;

    impl AnteDecorator for Allow {
        fn name(&self) -> &str {
            "Allow"
        }

        fn ante_handle(&self, _ctx: &Context<'_>, _tx: &Tx) -> HookResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_chain_sorted_by_priority() {
        let chain = AnteChain::new().with(Arc::new(Allow)).with(Arc::new(Reject));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.decorators[0].name(), "Reject");
    }

    #[test]
    fn test_chain_stops_on_rejection() {
        let mut store = lockup_store::MemStore::new();
        let ctx = Context::new(&mut store, chrono::Utc::now(), 1);
        let chain = AnteChain::new().with(Arc::new(Allow)).with(Arc::new(Reject));
        assert!(chain.run(&ctx, &Tx::default()).is_err());
        assert!(AnteChain::new().with(Arc::new(Allow)).run(&ctx, &Tx::default()).is_ok());
    }
}
