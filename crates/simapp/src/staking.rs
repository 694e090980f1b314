//! Staking
//!
//! Validators and delegations live in the context's store. Delegation
//! changes dispatch [`DelegationEvent`]s to the registered hooks, which may
//! veto the change before anything is written.
//!
//! Unbonding completes immediately; there is no unbonding queue.

use crate::accounts::{module_address, BONDED_POOL};
use crate::bank::{add_coins, sub_coins};
use lockup_core::{Address, Amount, Coin, Denom, ValidatorAddress};
use lockup_risk::{
    CollaboratorError, Delegation, DelegationEvent, StakingHooks, StakingKeeper, StakingView,
    Validator,
};
use lockup_store::{Context, Event};
use rust_decimal::Decimal;
use std::sync::Arc;

const VALIDATORS_PREFIX: &[u8] = b"validators";
const DELEGATIONS_PREFIX: &[u8] = b"delegations";

fn validator_key(operator: &ValidatorAddress) -> Vec<u8> {
    let mut key = VALIDATORS_PREFIX.to_vec();
    key.extend_from_slice(operator.as_bytes());
    key
}

fn delegator_prefix(delegator: &Address) -> Vec<u8> {
    let mut key = DELEGATIONS_PREFIX.to_vec();
    key.extend_from_slice(delegator.as_bytes());
    key
}

fn delegation_key(delegator: &Address, validator: &ValidatorAddress) -> Vec<u8> {
    let mut key = delegator_prefix(delegator);
    key.extend_from_slice(validator.as_bytes());
    key
}

pub struct SimStaking {
    bond_denom: Denom,
    hooks: Vec<Arc<dyn StakingHooks>>,
}

impl SimStaking {
    pub fn new(bond_denom: Denom, hooks: Vec<Arc<dyn StakingHooks>>) -> Self {
        Self { bond_denom, hooks }
    }

    fn dispatch(&self, ctx: &Context<'_>, event: DelegationEvent) -> Result<(), CollaboratorError> {
        for hook in &self.hooks {
            if let Err(e) = hook.on_delegation_event(ctx, self, &event) {
                tracing::warn!(hook = hook.name(), error = %e, "Staking hook vetoed delegation change");
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn set_validator(&self, ctx: &mut Context<'_>, validator: &Validator) -> Result<(), CollaboratorError> {
        ctx.store_mut()
            .set(&validator_key(&validator.operator), serde_json::to_vec(validator)?)?;
        Ok(())
    }

    fn set_delegation(&self, ctx: &mut Context<'_>, delegation: &Delegation) -> Result<(), CollaboratorError> {
        let key = delegation_key(&delegation.delegator, &delegation.validator);
        if delegation.shares.is_zero() {
            ctx.store_mut().delete(&key)?;
        } else {
            ctx.store_mut().set(&key, serde_json::to_vec(delegation)?)?;
        }
        Ok(())
    }

    fn bond_coin(&self, amount: Amount) -> Coin {
        Coin::new(amount, self.bond_denom.clone())
    }

    pub fn create_validator(
        &self,
        ctx: &mut Context<'_>,
        operator: ValidatorAddress,
    ) -> Result<Validator, CollaboratorError> {
        if ctx.store().has(&validator_key(&operator))? {
            return Err(CollaboratorError::InvalidAccount(format!(
                "validator {operator} already exists"
            )));
        }
        let validator = Validator::new(operator);
        self.set_validator(ctx, &validator)?;
        tracing::debug!(%operator, "Validator created");
        Ok(validator)
    }

    /// Unbond `amount` tokens of `delegator`'s stake with `validator` and
    /// return them to the delegator. Returns the shares removed.
    pub fn undelegate(
        &self,
        ctx: &mut Context<'_>,
        delegator: &Address,
        validator_addr: &ValidatorAddress,
        amount: Amount,
    ) -> Result<Decimal, CollaboratorError> {
        if amount.is_zero() {
            return Err(CollaboratorError::InvalidAmount("cannot undelegate zero".to_string()));
        }
        let mut delegation = self
            .get_delegation(ctx, delegator, validator_addr)?
            .ok_or(CollaboratorError::DelegationNotFound {
                delegator: *delegator,
                validator: *validator_addr,
            })?;
        let mut validator = self.get_validator(ctx, validator_addr)?;

        let shares = validator.shares_from_tokens(amount)?;
        if shares > delegation.shares {
            return Err(CollaboratorError::InvalidAmount(format!(
                "undelegating {shares} shares exceeds delegation of {}",
                delegation.shares
            )));
        }
        let removed = shares == delegation.shares;

        if removed {
            self.dispatch(
                ctx,
                DelegationEvent::BeforeRemoved {
                    delegator: *delegator,
                    validator: *validator_addr,
                },
            )?;
        } else {
            self.dispatch(
                ctx,
                DelegationEvent::BeforeSharesModified {
                    delegator: *delegator,
                    validator: *validator_addr,
                    shares_delta: -shares,
                },
            )?;
        }

        let tokens = validator.tokens_from_shares(shares)?;
        let returned = Amount::from_decimal_ceil(tokens.floor())
            .map_err(|e| CollaboratorError::InvalidAmount(e.to_string()))?;

        delegation.shares -= shares;
        self.set_delegation(ctx, &delegation)?;
        validator.delegator_shares -= shares;
        validator.tokens = validator.tokens.saturating_sub(&returned);
        self.set_validator(ctx, &validator)?;

        let pool = module_address(BONDED_POOL);
        let coins = [self.bond_coin(returned)];
        sub_coins(ctx.store_mut(), &pool, &coins)?;
        add_coins(ctx.store_mut(), delegator, &coins)?;

        if !removed {
            self.dispatch(
                ctx,
                DelegationEvent::AfterModified {
                    delegator: *delegator,
                    validator: *validator_addr,
                    shares_delta: -shares,
                },
            )?;
        }

        ctx.emit(
            Event::new("unbond")
                .attr("validator", validator_addr)
                .attr("delegator", delegator)
                .attr("amount", &coins[0]),
        );
        tracing::debug!(%delegator, validator = %validator_addr, %returned, "Undelegated");
        Ok(shares)
    }

    /// Burn `fraction` of a validator's tokens. Delegations keep their
    /// shares, so every delegation loses value. No hooks run.
    pub fn slash(
        &self,
        ctx: &mut Context<'_>,
        operator: &ValidatorAddress,
        fraction: Decimal,
    ) -> Result<Amount, CollaboratorError> {
        if fraction.is_sign_negative() || fraction > Decimal::ONE {
            return Err(CollaboratorError::InvalidAmount(format!(
                "slash fraction out of range: {fraction}"
            )));
        }
        let mut validator = self.get_validator(ctx, operator)?;
        let tokens = validator
            .tokens
            .to_decimal()
            .map_err(|e| CollaboratorError::InvalidAmount(e.to_string()))?;
        let burned = Amount::from_decimal_ceil((tokens * fraction).floor())
            .map_err(|e| CollaboratorError::InvalidAmount(e.to_string()))?;

        validator.tokens = validator.tokens.saturating_sub(&burned);
        self.set_validator(ctx, &validator)?;
        sub_coins(ctx.store_mut(), &module_address(BONDED_POOL), &[self.bond_coin(burned)])?;

        tracing::info!(%operator, %fraction, %burned, "Validator slashed");
        Ok(burned)
    }
}

impl StakingView for SimStaking {
    fn bond_denom(&self) -> &Denom {
        &self.bond_denom
    }

    fn get_validator(
        &self,
        ctx: &Context<'_>,
        operator: &ValidatorAddress,
    ) -> Result<Validator, CollaboratorError> {
        match ctx.store().get(&validator_key(operator))? {
            Some(bz) => Ok(serde_json::from_slice(&bz)?),
            None => Err(CollaboratorError::ValidatorNotFound(*operator)),
        }
    }

    fn get_delegator_delegations(
        &self,
        ctx: &Context<'_>,
        delegator: &Address,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Delegation>, CollaboratorError> {
        ctx.store()
            .prefix_range(&delegator_prefix(delegator))?
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, bz)| -> Result<Delegation, CollaboratorError> {
                Ok(serde_json::from_slice(&bz)?)
            })
            .collect()
    }

    fn get_delegation(
        &self,
        ctx: &Context<'_>,
        delegator: &Address,
        validator: &ValidatorAddress,
    ) -> Result<Option<Delegation>, CollaboratorError> {
        match ctx.store().get(&delegation_key(delegator, validator))? {
            Some(bz) => Ok(Some(serde_json::from_slice(&bz)?)),
            None => Ok(None),
        }
    }
}

impl StakingKeeper for SimStaking {
    fn delegate(
        &self,
        ctx: &mut Context<'_>,
        delegator: &Address,
        amount: Amount,
        validator_addr: &ValidatorAddress,
    ) -> Result<Decimal, CollaboratorError> {
        if amount.is_zero() {
            return Err(CollaboratorError::InvalidAmount("cannot delegate zero".to_string()));
        }
        let mut validator = self.get_validator(ctx, validator_addr)?;
        let shares = validator.shares_from_tokens(amount)?;

        let existing = self.get_delegation(ctx, delegator, validator_addr)?;
        if existing.is_some() {
            self.dispatch(
                ctx,
                DelegationEvent::BeforeSharesModified {
                    delegator: *delegator,
                    validator: *validator_addr,
                    shares_delta: shares,
                },
            )?;
        }

        let coins = [self.bond_coin(amount)];
        sub_coins(ctx.store_mut(), delegator, &coins)?;
        add_coins(ctx.store_mut(), &module_address(BONDED_POOL), &coins)?;

        let mut delegation = existing.unwrap_or(Delegation {
            delegator: *delegator,
            validator: *validator_addr,
            shares: Decimal::ZERO,
        });
        delegation.shares += shares;
        self.set_delegation(ctx, &delegation)?;

        validator.delegator_shares += shares;
        validator.tokens = validator.tokens.checked_add(&amount).ok_or_else(|| {
            CollaboratorError::InvalidAmount(format!("validator {validator_addr} token overflow"))
        })?;
        self.set_validator(ctx, &validator)?;

        self.dispatch(
            ctx,
            DelegationEvent::AfterModified {
                delegator: *delegator,
                validator: *validator_addr,
                shares_delta: shares,
            },
        )?;

        tracing::debug!(%delegator, validator = %validator_addr, %amount, %shares, "Delegated");
        Ok(shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lockup_core::address::ADDRESS_LEN;
    use lockup_risk::BalanceView;
    use lockup_store::MemStore;
    use rust_decimal_macros::dec;

    fn utsc() -> Denom {
        "utsc".parse().unwrap()
    }

    fn alice() -> Address {
        Address::from_bytes([0xa1; ADDRESS_LEN])
    }

    fn val(b: u8) -> ValidatorAddress {
        ValidatorAddress::from_bytes([b; ADDRESS_LEN])
    }

    #[test]
    fn test_delegate_and_undelegate_round_trip() {
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(), 1);
        let bank = crate::bank::SimBank::new(vec![]);
        let staking = SimStaking::new(utsc(), vec![]);

        bank.mint(&mut ctx, &alice(), &[Coin::new(1000u64, utsc())]).unwrap();
        staking.create_validator(&mut ctx, val(1)).unwrap();

        let shares = staking.delegate(&mut ctx, &alice(), Amount::new(600), &val(1)).unwrap();
        assert_eq!(shares, dec!(600));
        assert_eq!(bank.get_balance(&ctx, &alice(), &utsc()).unwrap(), Amount::new(400));

        staking.undelegate(&mut ctx, &alice(), &val(1), Amount::new(600)).unwrap();
        assert!(staking.get_delegation(&ctx, &alice(), &val(1)).unwrap().is_none());
        assert_eq!(bank.get_balance(&ctx, &alice(), &utsc()).unwrap(), Amount::new(1000));
    }

    #[test]
    fn test_delegations_paged_by_validator() {
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(), 1);
        let bank = crate::bank::SimBank::new(vec![]);
        let staking = SimStaking::new(utsc(), vec![]);
        bank.mint(&mut ctx, &alice(), &[Coin::new(1000u64, utsc())]).unwrap();

        for b in 1..=3 {
            staking.create_validator(&mut ctx, val(b)).unwrap();
            staking.delegate(&mut ctx, &alice(), Amount::new(10), &val(b)).unwrap();
        }

        let page = staking.get_delegator_delegations(&ctx, &alice(), 1, 10).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].validator, val(2));
    }

    #[test]
    fn test_delegate_unknown_validator() {
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(), 1);
        let staking = SimStaking::new(utsc(), vec![]);
        assert!(matches!(
            staking.delegate(&mut ctx, &alice(), Amount::new(1), &val(9)),
            Err(CollaboratorError::ValidatorNotFound(_))
        ));
    }

    #[test]
    fn test_slash_reduces_delegation_value() {
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(), 1);
        let bank = crate::bank::SimBank::new(vec![]);
        let staking = SimStaking::new(utsc(), vec![]);
        bank.mint(&mut ctx, &alice(), &[Coin::new(1000u64, utsc())]).unwrap();
        staking.create_validator(&mut ctx, val(1)).unwrap();
        staking.delegate(&mut ctx, &alice(), Amount::new(1000), &val(1)).unwrap();

        let burned = staking.slash(&mut ctx, &val(1), dec!(0.1)).unwrap();
        assert_eq!(burned, Amount::new(100));
        let validator = staking.get_validator(&ctx, &val(1)).unwrap();
        assert_eq!(validator.tokens, Amount::new(900));
        assert_eq!(validator.tokens_from_shares(dec!(1000)).unwrap(), dec!(900));
    }
}
