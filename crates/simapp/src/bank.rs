//! Bank
//!
//! Balances live in the context's store, so a discarded cache branch also
//! discards every transfer made in it. Every transfer runs the registered
//! send restrictions first.

use crate::accounts::module_address;
use lockup_core::{Address, Amount, Coin, Denom};
use lockup_hooks::msgs::MultiSendInput;
use lockup_risk::{BalanceView, BankKeeper, CollaboratorError, SendRestriction};
use lockup_store::{Context, Event, KvStore};
use std::collections::BTreeMap;
use std::sync::Arc;

const BALANCES_PREFIX: &[u8] = b"balances";

fn balance_key(address: &Address, denom: &Denom) -> Vec<u8> {
    let mut key = BALANCES_PREFIX.to_vec();
    key.extend_from_slice(address.as_bytes());
    key.extend_from_slice(denom.as_str().as_bytes());
    key
}

pub(crate) fn read_balance(
    store: &dyn KvStore,
    address: &Address,
    denom: &Denom,
) -> Result<Amount, CollaboratorError> {
    match store.get(&balance_key(address, denom))? {
        Some(bz) => Ok(serde_json::from_slice(&bz)?),
        None => Ok(Amount::ZERO),
    }
}

fn write_balance(
    store: &mut dyn KvStore,
    address: &Address,
    denom: &Denom,
    amount: Amount,
) -> Result<(), CollaboratorError> {
    let key = balance_key(address, denom);
    if amount.is_zero() {
        store.delete(&key)?;
    } else {
        store.set(&key, serde_json::to_vec(&amount)?)?;
    }
    Ok(())
}

pub(crate) fn add_coins(
    store: &mut dyn KvStore,
    address: &Address,
    coins: &[Coin],
) -> Result<(), CollaboratorError> {
    for coin in coins {
        let current = read_balance(&*store, address, &coin.denom)?;
        let updated = current.checked_add(&coin.amount).ok_or_else(|| {
            CollaboratorError::InvalidAmount(format!("balance overflow for {address}: {current} + {coin}"))
        })?;
        write_balance(store, address, &coin.denom, updated)?;
    }
    Ok(())
}

pub(crate) fn sub_coins(
    store: &mut dyn KvStore,
    address: &Address,
    coins: &[Coin],
) -> Result<(), CollaboratorError> {
    for coin in coins {
        let current = read_balance(&*store, address, &coin.denom)?;
        let updated =
            current
                .checked_sub(&coin.amount)
                .ok_or(CollaboratorError::InsufficientBalance {
                    address: *address,
                    available: current,
                    required: coin.amount,
                })?;
        write_balance(store, address, &coin.denom, updated)?;
    }
    Ok(())
}

fn denom_totals<'a>(
    coins: impl IntoIterator<Item = &'a Coin>,
) -> Result<BTreeMap<&'a Denom, Amount>, CollaboratorError> {
    let mut totals: BTreeMap<&Denom, Amount> = BTreeMap::new();
    for coin in coins {
        let entry = totals.entry(&coin.denom).or_insert(Amount::ZERO);
        *entry = entry.checked_add(&coin.amount).ok_or_else(|| {
            CollaboratorError::InvalidAmount(format!("multi-send total overflow in {}", coin.denom))
        })?;
    }
    Ok(totals)
}

pub struct SimBank {
    restrictions: Vec<Arc<dyn SendRestriction>>,
}

impl SimBank {
    pub fn new(restrictions: Vec<Arc<dyn SendRestriction>>) -> Self {
        Self { restrictions }
    }

    /// Create coins out of thin air (genesis funding)
    pub fn mint(
        &self,
        ctx: &mut Context<'_>,
        address: &Address,
        coins: &[Coin],
    ) -> Result<(), CollaboratorError> {
        add_coins(ctx.store_mut(), address, coins)
    }

    fn apply_restrictions(
        &self,
        ctx: &Context<'_>,
        from: &Address,
        to: &Address,
        coins: &[Coin],
    ) -> Result<Address, CollaboratorError> {
        let mut recipient = *to;
        for restriction in &self.restrictions {
            recipient = restriction.check(ctx, self, from, &recipient, coins)?;
        }
        Ok(recipient)
    }

    /// One input paying many outputs. Outputs are processed in order, each
    /// against the balance left by the previous ones.
    pub fn input_output_coins(
        &self,
        ctx: &mut Context<'_>,
        inputs: &[MultiSendInput],
        outputs: &[MultiSendInput],
    ) -> Result<(), CollaboratorError> {
        let [input] = inputs else {
            return Err(CollaboratorError::InvalidAmount(format!(
                "multi-send requires exactly one input, got {}",
                inputs.len()
            )));
        };

        let input_totals = denom_totals(&input.coins)?;
        let output_totals = denom_totals(outputs.iter().flat_map(|o| &o.coins))?;
        if input_totals != output_totals {
            return Err(CollaboratorError::InvalidAmount(
                "multi-send inputs and outputs do not match".to_string(),
            ));
        }

        for output in outputs {
            self.send(ctx, &input.address, &output.address, &output.coins)?;
        }
        Ok(())
    }

    /// Move coins into a module account
    pub fn send_to_module(
        &self,
        ctx: &mut Context<'_>,
        from: &Address,
        module: &str,
        coins: &[Coin],
    ) -> Result<(), CollaboratorError> {
        self.send(ctx, from, &module_address(module), coins)
    }
}

impl BalanceView for SimBank {
    fn get_balance(
        &self,
        ctx: &Context<'_>,
        address: &Address,
        denom: &Denom,
    ) -> Result<Amount, CollaboratorError> {
        read_balance(ctx.store(), address, denom)
    }
}

impl BankKeeper for SimBank {
    fn send(
        &self,
        ctx: &mut Context<'_>,
        from: &Address,
        to: &Address,
        coins: &[Coin],
    ) -> Result<(), CollaboratorError> {
        if let Some(coin) = coins.iter().find(|c| !c.is_positive()) {
            return Err(CollaboratorError::InvalidAmount(format!("cannot send {coin}")));
        }

        let recipient = self.apply_restrictions(ctx, from, to, coins)?;
        sub_coins(ctx.store_mut(), from, coins)?;
        add_coins(ctx.store_mut(), &recipient, coins)?;

        let amount = coins.iter().map(Coin::to_string).collect::<Vec<_>>().join(",");
        ctx.emit(
            Event::new("transfer")
                .attr("sender", from)
                .attr("recipient", recipient)
                .attr("amount", amount),
        );
        tracing::debug!(%from, to = %recipient, "Bank transfer");
        Ok(())
    }
}
