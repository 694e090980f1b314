//! Message handlers
//!
//! Every public handler runs inside its own cache branch of the caller's
//! context: it either commits all of its writes and events or none.

use crate::error::{LockupError, LockupResult};
use crate::events::{delegate_event, lock_event, lock_extended_event};
use crate::keeper::{credit_lock, debit_lock, Keeper};
use chrono::NaiveDate;
use lockup_core::date::add_months;
use lockup_core::{
    is_locked, Address, Amount, Coin, MsgExtend, MsgLock, MsgMultiSendDelegateAndLock,
    MsgSendDelegateAndLock, UnlockDate, ValidatorAddress,
};
use lockup_store::Context;

fn parse_address(field: &str, value: &str) -> LockupResult<Address> {
    value
        .parse()
        .map_err(|e| LockupError::InvalidAddress(format!("invalid {field} address: {e}")))
}

fn parse_date(field: &str, value: &str) -> LockupResult<UnlockDate> {
    value
        .parse()
        .map_err(|e| LockupError::InvalidDate(format!("invalid {field} date: {e}")))
}

fn window_bound(today: NaiveDate, months: u32) -> LockupResult<NaiveDate> {
    add_months(today, months).map_err(|e| LockupError::InvalidDate(e.to_string()))
}

impl Keeper {
    fn check_bond_denom(&self, coin: &Coin) -> LockupResult<()> {
        if &coin.denom != self.bond_denom() {
            return Err(LockupError::InvalidAmount(format!(
                "invalid denom: {}, expected: {}",
                coin.denom,
                self.bond_denom()
            )));
        }
        Ok(())
    }

    /// Lock `msg.amount` for `msg.address` until `msg.unlock_date`
    pub fn lock(&self, ctx: &mut Context<'_>, msg: &MsgLock) -> LockupResult<()> {
        ctx.cache_context(|ctx| self.execute_lock(ctx, msg))
    }

    pub fn extend(&self, ctx: &mut Context<'_>, msg: &MsgExtend) -> LockupResult<()> {
        ctx.cache_context(|ctx| self.execute_extend(ctx, msg))
    }

    pub fn send_delegate_and_lock(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgSendDelegateAndLock,
    ) -> LockupResult<()> {
        ctx.cache_context(|ctx| self.execute_send_delegate_and_lock(ctx, msg))
    }

    pub fn multi_send_delegate_and_lock(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgMultiSendDelegateAndLock,
    ) -> LockupResult<()> {
        ctx.cache_context(|ctx| self.execute_multi_send_delegate_and_lock(ctx, msg))
    }

    fn execute_lock(&self, ctx: &mut Context<'_>, msg: &MsgLock) -> LockupResult<()> {
        msg.validate_basic()?;
        let address = parse_address("lock", &msg.address)?;
        let unlock_date = parse_date("unlock", &msg.unlock_date)?;
        self.check_bond_denom(&msg.amount)?;
        let amount = msg.amount.amount;

        let today = ctx.block_day();
        let earliest = window_bound(today, self.config().min_lock_months)?;
        let latest = window_bound(today, self.config().max_lock_months)?;
        if unlock_date.date() < earliest {
            return Err(LockupError::InvalidRequest(format!(
                "unlock date {unlock_date} must be at least {} months from {today}",
                self.config().min_lock_months
            )));
        }
        if unlock_date.date() > latest {
            return Err(LockupError::InvalidRequest(format!(
                "unlock date {unlock_date} cannot be more than {} months from {today}",
                self.config().max_lock_months
            )));
        }

        self.check_lockable_account(ctx, &address)?;
        self.checker()
            .full_snapshot(ctx, &address)?
            .check_new_lock(&address, amount)?;

        self.materialize_lock_account(ctx, &address)?;
        let bucket = credit_lock(ctx.store_mut(), &address, unlock_date, amount)?;
        ctx.emit(lock_event(&address, &unlock_date, amount));

        tracing::info!(%address, %unlock_date, %amount, %bucket, "Lock created");
        Ok(())
    }

    fn execute_extend(&self, ctx: &mut Context<'_>, msg: &MsgExtend) -> LockupResult<()> {
        msg.validate_basic()?;
        let address = parse_address("extending", &msg.address)?;
        self.require_lock_account(ctx, &address)?;

        let today = ctx.block_day();
        let latest = window_bound(today, self.config().max_lock_months)?;

        for extension in &msg.extensions {
            self.check_bond_denom(&extension.amount)?;
            let from = parse_date("from", &extension.from_date)?;
            let to = parse_date("to", &extension.to_date)?;
            let amount = extension.amount.amount;

            if !is_locked(today, &to) {
                return Err(LockupError::InvalidRequest(format!(
                    "to date {to} must be in the future"
                )));
            }
            if to.date() > latest {
                return Err(LockupError::InvalidRequest(format!(
                    "to date {to} cannot be more than {} months from {today}",
                    self.config().max_lock_months
                )));
            }

            // Moving an already unlocked bucket forward locks it again
            if !is_locked(today, &from) {
                self.checker()
                    .full_snapshot(ctx, &address)?
                    .check_new_lock(&address, amount)?;
            }

            debit_lock(ctx.store_mut(), &address, from, amount)?;
            credit_lock(ctx.store_mut(), &address, to, amount)?;
            ctx.emit(lock_extended_event(&address, &from, &to, amount));

            tracing::info!(%address, %from, %to, %amount, "Lock extended");
        }

        Ok(())
    }

    fn execute_send_delegate_and_lock(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgSendDelegateAndLock,
    ) -> LockupResult<()> {
        msg.validate_basic()?;
        let from = parse_address("from", &msg.from_address)?;
        let to = parse_address("to", &msg.to_address)?;
        let validator: ValidatorAddress = msg
            .validator_address
            .parse()
            .map_err(|e| LockupError::InvalidAddress(format!("invalid validator address: {e}")))?;
        self.check_bond_denom(&msg.amount)?;

        self.bank.send(ctx, &from, &to, std::slice::from_ref(&msg.amount))?;
        let new_shares = self.staking.delegate(ctx, &to, msg.amount.amount, &validator)?;
        ctx.emit(delegate_event(&validator, &to, &msg.amount, new_shares));

        self.execute_lock(
            ctx,
            &MsgLock::new(
                msg.to_address.clone(),
                msg.unlock_date.clone(),
                msg.amount.clone(),
            ),
        )?;

        tracing::info!(%from, %to, %validator, amount = %msg.amount, "Sent, delegated and locked");
        Ok(())
    }

    fn execute_multi_send_delegate_and_lock(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgMultiSendDelegateAndLock,
    ) -> LockupResult<()> {
        msg.validate_basic()?;
        self.check_bond_denom(&msg.total_amount)?;

        let mut total = Amount::ZERO;
        for output in &msg.outputs {
            if !output.amount.is_positive() {
                return Err(LockupError::InvalidAmount(format!(
                    "invalid amount in output to {}: {}",
                    output.to_address, output.amount
                )));
            }
            total = total.checked_add(&output.amount.amount).ok_or_else(|| {
                LockupError::InvalidAmount(format!("sum of outputs overflows at {}", output.to_address))
            })?;
        }

        if msg.total_amount.amount != total {
            return Err(LockupError::InvalidRequest(format!(
                "input {} does not match sum of outputs {total}",
                msg.total_amount
            )));
        }

        for single in msg.split() {
            self.execute_send_delegate_and_lock(ctx, &single)?;
        }

        tracing::info!(
            from = %msg.from_address,
            outputs = msg.outputs.len(),
            total = %msg.total_amount,
            "Multi send-delegate-and-lock completed"
        );
        Ok(())
    }
}
