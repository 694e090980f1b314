//! Contract gateway
//!
//! Entry point for the contract VM. A contract may only act for itself:
//! the caller has to be the address the message acts on.

use crate::error::{LockupError, LockupResult};
use crate::keeper::Keeper;
use crate::query::{LockResource, PageRequest};
use lockup_core::{Address, Coin, MsgExtend, MsgLock, MsgSendDelegateAndLock};
use lockup_store::Context;
use std::sync::Arc;

pub struct ContractGateway {
    keeper: Arc<Keeper>,
}

impl ContractGateway {
    pub fn new(keeper: Arc<Keeper>) -> Self {
        Self { keeper }
    }

    fn authorize(caller: &Address, acting: &str) -> LockupResult<()> {
        let address: Address = acting
            .parse()
            .map_err(|e| LockupError::InvalidAddress(format!("{acting}: {e}")))?;
        if &address != caller {
            return Err(LockupError::Unauthorized {
                caller: *caller,
                address,
            });
        }
        Ok(())
    }

    pub fn lock(&self, ctx: &mut Context<'_>, caller: &Address, msg: &MsgLock) -> LockupResult<()> {
        tracing::debug!(%caller, address = %msg.address, unlock_date = %msg.unlock_date, amount = %msg.amount, "Contract lock");
        Self::authorize(caller, &msg.address)?;
        self.keeper.lock(ctx, msg)
    }

    pub fn extend(&self, ctx: &mut Context<'_>, caller: &Address, msg: &MsgExtend) -> LockupResult<()> {
        tracing::debug!(%caller, address = %msg.address, extensions = msg.extensions.len(), "Contract extend");
        Self::authorize(caller, &msg.address)?;
        self.keeper.extend(ctx, msg)
    }

    pub fn send_delegate_and_lock(
        &self,
        ctx: &mut Context<'_>,
        caller: &Address,
        msg: &MsgSendDelegateAndLock,
    ) -> LockupResult<()> {
        tracing::debug!(
            %caller,
            from = %msg.from_address,
            to = %msg.to_address,
            validator = %msg.validator_address,
            amount = %msg.amount,
            "Contract send-delegate-and-lock"
        );
        Self::authorize(caller, &msg.from_address)?;
        self.keeper.send_delegate_and_lock(ctx, msg)
    }

    // === Reads, open to any caller ===

    /// First page of `address`'s active locks
    pub fn locks(&self, ctx: &Context<'_>, address: &Address) -> LockupResult<Vec<LockResource>> {
        let res = self
            .keeper
            .locks(ctx, &address.to_string(), &PageRequest::default())?;
        Ok(res.locks)
    }

    pub fn total_locked_amount(&self, ctx: &Context<'_>) -> LockupResult<Coin> {
        self.keeper.total_locked_amount(ctx)
    }
}
