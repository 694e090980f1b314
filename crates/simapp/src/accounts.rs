//! Account records

use lockup_core::address::ADDRESS_LEN;
use lockup_core::Address;
use lockup_risk::{Account, AccountKeeper, AccountKind, CollaboratorError};
use lockup_store::Context;

const ACCOUNTS_PREFIX: &[u8] = b"accounts";

pub const BONDED_POOL: &str = "bonded_tokens_pool";
pub const GOV: &str = "gov";
pub const DISTRIBUTION: &str = "distribution";
pub const TRANSFER: &str = "transfer";

/// Deterministic address of a module account: its name, zero padded
pub fn module_address(name: &str) -> Address {
    let mut bytes = [0u8; ADDRESS_LEN];
    for (b, c) in bytes.iter_mut().zip(name.bytes()) {
        *b = c;
    }
    Address::from_bytes(bytes)
}

fn account_key(address: &Address) -> Vec<u8> {
    let mut key = ACCOUNTS_PREFIX.to_vec();
    key.extend_from_slice(address.as_bytes());
    key
}

#[derive(Debug, Default)]
pub struct SimAccounts;

impl SimAccounts {
    pub fn new() -> Self {
        Self
    }

    /// Create a base account unless one already exists
    pub fn ensure_account(
        &self,
        ctx: &mut Context<'_>,
        address: &Address,
    ) -> Result<(), CollaboratorError> {
        if self.get_account(ctx, address)?.is_none() {
            self.set_account(ctx, Account::new(*address, AccountKind::Base))?;
        }
        Ok(())
    }

    pub fn register_module(
        &self,
        ctx: &mut Context<'_>,
        name: &str,
    ) -> Result<Address, CollaboratorError> {
        let address = module_address(name);
        self.set_account(
            ctx,
            Account::new(
                address,
                AccountKind::Module {
                    name: name.to_string(),
                },
            ),
        )?;
        Ok(address)
    }
}

impl AccountKeeper for SimAccounts {
    fn get_account(
        &self,
        ctx: &Context<'_>,
        address: &Address,
    ) -> Result<Option<Account>, CollaboratorError> {
        match ctx.store().get(&account_key(address))? {
            Some(bz) => Ok(Some(serde_json::from_slice(&bz)?)),
            None => Ok(None),
        }
    }

    fn set_account(&self, ctx: &mut Context<'_>, account: Account) -> Result<(), CollaboratorError> {
        let bz = serde_json::to_vec(&account)?;
        ctx.store_mut().set(&account_key(&account.address), bz)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lockup_store::MemStore;

    #[test]
    fn test_module_address_is_padded_name() {
        let addr = module_address("gov");
        assert_eq!(&addr.as_bytes()[..3], b"gov");
        assert!(addr.as_bytes()[3..].iter().all(|b| *b == 0));
        assert_ne!(module_address(GOV), module_address(DISTRIBUTION));
    }

    #[test]
    fn test_ensure_account_keeps_existing_kind() {
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(), 1);
        let accounts = SimAccounts::new();
        let gov = accounts.register_module(&mut ctx, GOV).unwrap();

        accounts.ensure_account(&mut ctx, &gov).unwrap();
        let account = accounts.get_account(&ctx, &gov).unwrap().unwrap();
        assert!(matches!(account.kind, AccountKind::Module { .. }));

        let fresh = Address::from_bytes([0x42; ADDRESS_LEN]);
        accounts.ensure_account(&mut ctx, &fresh).unwrap();
        let account = accounts.get_account(&ctx, &fresh).unwrap().unwrap();
        assert_eq!(account.kind, AccountKind::Base);
    }
}
