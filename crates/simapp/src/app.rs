//! Simulation app - wires the collaborators and the lockup engine together
//!
//! Every delivered transaction runs the ante chain, then executes its
//! messages in one cache branch. A failing message discards the whole
//! transaction.

use crate::accounts::{SimAccounts, BONDED_POOL, DISTRIBUTION, GOV, TRANSFER};
use crate::bank::SimBank;
use crate::error::{AppError, AppResult};
use crate::staking::SimStaking;
use chrono::{DateTime, Duration, Utc};
use lockup_core::{Address, Amount, Coin, Denom, LockupMsg, ValidatorAddress};
use lockup_hooks::{
    AnteChain, LockupAnteDecorator, LockupSendRestriction, LockupStakingHooks, Tx, TxMsg,
};
use lockup_keeper::{ContractGateway, Keeper, LockupConfig, LockupError, LockupResult};
use lockup_ledger::{audit_indexes, AuditReport};
use lockup_risk::{
    BalanceView, BankKeeper, SendRestriction, StakingHooks, StakingKeeper, StakingView,
};
use lockup_store::{Context, Event, MemStore, SnapshotReader, SnapshotWriter};
use std::path::Path;
use std::sync::Arc;

/// Everything a transaction can touch besides the store
pub struct Modules {
    pub bank: Arc<SimBank>,
    pub staking: Arc<SimStaking>,
    pub accounts: Arc<SimAccounts>,
    pub keeper: Arc<Keeper>,
    pub gateway: ContractGateway,
    pub ante: AnteChain,
}

impl Modules {
    fn check_bond_denom(&self, coin: &Coin) -> LockupResult<()> {
        if &coin.denom != self.staking.bond_denom() {
            return Err(LockupError::InvalidAmount(format!(
                "invalid denom: {}, expected: {}",
                coin.denom,
                self.staking.bond_denom()
            )));
        }
        Ok(())
    }

    pub fn dispatch(&self, ctx: &mut Context<'_>, msg: &TxMsg) -> LockupResult<()> {
        match msg {
            TxMsg::Send { from, to, amount } => self.bank.send(ctx, from, to, amount)?,
            TxMsg::MultiSend { inputs, outputs } => {
                self.bank.input_output_coins(ctx, inputs, outputs)?
            }
            TxMsg::Grant { granter, grantee, .. } | TxMsg::GrantAllowance { granter, grantee, .. } => {
                tracing::debug!(%granter, %grantee, "Grant recorded");
            }
            TxMsg::Exec { msgs, .. } => {
                for inner in msgs {
                    self.dispatch(ctx, inner)?;
                }
            }
            TxMsg::Delegate {
                delegator,
                validator,
                amount,
            } => {
                self.check_bond_denom(amount)?;
                self.staking.delegate(ctx, delegator, amount.amount, validator)?;
            }
            TxMsg::Undelegate {
                delegator,
                validator,
                amount,
            } => {
                self.check_bond_denom(amount)?;
                self.staking.undelegate(ctx, delegator, validator, amount.amount)?;
            }
            TxMsg::Deposit {
                depositor, amount, ..
            } => self.bank.send_to_module(ctx, depositor, GOV, amount)?,
            TxMsg::FundCommunityPool { depositor, amount }
            | TxMsg::DepositValidatorRewardsPool {
                depositor, amount, ..
            } => self.bank.send_to_module(ctx, depositor, DISTRIBUTION, amount)?,
            TxMsg::IbcTransfer { sender, token, .. } => {
                self.bank
                    .send_to_module(ctx, sender, TRANSFER, std::slice::from_ref(token))?
            }
            TxMsg::Lockup(msg) => match msg {
                LockupMsg::Lock(m) => self.keeper.lock(ctx, m)?,
                LockupMsg::Extend(m) => self.keeper.extend(ctx, m)?,
                LockupMsg::SendDelegateAndLock(m) => self.keeper.send_delegate_and_lock(ctx, m)?,
                LockupMsg::MultiSendDelegateAndLock(m) => {
                    self.keeper.multi_send_delegate_and_lock(ctx, m)?
                }
            },
        }
        Ok(())
    }
}

fn execute_msgs(modules: &Modules, ctx: &mut Context<'_>, msgs: &[TxMsg]) -> AppResult<()> {
    for (index, msg) in msgs.iter().enumerate() {
        modules
            .dispatch(ctx, msg)
            .map_err(|source| AppError::Message { index, source })?;
    }
    Ok(())
}

pub struct SimApp {
    store: MemStore,
    block_time: DateTime<Utc>,
    block_height: u64,
    pub modules: Modules,
}

impl SimApp {
    /// Build the app at genesis (height 0) with the module accounts
    /// registered
    pub fn new(config: LockupConfig, bond_denom: Denom, genesis_time: DateTime<Utc>) -> AppResult<Self> {
        let page_size = config.delegation_page_size;

        let hooks: Arc<dyn StakingHooks> = Arc::new(LockupStakingHooks::new(page_size));
        let staking = Arc::new(SimStaking::new(bond_denom, vec![hooks]));
        let restriction: Arc<dyn SendRestriction> =
            Arc::new(LockupSendRestriction::new(staking.clone(), page_size));
        let bank = Arc::new(SimBank::new(vec![restriction]));
        let accounts = Arc::new(SimAccounts::new());

        let keeper = Arc::new(Keeper::new(
            config,
            bank.clone(),
            staking.clone(),
            accounts.clone(),
        )?);
        let gateway = ContractGateway::new(keeper.clone());
        let ante = AnteChain::new().with(Arc::new(LockupAnteDecorator::new(
            bank.clone(),
            staking.clone(),
            page_size,
        )));

        let mut app = Self {
            store: MemStore::new(),
            block_time: genesis_time,
            block_height: 0,
            modules: Modules {
                bank,
                staking,
                accounts,
                keeper,
                gateway,
                ante,
            },
        };

        let accounts = app.modules.accounts.clone();
        app.with_context(|ctx| {
            for module in [BONDED_POOL, GOV, DISTRIBUTION, TRANSFER] {
                accounts.register_module(ctx, module)?;
            }
            Ok(())
        })?;

        tracing::info!(%genesis_time, "Sim app initialized");
        Ok(app)
    }

    pub fn block_time(&self) -> DateTime<Utc> {
        self.block_time
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn store(&self) -> &MemStore {
        &self.store
    }

    pub fn keeper(&self) -> &Keeper {
        &self.modules.keeper
    }

    /// Run `f` directly against the committed store, outside any
    /// transaction
    fn with_context<T>(
        &mut self,
        f: impl FnOnce(&mut Context<'_>) -> LockupResult<T>,
    ) -> AppResult<T> {
        let mut ctx = Context::new(&mut self.store, self.block_time, self.block_height);
        Ok(ctx.cache_context(f)?)
    }

    // === Genesis / test setup ===

    pub fn fund_account(&mut self, address: &Address, coins: &[Coin]) -> AppResult<()> {
        let bank = self.modules.bank.clone();
        let accounts = self.modules.accounts.clone();
        self.with_context(|ctx| {
            accounts.ensure_account(ctx, address)?;
            bank.mint(ctx, address, coins)?;
            Ok(())
        })
    }

    pub fn create_validator(&mut self, operator: ValidatorAddress) -> AppResult<()> {
        let staking = self.modules.staking.clone();
        self.with_context(|ctx| {
            staking.create_validator(ctx, operator)?;
            Ok(())
        })
    }

    pub fn slash(&mut self, operator: &ValidatorAddress, fraction: rust_decimal::Decimal) -> AppResult<Amount> {
        let staking = self.modules.staking.clone();
        self.with_context(|ctx| Ok(staking.slash(ctx, operator, fraction)?))
    }

    // === Blocks ===

    pub fn begin_block(&mut self, time: DateTime<Utc>) {
        self.block_time = time;
        self.block_height += 1;
        tracing::debug!(height = self.block_height, %time, "Begin block");
    }

    pub fn advance_days(&mut self, days: i64) {
        self.begin_block(self.block_time + Duration::days(days));
    }

    /// Purge locks that expired on or before the block day. Returns the
    /// number of buckets removed.
    pub fn end_block(&mut self) -> AppResult<usize> {
        let keeper = self.modules.keeper.clone();
        self.with_context(|ctx| {
            let day = ctx.block_day();
            keeper.purge_expired(ctx, day)
        })
    }

    // === Transactions ===

    /// Ante chain, then every message in one cache branch. Returns the
    /// events of a committed transaction.
    pub fn deliver_tx(&mut self, tx: &Tx) -> AppResult<Vec<Event>> {
        let modules = &self.modules;
        let mut ctx = Context::new(&mut self.store, self.block_time, self.block_height);

        modules.ante.run(&ctx, tx)?;
        let result = ctx.cache_context(|ctx| execute_msgs(modules, ctx, &tx.msgs));

        match result {
            Ok(()) => {
                tracing::info!(height = self.block_height, msgs = tx.msgs.len(), "Transaction committed");
                Ok(ctx.take_events())
            }
            Err(e) => {
                tracing::warn!(height = self.block_height, error = %e, "Transaction failed");
                Err(e)
            }
        }
    }

    /// Execute messages atomically without the ante chain, the way another
    /// module's call would reach bank and staking
    pub fn execute_unguarded(&mut self, msgs: &[TxMsg]) -> AppResult<Vec<Event>> {
        let modules = &self.modules;
        let mut ctx = Context::new(&mut self.store, self.block_time, self.block_height);
        ctx.cache_context(|ctx| execute_msgs(modules, ctx, msgs))?;
        Ok(ctx.take_events())
    }

    /// A transfer made from inside the contract VM: no ante chain, only the
    /// bank's send restrictions
    pub fn evm_transfer(&mut self, from: &Address, to: &Address, coins: &[Coin]) -> AppResult<()> {
        let bank = self.modules.bank.clone();
        self.with_context(|ctx| Ok(bank.send(ctx, from, to, coins)?))
    }

    /// A lockup call made by a contract whose address is `caller`
    pub fn contract_call(&mut self, caller: &Address, msg: &LockupMsg) -> AppResult<Vec<Event>> {
        let modules = &self.modules;
        let mut ctx = Context::new(&mut self.store, self.block_time, self.block_height);
        match msg {
            LockupMsg::Lock(m) => modules.gateway.lock(&mut ctx, caller, m)?,
            LockupMsg::Extend(m) => modules.gateway.extend(&mut ctx, caller, m)?,
            LockupMsg::SendDelegateAndLock(m) => {
                modules.gateway.send_delegate_and_lock(&mut ctx, caller, m)?
            }
            LockupMsg::MultiSendDelegateAndLock(_) => {
                return Err(LockupError::InvalidRequest(
                    "multi send-delegate-and-lock is not exposed to contracts".to_string(),
                )
                .into())
            }
        }
        Ok(ctx.take_events())
    }

    // === Queries ===

    pub fn query<T>(&mut self, f: impl FnOnce(&Keeper, &Context<'_>) -> LockupResult<T>) -> LockupResult<T> {
        let ctx = Context::new(&mut self.store, self.block_time, self.block_height);
        f(&self.modules.keeper, &ctx)
    }

    /// Read through the contract gateway
    pub fn contract_query<T>(
        &mut self,
        f: impl FnOnce(&ContractGateway, &Context<'_>) -> LockupResult<T>,
    ) -> LockupResult<T> {
        let ctx = Context::new(&mut self.store, self.block_time, self.block_height);
        f(&self.modules.gateway, &ctx)
    }

    pub fn balance(&mut self, address: &Address) -> LockupResult<Amount> {
        let bank = self.modules.bank.clone();
        let denom = self.modules.staking.bond_denom().clone();
        self.query(|_, ctx| Ok(bank.get_balance(ctx, address, &denom)?))
    }

    pub fn total_locked(&mut self, address: &Address) -> LockupResult<Amount> {
        self.query(|keeper, ctx| Ok(keeper.checker().total_locked(ctx, address)?))
    }

    pub fn total_delegated(&mut self, address: &Address) -> LockupResult<Amount> {
        self.query(|keeper, ctx| Ok(keeper.checker().total_delegated(ctx, address)?))
    }

    /// Cross-check the two lock indexes over the whole store
    pub fn audit(&self) -> LockupResult<AuditReport> {
        Ok(audit_indexes(&self.store)?)
    }

    // === Snapshots ===

    pub fn export_snapshot(&self, path: impl AsRef<Path>) -> AppResult<usize> {
        let mut writer = SnapshotWriter::create(path)?;
        Ok(writer.write_store(&self.store)?)
    }

    /// Replace the store with a snapshot's contents
    pub fn import_snapshot(&mut self, path: impl AsRef<Path>) -> AppResult<usize> {
        let reader = SnapshotReader::open(path)?;
        let mut store = MemStore::new();
        let restored = reader.restore_into(&mut store)?;
        self.store = store;
        tracing::info!(restored, "Snapshot imported");
        Ok(restored)
    }
}
