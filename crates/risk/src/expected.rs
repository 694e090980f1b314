//! Collaborator interfaces
//!
//! The lockup engine never owns balances, delegations or account records.
//! It reaches them through these traits. All methods read and write through
//! the caller's [`Context`], so they observe the same cache branch as the
//! handler that called them.

use crate::error::{CollaboratorError, RiskError};
use lockup_core::{Address, Amount, Coin, Denom, ValidatorAddress};
use lockup_store::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// === Accounts ===

/// What an account record is allowed to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountKind {
    /// Plain user account
    Base,
    /// Account that has held at least one lock
    LockBearing,
    /// Module-owned account; never lock-bearing
    Module { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub kind: AccountKind,
}

impl Account {
    pub fn new(address: Address, kind: AccountKind) -> Self {
        Self { address, kind }
    }

    pub fn is_lock_bearing(&self) -> bool {
        self.kind == AccountKind::LockBearing
    }
}

pub trait AccountKeeper: Send + Sync {
    fn get_account(
        &self,
        ctx: &Context<'_>,
        address: &Address,
    ) -> Result<Option<Account>, CollaboratorError>;

    fn set_account(&self, ctx: &mut Context<'_>, account: Account) -> Result<(), CollaboratorError>;
}

// === Bank ===

pub trait BalanceView: Send + Sync {
    fn get_balance(
        &self,
        ctx: &Context<'_>,
        address: &Address,
        denom: &Denom,
    ) -> Result<Amount, CollaboratorError>;
}

pub trait BankKeeper: BalanceView {
    /// Move `coins` from `from` to `to`, running every registered send
    /// restriction first
    fn send(
        &self,
        ctx: &mut Context<'_>,
        from: &Address,
        to: &Address,
        coins: &[Coin],
    ) -> Result<(), CollaboratorError>;
}

/// A check the bank runs before every transfer, whatever its origin
pub trait SendRestriction: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the effective recipient, or rejects the transfer
    fn check(
        &self,
        ctx: &Context<'_>,
        bank: &dyn BalanceView,
        from: &Address,
        to: &Address,
        coins: &[Coin],
    ) -> Result<Address, RiskError>;
}

// === Staking ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub operator: ValidatorAddress,
    pub tokens: Amount,
    pub delegator_shares: Decimal,
}

impl Validator {
    pub fn new(operator: ValidatorAddress) -> Self {
        Self {
            operator,
            tokens: Amount::ZERO,
            delegator_shares: Decimal::ZERO,
        }
    }

    /// Token value of `shares` at the validator's current exchange rate
    pub fn tokens_from_shares(&self, shares: Decimal) -> Result<Decimal, CollaboratorError> {
        if self.delegator_shares.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let tokens = self
            .tokens
            .to_decimal()
            .map_err(|e| CollaboratorError::InvalidAmount(e.to_string()))?;
        shares
            .checked_mul(tokens)
            .and_then(|v| v.checked_div(self.delegator_shares))
            .ok_or_else(|| {
                CollaboratorError::InvalidAmount(format!("{shares} shares of {}", self.operator))
            })
    }

    /// Shares issued for `amount` tokens. A validator without shares issues
    /// them one to one.
    pub fn shares_from_tokens(&self, amount: Amount) -> Result<Decimal, CollaboratorError> {
        let amount = amount
            .to_decimal()
            .map_err(|e| CollaboratorError::InvalidAmount(e.to_string()))?;
        if self.tokens.is_zero() || self.delegator_shares.is_zero() {
            return Ok(amount);
        }
        let tokens = self
            .tokens
            .to_decimal()
            .map_err(|e| CollaboratorError::InvalidAmount(e.to_string()))?;
        self.delegator_shares
            .checked_mul(amount)
            .and_then(|v| v.checked_div(tokens))
            .ok_or_else(|| {
                CollaboratorError::InvalidAmount(format!("{amount} tokens to {}", self.operator))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator: Address,
    pub validator: ValidatorAddress,
    pub shares: Decimal,
}

/// Read side of staking, which is all the checker needs
pub trait StakingView: Send + Sync {
    fn bond_denom(&self) -> &Denom;

    fn get_validator(
        &self,
        ctx: &Context<'_>,
        operator: &ValidatorAddress,
    ) -> Result<Validator, CollaboratorError>;

    /// One page of the delegator's delegations, ordered by validator
    fn get_delegator_delegations(
        &self,
        ctx: &Context<'_>,
        delegator: &Address,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Delegation>, CollaboratorError>;

    fn get_delegation(
        &self,
        ctx: &Context<'_>,
        delegator: &Address,
        validator: &ValidatorAddress,
    ) -> Result<Option<Delegation>, CollaboratorError>;
}

pub trait StakingKeeper: StakingView {
    /// Bond `amount` of the bond denom from `delegator` to `validator`.
    /// Returns the shares issued.
    fn delegate(
        &self,
        ctx: &mut Context<'_>,
        delegator: &Address,
        amount: Amount,
        validator: &ValidatorAddress,
    ) -> Result<Decimal, CollaboratorError>;
}

/// Delegation lifecycle events staking dispatches to its hooks, inside the
/// same commit boundary as the change itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegationEvent {
    /// Shares are about to change by `shares_delta`; the record still holds
    /// the old shares
    BeforeSharesModified {
        delegator: Address,
        validator: ValidatorAddress,
        shares_delta: Decimal,
    },
    /// The record is about to be deleted; it still holds its shares
    BeforeRemoved {
        delegator: Address,
        validator: ValidatorAddress,
    },
    /// The record has been written with its new shares
    AfterModified {
        delegator: Address,
        validator: ValidatorAddress,
        shares_delta: Decimal,
    },
}

impl DelegationEvent {
    pub fn delegator(&self) -> &Address {
        match self {
            DelegationEvent::BeforeSharesModified { delegator, .. }
            | DelegationEvent::BeforeRemoved { delegator, .. }
            | DelegationEvent::AfterModified { delegator, .. } => delegator,
        }
    }

    pub fn validator(&self) -> &ValidatorAddress {
        match self {
            DelegationEvent::BeforeSharesModified { validator, .. }
            | DelegationEvent::BeforeRemoved { validator, .. }
            | DelegationEvent::AfterModified { validator, .. } => validator,
        }
    }
}

pub trait StakingHooks: Send + Sync {
    fn name(&self) -> &str;

    /// An error aborts the delegation change
    fn on_delegation_event(
        &self,
        ctx: &Context<'_>,
        staking: &dyn StakingView,
        event: &DelegationEvent,
    ) -> Result<(), RiskError>;
}
