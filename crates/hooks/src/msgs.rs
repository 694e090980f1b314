//! Transaction messages seen by the ante chain
//!
//! Only the messages that can move value of the bond denom are modelled in
//! detail; the lockup module's own messages are carried opaquely because
//! their handlers check the invariant themselves.

use lockup_core::{Address, Coin, LockupMsg, ValidatorAddress};
use serde::{Deserialize, Serialize};

/// Authz authorization attached to a grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Authorization {
    Send { spend_limit: Vec<Coin> },
    Generic { msg_type: String },
}

/// Fee-grant allowance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeeAllowance {
    Basic {
        spend_limit: Option<Vec<Coin>>,
    },
    Periodic {
        spend_limit: Option<Vec<Coin>>,
        period_seconds: u64,
        period_spend_limit: Vec<Coin>,
    },
    AllowedMsg {
        allowance: Box<FeeAllowance>,
        allowed_messages: Vec<String>,
    },
}

impl FeeAllowance {
    /// The total the granter could be charged, if bounded
    pub fn spend_limit(&self) -> Option<&[Coin]> {
        match self {
            FeeAllowance::Basic { spend_limit } | FeeAllowance::Periodic { spend_limit, .. } => {
                spend_limit.as_deref()
            }
            FeeAllowance::AllowedMsg { allowance, .. } => allowance.spend_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSendInput {
    pub address: Address,
    pub coins: Vec<Coin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "snake_case")]
pub enum TxMsg {
    Send {
        from: Address,
        to: Address,
        amount: Vec<Coin>,
    },
    MultiSend {
        inputs: Vec<MultiSendInput>,
        outputs: Vec<MultiSendInput>,
    },
    Grant {
        granter: Address,
        grantee: Address,
        authorization: Authorization,
    },
    Exec {
        grantee: Address,
        msgs: Vec<TxMsg>,
    },
    Delegate {
        delegator: Address,
        validator: ValidatorAddress,
        amount: Coin,
    },
    Undelegate {
        delegator: Address,
        validator: ValidatorAddress,
        amount: Coin,
    },
    Deposit {
        depositor: Address,
        proposal_id: u64,
        amount: Vec<Coin>,
    },
    FundCommunityPool {
        depositor: Address,
        amount: Vec<Coin>,
    },
    DepositValidatorRewardsPool {
        depositor: Address,
        validator: ValidatorAddress,
        amount: Vec<Coin>,
    },
    GrantAllowance {
        granter: Address,
        grantee: Address,
        allowance: FeeAllowance,
    },
    IbcTransfer {
        sender: Address,
        receiver: String,
        source_channel: String,
        token: Coin,
    },
    Lockup(LockupMsg),
}

/// An ordered list of messages applied atomically
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub msgs: Vec<TxMsg>,
}

impl Tx {
    pub fn new(msgs: Vec<TxMsg>) -> Self {
        Self { msgs }
    }

    pub fn single(msg: TxMsg) -> Self {
        Self { msgs: vec![msg] }
    }
}
