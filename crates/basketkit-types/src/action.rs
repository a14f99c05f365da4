//! Requests accepted by the orchestration API and the actions it submits.
//!
//! A request is what a caller asks for; an [`Action`] is what is handed to
//! the transaction submitter once every guard has passed. Submitting is the
//! only effect-producing step, and it happens at most once per request.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ActionId, Address, FillOrder, Timestamp, TransactionHandle};

/// A bid for part of the current basket in a live auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRequest {
    pub rebalancing_token: Address,
    /// Quantity of the current basket to take; a positive multiple of the
    /// auction's minimum bid, at most the remaining current sets.
    pub bid_quantity: Decimal,
    pub requester: Address,
}

/// A manager's proposal of the next basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRequest {
    pub rebalancing_token: Address,
    pub next_set: Address,
    pub auction_library: Address,
    pub auction_time_to_pivot: u64,
    pub auction_start_price: Decimal,
    pub auction_pivot_price: Decimal,
    pub caller: Address,
}

/// Issue `quantity` of `set` to the caller from the caller's components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceRequest {
    pub set: Address,
    pub quantity: Decimal,
    pub caller: Address,
}

/// Redeem `quantity` of `set`, optionally withdrawing components from the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRequest {
    pub set: Address,
    pub quantity: Decimal,
    pub caller: Address,
    pub withdraw: bool,
}

/// Parameters of an order-based issuance: send tokens are traded through
/// liquidity orders for the receive tokens, which back the issued set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeIssuanceParams {
    pub set: Address,
    pub quantity: Decimal,
    pub send_tokens: Vec<Address>,
    pub send_token_exchange_ids: Vec<u8>,
    pub send_token_amounts: Vec<Decimal>,
    pub receive_tokens: Vec<Address>,
    pub receive_token_amounts: Vec<Decimal>,
}

/// An order-based issuance together with the liquidity that fills it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeIssuanceRequest {
    pub params: ExchangeIssuanceParams,
    pub orders: Vec<FillOrder>,
    pub expiration: Timestamp,
    pub caller: Address,
    /// Pay the wrapped-native send token with native currency; its
    /// balance and allowance are then not checked.
    #[serde(default)]
    pub pay_with_native: bool,
}

/// Create a new basket through the factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSetRequest {
    pub components: Vec<Address>,
    pub units: Vec<Decimal>,
    pub natural_unit: Decimal,
    pub name: String,
    pub symbol: String,
    pub caller: Address,
}

// ---------------------------------------------------------------------------
// Action: the only thing that ever reaches the submitter
// ---------------------------------------------------------------------------

/// A fully validated, effect-producing protocol call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Propose {
        from: Address,
        rebalancing_token: Address,
        next_set: Address,
        auction_library: Address,
        auction_time_to_pivot: u64,
        auction_start_price: Decimal,
        auction_pivot_price: Decimal,
    },
    StartRebalance {
        from: Address,
        rebalancing_token: Address,
    },
    Bid {
        from: Address,
        rebalancing_token: Address,
        quantity: Decimal,
    },
    Settle {
        from: Address,
        rebalancing_token: Address,
    },
    EndFailedAuction {
        from: Address,
        rebalancing_token: Address,
    },
    SetManager {
        from: Address,
        rebalancing_token: Address,
        new_manager: Address,
    },
    Issue {
        from: Address,
        set: Address,
        quantity: Decimal,
    },
    Redeem {
        from: Address,
        set: Address,
        quantity: Decimal,
        withdraw: bool,
    },
    ExchangeIssue {
        from: Address,
        module: Address,
        params: ExchangeIssuanceParams,
        orders: Vec<FillOrder>,
        pay_with_native: bool,
    },
    CreateSet {
        from: Address,
        components: Vec<Address>,
        units: Vec<Decimal>,
        natural_unit: Decimal,
        name: String,
        symbol: String,
    },
}

impl Action {
    /// Short stable name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Propose { .. } => "propose",
            Self::StartRebalance { .. } => "start_rebalance",
            Self::Bid { .. } => "bid",
            Self::Settle { .. } => "settle",
            Self::EndFailedAuction { .. } => "end_failed_auction",
            Self::SetManager { .. } => "set_manager",
            Self::Issue { .. } => "issue",
            Self::Redeem { .. } => "redeem",
            Self::ExchangeIssue { .. } => "exchange_issue",
            Self::CreateSet { .. } => "create_set",
        }
    }

    /// The account sending the transaction.
    #[must_use]
    pub fn sender(&self) -> Address {
        match self {
            Self::Propose { from, .. }
            | Self::StartRebalance { from, .. }
            | Self::Bid { from, .. }
            | Self::Settle { from, .. }
            | Self::EndFailedAuction { from, .. }
            | Self::SetManager { from, .. }
            | Self::Issue { from, .. }
            | Self::Redeem { from, .. }
            | Self::ExchangeIssue { from, .. }
            | Self::CreateSet { from, .. } => *from,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {}", self.name(), self.sender())
    }
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAction {
    pub action_id: ActionId,
    pub action: Action,
    pub tx: TransactionHandle,
}
