//! Rebalance lifecycle types for rebalancing basket tokens.
//!
//! A rebalancing token moves through its phases in a fixed order:
//! **DEFAULT → PROPOSAL → REBALANCE → DEFAULT** on the normal settle path,
//! or **REBALANCE → DRAWDOWN** when an auction fails with bids remaining.
//!
//! During PROPOSAL the manager has announced the next basket and the
//! proposal period is running. During REBALANCE the auction is live and
//! bidders exchange their inflow components for the current basket.

use std::fmt;

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Address;

/// UNIX timestamp in seconds.
pub type Timestamp = u64;

/// Render a timestamp as RFC 3339 for human-readable messages.
///
/// Falls back to the raw seconds when the value is outside chrono's range.
#[must_use]
pub fn format_timestamp(ts: &Timestamp) -> String {
    i64::try_from(*ts)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map_or_else(|| ts.to_string(), |dt| dt.to_rfc3339())
}

/// The phases of a rebalancing token, ordered by lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum RebalanceState {
    /// No rebalance in progress.
    Default,
    /// A next basket has been proposed; the proposal period is running.
    Proposal,
    /// The auction is live and accepting bids.
    Rebalance,
    /// The auction failed with bids remaining; holders may withdraw.
    Drawdown,
}

impl fmt::Display for RebalanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "DEFAULT"),
            Self::Proposal => write!(f, "PROPOSAL"),
            Self::Rebalance => write!(f, "REBALANCE"),
            Self::Drawdown => write!(f, "DRAWDOWN"),
        }
    }
}

impl RebalanceState {
    /// Whether a next basket is defined in this state.
    #[must_use]
    pub fn has_next_set(self) -> bool {
        matches!(self, Self::Proposal | Self::Rebalance)
    }
}

// ---------------------------------------------------------------------------
// Auction parameters
// ---------------------------------------------------------------------------

/// Bid sizing parameters of a live auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiddingParameters {
    /// Every bid must be a positive multiple of this quantity.
    pub minimum_bid: Decimal,
    /// Quantity of the current basket still available to bidders.
    pub remaining_current_sets: Decimal,
}

impl BiddingParameters {
    /// Whether at least one more minimum bid can be placed.
    #[must_use]
    pub fn has_remaining_bids(&self) -> bool {
        self.remaining_current_sets >= self.minimum_bid
    }
}

/// Timing and price curve of a live auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionPriceParameters {
    pub auction_start_time: Timestamp,
    /// Seconds from start until the price curve reaches its pivot.
    pub auction_time_to_pivot: u64,
    pub auction_start_price: Decimal,
    pub auction_pivot_price: Decimal,
}

impl AuctionPriceParameters {
    /// When the auction reaches its pivot point.
    #[must_use]
    pub fn pivot_time(&self) -> Timestamp {
        self.auction_start_time
            .saturating_add(self.auction_time_to_pivot)
    }
}

/// Proposal period of a rebalancing token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalTiming {
    pub proposal_start_time: Timestamp,
    pub proposal_period: u64,
}

impl ProposalTiming {
    /// When the rebalance auction may be started.
    #[must_use]
    pub fn ends_at(&self) -> Timestamp {
        self.proposal_start_time.saturating_add(self.proposal_period)
    }
}

// ---------------------------------------------------------------------------
// RebalancingToken: read-only snapshot of on-chain state
// ---------------------------------------------------------------------------

/// Snapshot of an auction-bearing basket token.
///
/// Deployed and owned on-chain; the SDK only reads it and mutates it
/// through guarded, submitted actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalancingToken {
    pub address: Address,
    /// Identity allowed to propose and to change the manager.
    pub manager: Address,
    pub rebalance_state: RebalanceState,
    pub current_set: Address,
    /// Defined only in PROPOSAL and REBALANCE.
    pub next_set: Option<Address>,
    pub natural_unit: Decimal,
    pub last_rebalance_timestamp: Timestamp,
    /// Minimum cooldown between rebalances, in seconds.
    pub rebalance_interval: u64,
    pub proposal_start_time: Timestamp,
    pub proposal_period: u64,
}

impl RebalancingToken {
    /// Earliest time a new proposal is allowed.
    #[must_use]
    pub fn next_rebalance_available_at(&self) -> Timestamp {
        self.last_rebalance_timestamp
            .saturating_add(self.rebalance_interval)
    }
}
