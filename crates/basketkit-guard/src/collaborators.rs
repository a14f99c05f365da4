//! Seams to the outside world.
//!
//! The SDK never talks to a chain directly. Contract reads, token ledger
//! reads and transaction submission go through these traits; hosts plug in
//! their RPC/ABI client of choice. Every call is a suspension point.

use async_trait::async_trait;
use basketkit_types::{
    Action, Address, AuctionPriceParameters, BiddingParameters, ProposalTiming, RebalanceState,
    Result, Timestamp, TokenFlows, TransactionHandle,
};
use rust_decimal::Decimal;

/// Reads protocol and rebalancing-token state.
#[async_trait]
pub trait StateReader: Send + Sync {
    async fn rebalance_state(&self, token: Address) -> Result<RebalanceState>;

    async fn manager(&self, token: Address) -> Result<Address>;

    async fn bidding_parameters(&self, token: Address) -> Result<BiddingParameters>;

    async fn auction_price_parameters(&self, token: Address) -> Result<AuctionPriceParameters>;

    async fn proposal_timing(&self, token: Address) -> Result<ProposalTiming>;

    async fn last_rebalance_timestamp(&self, token: Address) -> Result<Timestamp>;

    /// Minimum cooldown between rebalances, in seconds.
    async fn rebalance_interval(&self, token: Address) -> Result<u64>;

    /// The basket currently backing a rebalancing token.
    async fn current_set(&self, token: Address) -> Result<Address>;

    /// The proposed next basket, if one is defined.
    async fn next_set(&self, token: Address) -> Result<Option<Address>>;

    async fn natural_unit(&self, set: Address) -> Result<Decimal>;

    async fn components(&self, set: Address) -> Result<Vec<Address>>;

    /// Per-natural-unit component amounts, index-aligned with `components`.
    async fn units(&self, set: Address) -> Result<Vec<Decimal>>;

    /// Whether the core registered `set` as one of its baskets.
    async fn is_recognized_basket(&self, set: Address) -> Result<bool>;

    /// Whether the core whitelisted `library` as an auction price library.
    async fn is_recognized_price_library(&self, library: Address) -> Result<bool>;

    /// Price a bid of `quantity` at the current auction price.
    async fn bid_token_flows(&self, token: Address, quantity: Decimal) -> Result<TokenFlows>;
}

/// Reads token balances and allowances.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn balance_of(&self, token: Address, owner: Address) -> Result<Decimal>;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<Decimal>;
}

/// Submits a validated action as a transaction.
///
/// Treated as atomic: it either accepts the whole action or rejects it.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(&self, action: &Action) -> Result<TransactionHandle>;
}
