//! Rebalancing auction orchestration.
//!
//! Every effect-producing method follows the same shape:
//! 1. Cheap local checks on the request
//! 2. Concurrent reads of the on-chain snapshot
//! 3. The matching `rebalance_guard` predicate
//! 4. Ledger verification where tokens move
//! 5. Exactly one submission
//!
//! A failure at any step returns before the submitter is touched.

use basketkit_checks::{
    assert_positive, calculate_partial_amount, calculate_partial_amount_round_up,
};
use basketkit_guard::Requirement;
use basketkit_guard::rebalance_guard::{self, ProposalSnapshot};
use basketkit_types::{
    Action, Address, BasketkitError, BidRequest, ProposalRequest, ProtocolConfig,
    RebalancingToken, Result, SubmittedAction, Timestamp, TokenFlows,
};
use futures::future::try_join;
use rust_decimal::Decimal;

use crate::context::Collaborators;

/// Proposals, auctions, bids and settlement for rebalancing tokens.
pub struct RebalancingApi {
    ctx: Collaborators,
    config: ProtocolConfig,
}

impl RebalancingApi {
    #[must_use]
    pub fn new(ctx: Collaborators, config: ProtocolConfig) -> Self {
        Self { ctx, config }
    }

    /// Read a full snapshot of a rebalancing token.
    pub async fn fetch_token(&self, token: Address) -> Result<RebalancingToken> {
        let state = &self.ctx.state;
        let (
            rebalance_state,
            manager,
            current_set,
            next_set,
            last_rebalance_timestamp,
            rebalance_interval,
            timing,
        ) = futures::try_join!(
            state.rebalance_state(token),
            state.manager(token),
            state.current_set(token),
            state.next_set(token),
            state.last_rebalance_timestamp(token),
            state.rebalance_interval(token),
            state.proposal_timing(token),
        )?;
        let natural_unit = state.natural_unit(current_set).await?;

        Ok(RebalancingToken {
            address: token,
            manager,
            rebalance_state,
            current_set,
            // A reader may still report the last proposal outside the auction states.
            next_set: next_set.filter(|_| rebalance_state.has_next_set()),
            natural_unit,
            last_rebalance_timestamp,
            rebalance_interval,
            proposal_start_time: timing.proposal_start_time,
            proposal_period: timing.proposal_period,
        })
    }

    /// Earliest time the next proposal may be made.
    pub async fn next_rebalance_available_at(&self, token: Address) -> Result<Timestamp> {
        let (last, interval) = try_join(
            self.ctx.state.last_rebalance_timestamp(token),
            self.ctx.state.rebalance_interval(token),
        )
        .await?;
        Ok(last.saturating_add(interval))
    }

    /// Token flows for a bid of `quantity` at the current auction price.
    ///
    /// The pricing collaborator is asked for one minimum-bid quote, which is
    /// scaled to `quantity`. Inflows (what the bidder pays) round up,
    /// outflows (what the bidder receives) truncate.
    pub async fn bid_price(&self, token: Address, quantity: Decimal) -> Result<TokenFlows> {
        assert_positive(quantity)?;
        let bidding = self.ctx.state.bidding_parameters(token).await?;
        self.scaled_flows(token, bidding.minimum_bid, quantity).await
    }

    async fn scaled_flows(
        &self,
        token: Address,
        minimum_bid: Decimal,
        quantity: Decimal,
    ) -> Result<TokenFlows> {
        assert_positive(minimum_bid)?;
        let quote = self.ctx.state.bid_token_flows(token, minimum_bid).await?;
        let inflow = quote
            .inflow()
            .iter()
            .map(|amount| calculate_partial_amount_round_up(*amount, quantity, minimum_bid))
            .collect::<Result<Vec<_>>>()?;
        let outflow = quote
            .outflow()
            .iter()
            .map(|amount| calculate_partial_amount(*amount, quantity, minimum_bid))
            .collect::<Result<Vec<_>>>()?;
        TokenFlows::new(quote.tokens().to_vec(), inflow, outflow)
    }

    /// Propose the next basket for a rebalancing token. Manager only.
    pub async fn propose(&self, request: &ProposalRequest) -> Result<SubmittedAction> {
        let action = self.check_propose(request).await.inspect_err(|e| {
            tracing::warn!(token = %request.rebalancing_token, error = %e, "Proposal rejected");
        })?;
        self.ctx.submit(action).await
    }

    async fn check_propose(&self, request: &ProposalRequest) -> Result<Action> {
        let state = &self.ctx.state;
        let token = request.rebalancing_token;
        let (
            rebalance_state,
            manager,
            last_rebalance_timestamp,
            rebalance_interval,
            current_set,
            next_set_recognized,
            auction_library_recognized,
        ) = futures::try_join!(
            state.rebalance_state(token),
            state.manager(token),
            state.last_rebalance_timestamp(token),
            state.rebalance_interval(token),
            state.current_set(token),
            state.is_recognized_basket(request.next_set),
            state.is_recognized_price_library(request.auction_library),
        )?;

        // An unrecognized next set has no natural unit to read; the guard
        // rejects it before units are compared.
        let (current_natural_unit, next_natural_unit) = if next_set_recognized {
            try_join(
                state.natural_unit(current_set),
                state.natural_unit(request.next_set),
            )
            .await?
        } else {
            (state.natural_unit(current_set).await?, Decimal::ZERO)
        };

        let snapshot = ProposalSnapshot {
            state: rebalance_state,
            manager,
            last_rebalance_timestamp,
            rebalance_interval,
            next_set: request.next_set,
            next_set_recognized,
            auction_library: request.auction_library,
            auction_library_recognized,
            current_natural_unit,
            next_natural_unit,
            auction_time_to_pivot: request.auction_time_to_pivot,
            auction_start_price: request.auction_start_price,
            auction_pivot_price: request.auction_pivot_price,
        };
        rebalance_guard::assert_can_propose(&snapshot, request.caller, self.ctx.clock.now())?;

        Ok(Action::Propose {
            from: request.caller,
            rebalancing_token: token,
            next_set: request.next_set,
            auction_library: request.auction_library,
            auction_time_to_pivot: request.auction_time_to_pivot,
            auction_start_price: request.auction_start_price,
            auction_pivot_price: request.auction_pivot_price,
        })
    }

    /// Move a proposal into its auction once the proposal period is over.
    /// Anyone may call this.
    pub async fn start_rebalance(
        &self,
        token: Address,
        caller: Address,
    ) -> Result<SubmittedAction> {
        let action = self.check_start_rebalance(token, caller).await.inspect_err(|e| {
            tracing::warn!(token = %token, error = %e, "Start rebalance rejected");
        })?;
        self.ctx.submit(action).await
    }

    async fn check_start_rebalance(&self, token: Address, caller: Address) -> Result<Action> {
        let (state, timing) = try_join(
            self.ctx.state.rebalance_state(token),
            self.ctx.state.proposal_timing(token),
        )
        .await?;
        rebalance_guard::assert_can_start_rebalance(state, &timing, self.ctx.clock.now())?;
        tracing::debug!(token = %token, "Start rebalance guard passed");
        Ok(Action::StartRebalance {
            from: caller,
            rebalancing_token: token,
        })
    }

    /// Bid for part of the current basket in a live auction.
    ///
    /// The bidder must hold, and have approved to the transfer proxy, every
    /// inflow token scaled to the bid.
    pub async fn bid(&self, request: &BidRequest) -> Result<SubmittedAction> {
        let action = self.check_bid(request).await.inspect_err(|e| {
            tracing::warn!(
                token = %request.rebalancing_token,
                quantity = %request.bid_quantity,
                error = %e,
                "Bid rejected"
            );
        })?;
        self.ctx.submit(action).await
    }

    async fn check_bid(&self, request: &BidRequest) -> Result<Action> {
        let token = request.rebalancing_token;
        assert_positive(request.bid_quantity)?;

        let (state, bidding) = try_join(
            self.ctx.state.rebalance_state(token),
            self.ctx.state.bidding_parameters(token),
        )
        .await?;
        rebalance_guard::assert_can_bid(state, &bidding, request.bid_quantity)?;

        let flows = self
            .scaled_flows(token, bidding.minimum_bid, request.bid_quantity)
            .await?;
        let requirements: Vec<Requirement> = flows
            .required_inflows()
            .map(|(token, amount)| Requirement::new(token, amount))
            .collect();
        self.ctx
            .verifier()
            .verify_balances_and_allowances(
                &requirements,
                request.requester,
                self.config.transfer_proxy,
                &[],
            )
            .await?;

        tracing::debug!(token = %token, quantity = %request.bid_quantity, "Bid guard passed");
        Ok(Action::Bid {
            from: request.requester,
            rebalancing_token: token,
            quantity: request.bid_quantity,
        })
    }

    /// Settle an auction once fewer than a minimum bid of sets remain.
    pub async fn settle_rebalance(
        &self,
        token: Address,
        caller: Address,
    ) -> Result<SubmittedAction> {
        let action = self.check_settle(token, caller).await.inspect_err(|e| {
            tracing::warn!(token = %token, error = %e, "Settle rejected");
        })?;
        self.ctx.submit(action).await
    }

    async fn check_settle(&self, token: Address, caller: Address) -> Result<Action> {
        let (state, bidding) = try_join(
            self.ctx.state.rebalance_state(token),
            self.ctx.state.bidding_parameters(token),
        )
        .await?;
        rebalance_guard::assert_can_settle(state, &bidding)?;
        tracing::debug!(token = %token, "Settle guard passed");
        Ok(Action::Settle {
            from: caller,
            rebalancing_token: token,
        })
    }

    /// End an auction that reached its pivot without being filled,
    /// moving the token into DRAWDOWN.
    pub async fn end_failed_auction(
        &self,
        token: Address,
        caller: Address,
    ) -> Result<SubmittedAction> {
        let action = self.check_end_failed_auction(token, caller).await.inspect_err(|e| {
            tracing::warn!(token = %token, error = %e, "End failed auction rejected");
        })?;
        self.ctx.submit(action).await
    }

    async fn check_end_failed_auction(&self, token: Address, caller: Address) -> Result<Action> {
        let state = &self.ctx.state;
        let (rebalance_state, bidding, auction) = futures::try_join!(
            state.rebalance_state(token),
            state.bidding_parameters(token),
            state.auction_price_parameters(token),
        )?;
        rebalance_guard::assert_can_end_failed_auction(
            rebalance_state,
            &bidding,
            &auction,
            self.ctx.clock.now(),
        )?;
        tracing::debug!(token = %token, "End failed auction guard passed");
        Ok(Action::EndFailedAuction {
            from: caller,
            rebalancing_token: token,
        })
    }

    /// Hand the token to a new manager. Current manager only.
    pub async fn update_manager(
        &self,
        token: Address,
        caller: Address,
        new_manager: Address,
    ) -> Result<SubmittedAction> {
        let action = self
            .check_update_manager(token, caller, new_manager)
            .await
            .inspect_err(|e| {
                tracing::warn!(token = %token, error = %e, "Manager update rejected");
            })?;
        self.ctx.submit(action).await
    }

    async fn check_update_manager(
        &self,
        token: Address,
        caller: Address,
        new_manager: Address,
    ) -> Result<Action> {
        if new_manager.is_zero() {
            return Err(BasketkitError::InvalidAddress(
                "new manager must not be the zero address".to_string(),
            ));
        }
        let manager = self.ctx.state.manager(token).await?;
        rebalance_guard::assert_is_manager("update manager", caller, manager)?;
        Ok(Action::SetManager {
            from: caller,
            rebalancing_token: token,
            new_manager,
        })
    }
}
