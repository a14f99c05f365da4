//! In-memory chain implementing every collaborator trait, for tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use basketkit_types::{
    Action, Address, AuctionPriceParameters, BasketkitError, BiddingParameters, ProposalTiming,
    RebalanceState, Result, Timestamp, TokenFlows, TransactionHandle, constants,
};
use rust_decimal::Decimal;

use crate::collaborators::{LedgerReader, StateReader, TransactionSubmitter};

/// State of one rebalancing token on the mock chain.
#[derive(Debug, Clone)]
pub struct MockRebalancingToken {
    pub state: RebalanceState,
    pub manager: Address,
    pub bidding: BiddingParameters,
    pub auction: AuctionPriceParameters,
    pub proposal_start_time: Timestamp,
    pub proposal_period: u64,
    pub last_rebalance_timestamp: Timestamp,
    pub rebalance_interval: u64,
    pub current_set: Address,
    pub next_set: Option<Address>,
}

impl MockRebalancingToken {
    /// A DEFAULT-state token with the protocol's default periods.
    #[must_use]
    pub fn new(manager: Address, current_set: Address) -> Self {
        Self {
            state: RebalanceState::Default,
            manager,
            bidding: BiddingParameters {
                minimum_bid: Decimal::ZERO,
                remaining_current_sets: Decimal::ZERO,
            },
            auction: AuctionPriceParameters {
                auction_start_time: 0,
                auction_time_to_pivot: 0,
                auction_start_price: Decimal::ZERO,
                auction_pivot_price: Decimal::ZERO,
            },
            proposal_start_time: 0,
            proposal_period: constants::DEFAULT_PROPOSAL_PERIOD_SECS,
            last_rebalance_timestamp: 0,
            rebalance_interval: constants::DEFAULT_REBALANCE_INTERVAL_SECS,
            current_set,
            next_set: None,
        }
    }
}

/// A basket registered on the mock chain.
#[derive(Debug, Clone)]
pub struct MockSet {
    pub natural_unit: Decimal,
    pub components: Vec<Address>,
    pub units: Vec<Decimal>,
}

/// Per-set bid pricing: flows for a bid of one set, scaled linearly.
#[derive(Debug, Clone)]
struct BidPricing {
    tokens: Vec<Address>,
    inflow_per_set: Vec<Decimal>,
    outflow_per_set: Vec<Decimal>,
}

#[derive(Default)]
struct ChainState {
    tokens: BTreeMap<Address, MockRebalancingToken>,
    sets: BTreeMap<Address, MockSet>,
    price_libraries: BTreeSet<Address>,
    bid_pricing: BTreeMap<Address, BidPricing>,
    balances: BTreeMap<(Address, Address), Decimal>,
    allowances: BTreeMap<(Address, Address, Address), Decimal>,
    submitted: Vec<Action>,
    read_failure: Option<String>,
    submit_failure: Option<String>,
}

/// Mock chain. Reads come from in-memory maps; submitted actions are
/// recorded but never applied.
#[derive(Default)]
pub struct InMemoryChain {
    state: Mutex<ChainState>,
    reads: AtomicU64,
    tx_counter: AtomicU64,
}

impl InMemoryChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_rebalancing_token(&self, address: Address, token: MockRebalancingToken) {
        self.lock().tokens.insert(address, token);
    }

    /// Mutate a registered rebalancing token in place.
    pub fn update_rebalancing_token(
        &self,
        address: Address,
        f: impl FnOnce(&mut MockRebalancingToken),
    ) {
        if let Some(token) = self.lock().tokens.get_mut(&address) {
            f(token);
        }
    }

    /// Register a recognized basket.
    pub fn add_set(
        &self,
        address: Address,
        natural_unit: Decimal,
        components: Vec<Address>,
        units: Vec<Decimal>,
    ) {
        self.lock().sets.insert(
            address,
            MockSet {
                natural_unit,
                components,
                units,
            },
        );
    }

    pub fn add_price_library(&self, library: Address) {
        self.lock().price_libraries.insert(library);
    }

    /// Price bids on `token`: each bid set requires `inflow_per_set` and
    /// returns `outflow_per_set`.
    pub fn set_bid_pricing(
        &self,
        token: Address,
        tokens: Vec<Address>,
        inflow_per_set: Vec<Decimal>,
        outflow_per_set: Vec<Decimal>,
    ) {
        self.lock().bid_pricing.insert(
            token,
            BidPricing {
                tokens,
                inflow_per_set,
                outflow_per_set,
            },
        );
    }

    pub fn set_balance(&self, token: Address, owner: Address, amount: Decimal) {
        self.lock().balances.insert((token, owner), amount);
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: Decimal) {
        self.lock().allowances.insert((token, owner, spender), amount);
    }

    /// Give `owner` a balance of `amount` and approve all of it to `spender`.
    pub fn fund(&self, token: Address, owner: Address, spender: Address, amount: Decimal) {
        self.set_balance(token, owner, amount);
        self.set_allowance(token, owner, spender, amount);
    }

    /// Make every subsequent read fail with a collaborator error.
    pub fn fail_reads(&self, reason: &str) {
        self.lock().read_failure = Some(reason.to_string());
    }

    /// Make every subsequent submission fail.
    pub fn reject_submissions(&self, reason: &str) {
        self.lock().submit_failure = Some(reason.to_string());
    }

    /// Actions accepted by [`TransactionSubmitter::submit`], in order.
    #[must_use]
    pub fn submitted(&self) -> Vec<Action> {
        self.lock().submitted.clone()
    }

    /// Number of state or ledger reads served so far.
    #[must_use]
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    fn read<T>(&self, f: impl FnOnce(&ChainState) -> Result<T>) -> Result<T> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        if let Some(reason) = &state.read_failure {
            return Err(BasketkitError::Collaborator {
                reason: reason.clone(),
            });
        }
        f(&state)
    }

    fn read_token<T>(
        &self,
        address: Address,
        f: impl FnOnce(&MockRebalancingToken) -> T,
    ) -> Result<T> {
        self.read(|state| {
            state
                .tokens
                .get(&address)
                .map(f)
                .ok_or_else(|| BasketkitError::Collaborator {
                    reason: format!("unknown rebalancing token {address}"),
                })
        })
    }

    fn read_set<T>(&self, address: Address, f: impl FnOnce(&MockSet) -> T) -> Result<T> {
        self.read(|state| {
            state
                .sets
                .get(&address)
                .map(f)
                .ok_or_else(|| BasketkitError::Collaborator {
                    reason: format!("unknown set {address}"),
                })
        })
    }
}

#[async_trait]
impl StateReader for InMemoryChain {
    async fn rebalance_state(&self, token: Address) -> Result<RebalanceState> {
        self.read_token(token, |t| t.state)
    }

    async fn manager(&self, token: Address) -> Result<Address> {
        self.read_token(token, |t| t.manager)
    }

    async fn bidding_parameters(&self, token: Address) -> Result<BiddingParameters> {
        self.read_token(token, |t| t.bidding)
    }

    async fn auction_price_parameters(&self, token: Address) -> Result<AuctionPriceParameters> {
        self.read_token(token, |t| t.auction)
    }

    async fn proposal_timing(&self, token: Address) -> Result<ProposalTiming> {
        self.read_token(token, |t| ProposalTiming {
            proposal_start_time: t.proposal_start_time,
            proposal_period: t.proposal_period,
        })
    }

    async fn last_rebalance_timestamp(&self, token: Address) -> Result<Timestamp> {
        self.read_token(token, |t| t.last_rebalance_timestamp)
    }

    async fn rebalance_interval(&self, token: Address) -> Result<u64> {
        self.read_token(token, |t| t.rebalance_interval)
    }

    async fn current_set(&self, token: Address) -> Result<Address> {
        self.read_token(token, |t| t.current_set)
    }

    async fn next_set(&self, token: Address) -> Result<Option<Address>> {
        self.read_token(token, |t| t.next_set)
    }

    async fn natural_unit(&self, set: Address) -> Result<Decimal> {
        self.read_set(set, |s| s.natural_unit)
    }

    async fn components(&self, set: Address) -> Result<Vec<Address>> {
        self.read_set(set, |s| s.components.clone())
    }

    async fn units(&self, set: Address) -> Result<Vec<Decimal>> {
        self.read_set(set, |s| s.units.clone())
    }

    async fn is_recognized_basket(&self, set: Address) -> Result<bool> {
        self.read(|state| Ok(state.sets.contains_key(&set)))
    }

    async fn is_recognized_price_library(&self, library: Address) -> Result<bool> {
        self.read(|state| Ok(state.price_libraries.contains(&library)))
    }

    async fn bid_token_flows(&self, token: Address, quantity: Decimal) -> Result<TokenFlows> {
        self.read(|state| {
            let pricing =
                state
                    .bid_pricing
                    .get(&token)
                    .ok_or_else(|| BasketkitError::Collaborator {
                        reason: format!("no bid pricing for {token}"),
                    })?;
            let scale = |per_set: &[Decimal]| per_set.iter().map(|a| *a * quantity).collect();
            TokenFlows::new(
                pricing.tokens.clone(),
                scale(&pricing.inflow_per_set),
                scale(&pricing.outflow_per_set),
            )
        })
    }
}

#[async_trait]
impl LedgerReader for InMemoryChain {
    async fn balance_of(&self, token: Address, owner: Address) -> Result<Decimal> {
        self.read(|state| {
            Ok(state
                .balances
                .get(&(token, owner))
                .copied()
                .unwrap_or(Decimal::ZERO))
        })
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<Decimal> {
        self.read(|state| {
            Ok(state
                .allowances
                .get(&(token, owner, spender))
                .copied()
                .unwrap_or(Decimal::ZERO))
        })
    }
}

#[async_trait]
impl TransactionSubmitter for InMemoryChain {
    async fn submit(&self, action: &Action) -> Result<TransactionHandle> {
        let mut state = self.lock();
        if let Some(reason) = &state.submit_failure {
            return Err(BasketkitError::SubmissionRejected {
                reason: reason.clone(),
            });
        }
        state.submitted.push(action.clone());
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TransactionHandle(format!("0x{n:064x}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[tokio::test]
    async fn unknown_token_read_fails() {
        let chain = InMemoryChain::new();
        let err = chain.rebalance_state(Address([1; 20])).await.unwrap_err();
        assert!(matches!(err, BasketkitError::Collaborator { .. }));
    }

    #[tokio::test]
    async fn bid_flows_scale_with_quantity() {
        let chain = InMemoryChain::new();
        let token = Address([1; 20]);
        chain.set_bid_pricing(token, vec![Address([2; 20])], vec![dec(3)], vec![dec(1)]);
        let flows = chain.bid_token_flows(token, dec(10)).await.unwrap();
        assert_eq!(flows.inflow(), &[dec(30)]);
        assert_eq!(flows.outflow(), &[dec(10)]);
    }

    #[tokio::test]
    async fn submissions_recorded_in_order() {
        let chain = InMemoryChain::new();
        let from = Address([9; 20]);
        let token = Address([1; 20]);
        let a = Action::StartRebalance {
            from,
            rebalancing_token: token,
        };
        let b = Action::Settle {
            from,
            rebalancing_token: token,
        };
        let first = chain.submit(&a).await.unwrap();
        let second = chain.submit(&b).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(chain.submitted(), vec![a, b]);
    }

    #[tokio::test]
    async fn rejected_submission_not_recorded() {
        let chain = InMemoryChain::new();
        chain.reject_submissions("nonce too low");
        let action = Action::Settle {
            from: Address([9; 20]),
            rebalancing_token: Address([1; 20]),
        };
        let err = chain.submit(&action).await.unwrap_err();
        assert!(matches!(err, BasketkitError::SubmissionRejected { .. }));
        assert!(chain.submitted().is_empty());
    }
}
