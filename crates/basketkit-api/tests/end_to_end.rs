//! End-to-end tests across all three planes.
//!
//! These drive a rebalancing token through its lifecycle with the public
//! client: checks (`basketkit-checks`) → guards (`basketkit-guard`) →
//! orchestration (`basketkit-api`), against the in-memory chain.
//!
//! The mock chain records submitted actions but never applies them, so
//! each test moves the on-chain state forward by hand between steps.

use std::sync::Arc;

use basketkit_api::{BasketkitClient, Collaborators};
use basketkit_guard::mock::{InMemoryChain, MockRebalancingToken};
use basketkit_types::*;
use rust_decimal::Decimal;

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

const TOKEN: Address = Address([0x70; 20]);
const MANAGER: Address = Address([0x4D; 20]);
const BIDDER: Address = Address([0xB1; 20]);
const CURRENT: Address = Address([0x0C; 20]);
const NEXT: Address = Address([0x0E; 20]);
const LIBRARY: Address = Address([0x1B; 20]);
const A: Address = Address([0x0A; 20]);
const B: Address = Address([0x0B; 20]);

fn setup() -> Arc<InMemoryChain> {
    let chain = Arc::new(InMemoryChain::new());
    chain.add_set(CURRENT, dec(10), vec![A], vec![dec(10)]);
    chain.add_set(NEXT, dec(100), vec![B], vec![dec(100)]);
    chain.add_price_library(LIBRARY);

    let mut token = MockRebalancingToken::new(MANAGER, CURRENT);
    token.last_rebalance_timestamp = 0;
    token.rebalance_interval = 100;
    chain.add_rebalancing_token(TOKEN, token);

    chain.set_bid_pricing(TOKEN, vec![B, A], vec![dec(2), dec(0)], vec![dec(0), dec(1)]);
    chain
}

fn client(chain: &Arc<InMemoryChain>, now: Timestamp) -> BasketkitClient {
    BasketkitClient::new(Collaborators::in_memory(chain, now), ProtocolConfig::dummy()).unwrap()
}

fn proposal(caller: Address) -> ProposalRequest {
    ProposalRequest {
        rebalancing_token: TOKEN,
        next_set: NEXT,
        auction_library: LIBRARY,
        auction_time_to_pivot: 3_600,
        auction_start_price: dec(500),
        auction_pivot_price: dec(1_000),
        caller,
    }
}

fn enter_rebalance(chain: &InMemoryChain, minimum_bid: i64, remaining: i64) {
    chain.update_rebalancing_token(TOKEN, |t| {
        t.state = RebalanceState::Rebalance;
        t.next_set = Some(NEXT);
        t.bidding = BiddingParameters {
            minimum_bid: dec(minimum_bid),
            remaining_current_sets: dec(remaining),
        };
        t.auction = AuctionPriceParameters {
            auction_start_time: 1_000,
            auction_time_to_pivot: 3_600,
            auction_start_price: dec(500),
            auction_pivot_price: dec(1_000),
        };
    });
}

fn bid(quantity: i64) -> BidRequest {
    BidRequest {
        rebalancing_token: TOKEN,
        bid_quantity: dec(quantity),
        requester: BIDDER,
    }
}

#[tokio::test]
async fn full_rebalance_lifecycle() {
    let chain = setup();
    let proxy = ProtocolConfig::dummy().transfer_proxy;

    // 1. Propose after the cooldown.
    let proposed = client(&chain, 100)
        .rebalancing
        .propose(&proposal(MANAGER))
        .await
        .unwrap();
    assert_eq!(proposed.action.name(), "propose");

    chain.update_rebalancing_token(TOKEN, |t| {
        t.state = RebalanceState::Proposal;
        t.next_set = Some(NEXT);
        t.proposal_start_time = 100;
        t.proposal_period = 50;
    });

    // 2. Start the auction once the proposal period is over.
    let early = client(&chain, 149)
        .rebalancing
        .start_rebalance(TOKEN, BIDDER)
        .await
        .unwrap_err();
    assert!(matches!(
        early,
        BasketkitError::TimingNotElapsed { available_at: 150, .. }
    ));
    client(&chain, 150)
        .rebalancing
        .start_rebalance(TOKEN, BIDDER)
        .await
        .unwrap();

    enter_rebalance(&chain, 5, 100);

    // 3. Bid: quote at minimum bid 5 is 10 of B, scaled to 10 sets is 20.
    chain.fund(B, BIDDER, proxy, dec(20));
    let bid_action = client(&chain, 1_100)
        .rebalancing
        .bid(&bid(10))
        .await
        .unwrap();
    assert_eq!(
        bid_action.action,
        Action::Bid {
            from: BIDDER,
            rebalancing_token: TOKEN,
            quantity: dec(10),
        }
    );

    // 4. Settle once fewer than a minimum bid remain.
    let blocked = client(&chain, 1_200)
        .rebalancing
        .settle_rebalance(TOKEN, BIDDER)
        .await
        .unwrap_err();
    assert!(matches!(blocked, BasketkitError::OutOfRange { .. }));

    chain.update_rebalancing_token(TOKEN, |t| t.bidding.remaining_current_sets = dec(4));
    client(&chain, 1_200)
        .rebalancing
        .settle_rebalance(TOKEN, BIDDER)
        .await
        .unwrap();

    let names: Vec<&str> = chain.submitted().iter().map(Action::name).collect();
    assert_eq!(names, vec!["propose", "start_rebalance", "bid", "settle"]);
}

#[tokio::test]
async fn propose_by_non_manager_is_not_authorized() {
    let chain = setup();
    let err = client(&chain, 100)
        .rebalancing
        .propose(&proposal(BIDDER))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BasketkitError::NotAuthorized { caller, manager, .. }
            if caller == BIDDER && manager == MANAGER
    ));
    assert!(chain.submitted().is_empty());
}

#[tokio::test]
async fn propose_before_cooldown_reports_next_available_time() {
    let chain = setup();
    let err = client(&chain, 99)
        .rebalancing
        .propose(&proposal(MANAGER))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BasketkitError::TimingNotElapsed { available_at: 100, now: 99, .. }
    ));
    assert!(err.to_string().contains("next available at"));
    assert_eq!(
        client(&chain, 0)
            .rebalancing
            .next_rebalance_available_at(TOKEN)
            .await
            .unwrap(),
        100
    );
}

#[tokio::test]
async fn propose_unrecognized_next_set() {
    let chain = setup();
    let mut request = proposal(MANAGER);
    request.next_set = Address([0xFF; 20]);
    let err = client(&chain, 100)
        .rebalancing
        .propose(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, BasketkitError::UnrecognizedBasket(set) if set == request.next_set));
}

#[tokio::test]
async fn propose_incompatible_natural_unit() {
    let chain = setup();
    let odd = Address([0x0D; 20]);
    chain.add_set(odd, dec(15), vec![B], vec![dec(15)]);
    let mut request = proposal(MANAGER);
    request.next_set = odd;
    let err = client(&chain, 100)
        .rebalancing
        .propose(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, BasketkitError::InvalidNaturalUnit { .. }));
}

#[tokio::test]
async fn propose_unrecognized_price_library() {
    let chain = setup();
    let mut request = proposal(MANAGER);
    request.auction_library = Address([0x99; 20]);
    let err = client(&chain, 100)
        .rebalancing
        .propose(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, BasketkitError::UnrecognizedPriceLibrary(_)));
}

#[tokio::test]
async fn start_rebalance_in_default_is_incorrect_state() {
    let chain = setup();
    let err = client(&chain, 10_000)
        .rebalancing
        .start_rebalance(TOKEN, BIDDER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BasketkitError::IncorrectState { actual: RebalanceState::Default, .. }
    ));
}

#[tokio::test]
async fn bid_in_proposal_is_incorrect_state() {
    let chain = setup();
    chain.update_rebalancing_token(TOKEN, |t| t.state = RebalanceState::Proposal);
    let err = client(&chain, 0)
        .rebalancing
        .bid(&bid(5))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BasketkitError::IncorrectState { actual: RebalanceState::Proposal, .. }
    ));
}

#[tokio::test]
async fn bid_not_multiple_of_minimum() {
    let chain = setup();
    enter_rebalance(&chain, 5, 100);
    let err = client(&chain, 1_100)
        .rebalancing
        .bid(&bid(7))
        .await
        .unwrap_err();
    assert!(matches!(err, BasketkitError::NotAMultiple { .. }));
    assert!(chain.submitted().is_empty());
}

#[tokio::test]
async fn bid_without_allowance_is_rejected() {
    let chain = setup();
    enter_rebalance(&chain, 5, 100);
    chain.set_balance(B, BIDDER, dec(20));
    let err = client(&chain, 1_100)
        .rebalancing
        .bid(&bid(10))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BasketkitError::InsufficientAllowance { token, have, need, .. }
            if token == B && have.is_zero() && need == dec(20)
    ));
    assert!(chain.submitted().is_empty());
}

#[tokio::test]
async fn settle_boundary() {
    let chain = setup();
    enter_rebalance(&chain, 5, 5);
    let err = client(&chain, 1_100)
        .rebalancing
        .settle_rebalance(TOKEN, BIDDER)
        .await
        .unwrap_err();
    assert!(matches!(err, BasketkitError::OutOfRange { .. }));

    chain.update_rebalancing_token(TOKEN, |t| t.bidding.remaining_current_sets = dec(4));
    assert!(
        client(&chain, 1_100)
            .rebalancing
            .settle_rebalance(TOKEN, BIDDER)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn failed_auction_drawdown() {
    let chain = setup();
    enter_rebalance(&chain, 5, 50);

    // Pivot is 1_000 + 3_600.
    let early = client(&chain, 4_599)
        .rebalancing
        .end_failed_auction(TOKEN, BIDDER)
        .await
        .unwrap_err();
    assert!(matches!(
        early,
        BasketkitError::TimingNotElapsed { available_at: 4_600, .. }
    ));

    let ended = client(&chain, 4_600)
        .rebalancing
        .end_failed_auction(TOKEN, BIDDER)
        .await
        .unwrap();
    assert_eq!(ended.action.name(), "end_failed_auction");

    // An exhausted auction settles instead of drawing down.
    chain.update_rebalancing_token(TOKEN, |t| t.bidding.remaining_current_sets = dec(4));
    let err = client(&chain, 4_600)
        .rebalancing
        .end_failed_auction(TOKEN, BIDDER)
        .await
        .unwrap_err();
    assert!(matches!(err, BasketkitError::OutOfRange { .. }));
}

#[tokio::test]
async fn rejected_submission_surfaces() {
    let chain = setup();
    enter_rebalance(&chain, 5, 0);
    chain.reject_submissions("replacement transaction underpriced");
    let err = client(&chain, 1_100)
        .rebalancing
        .settle_rebalance(TOKEN, BIDDER)
        .await
        .unwrap_err();
    assert!(matches!(err, BasketkitError::SubmissionRejected { .. }));
}

#[tokio::test]
async fn exchange_issue_from_mixed_liquidity() {
    let chain = setup();
    let x = Address([0x58; 20]);
    let basket = Address([0x5E; 20]);
    chain.add_set(basket, dec(1), vec![x], vec![dec(9)]);
    chain.fund(A, BIDDER, ProtocolConfig::dummy().transfer_proxy, dec(1));

    let orders: Vec<FillOrder> = serde_json::from_value(serde_json::json!([
        {
            "kind": "limit_order",
            "maker_asset_amount": "100",
            "taker_asset_amount": "50",
            "fill_amount": "25",
            "maker_asset_data": encode_erc20_asset_data(x),
        },
        {
            "kind": "amm_trade",
            "destination_token": x.to_string(),
            "max_destination_quantity": "40",
            "source_token_quantity": "1",
        },
        { "kind": "dutch_auction" },
    ]))
    .unwrap();
    assert_eq!(orders[2], FillOrder::Unsupported);

    let mut request = ExchangeIssuanceRequest {
        params: ExchangeIssuanceParams {
            set: basket,
            quantity: dec(10),
            send_tokens: vec![A],
            send_token_exchange_ids: vec![1],
            send_token_amounts: vec![dec(1)],
            receive_tokens: vec![x],
            receive_token_amounts: vec![dec(90)],
        },
        orders,
        expiration: 2_000,
        caller: BIDDER,
        pay_with_native: false,
    };
    let api = client(&chain, 1_000);
    api.exchange_issuance.exchange_issue(&request).await.unwrap();

    request.params.receive_token_amounts = vec![dec(91)];
    let err = api
        .exchange_issuance
        .exchange_issue(&request)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BasketkitError::InsufficientComponentAmount { token, .. } if token == x
    ));
    assert_eq!(chain.submitted().len(), 1);
}

#[tokio::test]
async fn issue_then_redeem() {
    let chain = setup();
    let proxy = ProtocolConfig::dummy().transfer_proxy;
    chain.fund(A, BIDDER, proxy, dec(100));
    let api = client(&chain, 0);

    let required = api.issuance.required_components(CURRENT, dec(100)).await.unwrap();
    assert_eq!(required[0].amount, dec(100));

    api.issuance
        .issue(&IssuanceRequest {
            set: CURRENT,
            quantity: dec(100),
            caller: BIDDER,
        })
        .await
        .unwrap();

    chain.set_balance(CURRENT, BIDDER, dec(100));
    api.issuance
        .redeem(&RedemptionRequest {
            set: CURRENT,
            quantity: dec(100),
            caller: BIDDER,
            withdraw: false,
        })
        .await
        .unwrap();

    let names: Vec<&str> = chain.submitted().iter().map(Action::name).collect();
    assert_eq!(names, vec!["issue", "redeem"]);
}
