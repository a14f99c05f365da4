//! Rebalance state machine guard.
//!
//! Encodes when each lifecycle transition is legal:
//!
//! ```text
//! propose          DEFAULT/PROPOSAL/DRAWDOWN → PROPOSAL   (manager, cooldown, basket checks)
//! start_rebalance  PROPOSAL → REBALANCE                   (proposal period elapsed)
//! bid              REBALANCE                              (quantity sizing)
//! settle           REBALANCE → DEFAULT                    (remaining < minimum bid)
//! end_failed       REBALANCE → DRAWDOWN                   (pivot passed, bids remaining)
//! update_manager   any                                    (manager)
//! ```
//!
//! Every guard is a synchronous predicate over a state snapshot and the
//! current time. Guards never mutate and never retry; the first violated
//! precondition is returned as a specific error.
//!
//! Settle and end-failed-auction are evaluated independently. They are not
//! an if/else pair: callers must not infer one from the other's failure.

use basketkit_checks::{assert_less_or_equal, assert_multiple_of, assert_positive};
use basketkit_types::{
    Address, AuctionPriceParameters, BasketkitError, BiddingParameters, ProposalTiming,
    RebalanceState, Result, Timestamp, constants,
};
use rust_decimal::Decimal;

/// Everything the propose guard needs, fetched by the caller.
#[derive(Debug, Clone)]
pub struct ProposalSnapshot {
    pub state: RebalanceState,
    pub manager: Address,
    pub last_rebalance_timestamp: Timestamp,
    pub rebalance_interval: u64,
    pub next_set: Address,
    pub next_set_recognized: bool,
    pub auction_library: Address,
    pub auction_library_recognized: bool,
    pub current_natural_unit: Decimal,
    pub next_natural_unit: Decimal,
    pub auction_time_to_pivot: u64,
    pub auction_start_price: Decimal,
    pub auction_pivot_price: Decimal,
}

/// # Errors
/// `NotAuthorized` if `caller` is not `manager`.
pub fn assert_is_manager(action: &'static str, caller: Address, manager: Address) -> Result<()> {
    if caller != manager {
        return Err(BasketkitError::NotAuthorized {
            action,
            caller,
            manager,
        });
    }
    Ok(())
}

/// # Errors
/// `IncorrectState` unless `actual == expected`.
pub fn assert_state(
    action: &'static str,
    actual: RebalanceState,
    expected: RebalanceState,
) -> Result<()> {
    if actual != expected {
        return Err(BasketkitError::IncorrectState { action, actual });
    }
    Ok(())
}

/// # Errors
/// `TimingNotElapsed` until `last_rebalance + interval`.
pub fn assert_cooldown_elapsed(
    last_rebalance: Timestamp,
    interval: u64,
    now: Timestamp,
) -> Result<()> {
    let available_at = last_rebalance.saturating_add(interval);
    if now < available_at {
        return Err(BasketkitError::TimingNotElapsed {
            what: "rebalance interval",
            available_at,
            now,
        });
    }
    Ok(())
}

/// Next and current natural units must divide one another, in either direction.
///
/// # Errors
/// `InvalidNaturalUnit` otherwise (including non-positive units).
pub fn assert_natural_units_compatible(current: Decimal, next: Decimal) -> Result<()> {
    let invalid = || BasketkitError::InvalidNaturalUnit { current, next };
    if current <= Decimal::ZERO || next <= Decimal::ZERO {
        return Err(invalid());
    }
    let divides = |a: Decimal, b: Decimal| a.checked_rem(b).is_some_and(|r| r.is_zero());
    if divides(next, current) || divides(current, next) {
        Ok(())
    } else {
        Err(invalid())
    }
}

/// The auction price curve must be positive and the pivot price within
/// `[start / MIN_PIVOT_PRICE_DIVISOR, start * MAX_PIVOT_PRICE_MULTIPLIER]`.
///
/// # Errors
/// `InvalidQuantity` for non-positive inputs, `OutOfRange` for a pivot price
/// outside the band.
pub fn assert_price_curve_valid(
    time_to_pivot: u64,
    start_price: Decimal,
    pivot_price: Decimal,
) -> Result<()> {
    assert_positive(Decimal::from(time_to_pivot))?;
    assert_positive(start_price)?;
    assert_positive(pivot_price)?;

    let max = start_price
        .checked_mul(Decimal::from(constants::MAX_PIVOT_PRICE_MULTIPLIER))
        .ok_or_else(|| BasketkitError::ArithmeticOverflow {
            context: "maximum pivot price".to_string(),
        })?;
    let min = start_price / Decimal::from(constants::MIN_PIVOT_PRICE_DIVISOR);
    if pivot_price < min {
        return Err(BasketkitError::OutOfRange {
            value: pivot_price,
            bound: format!(">= {min}"),
        });
    }
    assert_less_or_equal(pivot_price, max)
}

/// Guard for proposing the next basket.
///
/// Checked in order: manager, not mid-auction, cooldown, next basket
/// recognized, price library recognized, natural units, price curve.
///
/// # Errors
/// The first violated precondition.
pub fn assert_can_propose(
    snapshot: &ProposalSnapshot,
    caller: Address,
    now: Timestamp,
) -> Result<()> {
    assert_is_manager("propose", caller, snapshot.manager)?;
    if snapshot.state == RebalanceState::Rebalance {
        return Err(BasketkitError::IncorrectState {
            action: "propose",
            actual: snapshot.state,
        });
    }
    assert_cooldown_elapsed(
        snapshot.last_rebalance_timestamp,
        snapshot.rebalance_interval,
        now,
    )?;
    if !snapshot.next_set_recognized {
        return Err(BasketkitError::UnrecognizedBasket(snapshot.next_set));
    }
    if !snapshot.auction_library_recognized {
        return Err(BasketkitError::UnrecognizedPriceLibrary(
            snapshot.auction_library,
        ));
    }
    assert_natural_units_compatible(snapshot.current_natural_unit, snapshot.next_natural_unit)?;
    assert_price_curve_valid(
        snapshot.auction_time_to_pivot,
        snapshot.auction_start_price,
        snapshot.auction_pivot_price,
    )?;

    tracing::debug!(next_set = %snapshot.next_set, "Propose guard passed");
    Ok(())
}

/// Guard for starting the auction once the proposal period is over.
///
/// # Errors
/// `IncorrectState` outside PROPOSAL, `TimingNotElapsed` before the period ends.
pub fn assert_can_start_rebalance(
    state: RebalanceState,
    timing: &ProposalTiming,
    now: Timestamp,
) -> Result<()> {
    assert_state("start rebalance", state, RebalanceState::Proposal)?;
    let available_at = timing.ends_at();
    if now < available_at {
        return Err(BasketkitError::TimingNotElapsed {
            what: "proposal period",
            available_at,
            now,
        });
    }
    Ok(())
}

/// Guard for the sizing of a bid.
///
/// # Errors
/// `IncorrectState` outside REBALANCE, `InvalidQuantity` for a
/// non-positive bid, `OutOfRange` above the remaining sets, `NotAMultiple`
/// if not a multiple of the minimum bid.
pub fn assert_can_bid(
    state: RebalanceState,
    bidding: &BiddingParameters,
    quantity: Decimal,
) -> Result<()> {
    assert_state("bid", state, RebalanceState::Rebalance)?;
    assert_positive(quantity)?;
    assert_less_or_equal(quantity, bidding.remaining_current_sets)?;
    assert_multiple_of(quantity, bidding.minimum_bid)
}

/// Guard for settling a finished auction.
///
/// The auction counts as finished only when fewer than `minimum_bid` sets
/// remain; exactly `minimum_bid` remaining still blocks settlement.
///
/// # Errors
/// `IncorrectState` outside REBALANCE, `OutOfRange` while a minimum bid
/// could still be placed.
pub fn assert_can_settle(state: RebalanceState, bidding: &BiddingParameters) -> Result<()> {
    assert_state("settle rebalance", state, RebalanceState::Rebalance)?;
    if bidding.has_remaining_bids() {
        return Err(BasketkitError::OutOfRange {
            value: bidding.remaining_current_sets,
            bound: format!("< minimum bid {} to settle", bidding.minimum_bid),
        });
    }
    Ok(())
}

/// # Errors
/// `OutOfRange` if fewer than `minimum_bid` sets remain.
pub fn assert_enough_remaining_bids(bidding: &BiddingParameters) -> Result<()> {
    if !bidding.has_remaining_bids() {
        return Err(BasketkitError::OutOfRange {
            value: bidding.remaining_current_sets,
            bound: format!(">= minimum bid {} to end a failed auction", bidding.minimum_bid),
        });
    }
    Ok(())
}

/// Guard for ending a failed auction (REBALANCE → DRAWDOWN).
///
/// # Errors
/// `IncorrectState` outside REBALANCE, `TimingNotElapsed` before the pivot
/// time, `OutOfRange` if the auction is in fact exhausted.
pub fn assert_can_end_failed_auction(
    state: RebalanceState,
    bidding: &BiddingParameters,
    auction: &AuctionPriceParameters,
    now: Timestamp,
) -> Result<()> {
    assert_state("end failed auction", state, RebalanceState::Rebalance)?;
    let pivot = auction.pivot_time();
    if now < pivot {
        return Err(BasketkitError::TimingNotElapsed {
            what: "auction pivot time",
            available_at: pivot,
            now,
        });
    }
    assert_enough_remaining_bids(bidding)
}
