//! # basketkit-checks
//!
//! **Pure client-side validation for basketkit.**
//!
//! Everything here is synchronous and side-effect free:
//!
//! - **Invariants**: positivity, one-sided bounds, multiple-of, length
//!   parity, non-empty, expiration, proportions summing to exactly one
//! - **Partial amounts**: `total * numerator / denominator` with truncation
//!   (and one rounding-up variant)
//! - **Aggregation**: per-token liquidity supplied by heterogeneous fill orders
//! - **Sufficiency**: whether aggregated liquidity covers a basket's components
//!
//! Every check fails fast with a specific [`basketkit_types::BasketkitError`].

pub mod aggregator;
pub mod invariants;
pub mod liquidity;
pub mod partial;

pub use aggregator::aggregate_fills;
pub use invariants::{
    assert_equal_length, assert_expiration_not_passed, assert_greater_or_equal,
    assert_less_or_equal, assert_multiple_of, assert_not_empty, assert_positive,
    assert_proportions_sum_to_one,
};
pub use liquidity::verify_liquidity_sufficiency;
pub use partial::{calculate_partial_amount, calculate_partial_amount_round_up};
