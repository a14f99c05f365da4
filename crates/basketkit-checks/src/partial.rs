//! Proportional partial-amount math.
//!
//! `partial = total * numerator / denominator`, kept at the scale of
//! `total`. The remainder modulo one step at that scale is taken first so
//! the result is exact, then truncated (or, in the one rounding-up case,
//! bumped by one step when anything was left over).

use basketkit_types::{BasketkitError, Result};
use rust_decimal::Decimal;

/// Largest scale a `Decimal` can carry.
const MAX_SCALE: u32 = 28;

/// `total * numerator / denominator`, truncated toward zero at the scale
/// of `total`.
///
/// Used for limit-order partial fills and for scaling required component
/// amounts down to the quantity actually being filled.
///
/// # Errors
/// `InvalidQuantity` if `denominator` is zero, `ArithmeticOverflow` if the
/// intermediate product does not fit.
pub fn calculate_partial_amount(
    total: Decimal,
    numerator: Decimal,
    denominator: Decimal,
) -> Result<Decimal> {
    let (quotient, _, _) = divide_exact(total, numerator, denominator)?;
    Ok(quotient)
}

/// Like [`calculate_partial_amount`] but rounds any positive residue at
/// the scale of `total` up by one step.
///
/// Used where under-estimating would let the client approve an action the
/// chain then rejects: a bidder's required inflow scaled to the bid size.
///
/// # Errors
/// Same as [`calculate_partial_amount`].
pub fn calculate_partial_amount_round_up(
    total: Decimal,
    numerator: Decimal,
    denominator: Decimal,
) -> Result<Decimal> {
    let (quotient, remainder, step) = divide_exact(total, numerator, denominator)?;
    if remainder > Decimal::ZERO {
        return quotient
            .checked_add(step)
            .ok_or_else(|| overflow("partial amount round up"));
    }
    Ok(quotient)
}

/// Quotient truncated at the scale of `total`, the remainder left below
/// that scale, and the size of one step at that scale.
fn divide_exact(
    total: Decimal,
    numerator: Decimal,
    denominator: Decimal,
) -> Result<(Decimal, Decimal, Decimal)> {
    if denominator.is_zero() {
        return Err(BasketkitError::InvalidQuantity {
            quantity: denominator,
            reason: "partial amount denominator must be non-zero".to_string(),
        });
    }
    let denominator = denominator.normalize();
    // `denominator * step` must stay exact.
    let scale = total.scale().min(MAX_SCALE - denominator.scale());
    let step = Decimal::new(1, scale);

    let product = total
        .checked_mul(numerator)
        .ok_or_else(|| overflow("partial amount product"))?;
    let modulus = denominator
        .checked_mul(step)
        .ok_or_else(|| overflow("partial amount modulus"))?;
    let remainder = product
        .checked_rem(modulus)
        .ok_or_else(|| overflow("partial amount remainder"))?;
    let quotient = (product - remainder)
        .checked_div(denominator)
        .ok_or_else(|| overflow("partial amount quotient"))?
        .round_dp(scale);
    Ok((quotient, remainder, step))
}

fn overflow(context: &str) -> BasketkitError {
    BasketkitError::ArithmeticOverflow {
        context: context.to_string(),
    }
}
