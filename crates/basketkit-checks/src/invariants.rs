//! Quantity and proportion invariants.
//!
//! Stateless assertions over decimal amounts and sequences. Each one
//! returns the first violation it sees; callers chain them with `?` so the
//! first failing check of a request is the error the caller gets back.

use basketkit_types::{BasketkitError, Result, Timestamp};
use rust_decimal::Decimal;

/// # Errors
/// `InvalidQuantity` if `quantity <= 0`.
pub fn assert_positive(quantity: Decimal) -> Result<()> {
    if quantity <= Decimal::ZERO {
        return Err(BasketkitError::InvalidQuantity {
            quantity,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// # Errors
/// `OutOfRange` if `value < min`.
pub fn assert_greater_or_equal(value: Decimal, min: Decimal) -> Result<()> {
    if value < min {
        return Err(BasketkitError::OutOfRange {
            value,
            bound: format!(">= {min}"),
        });
    }
    Ok(())
}

/// # Errors
/// `OutOfRange` if `value > max`.
pub fn assert_less_or_equal(value: Decimal, max: Decimal) -> Result<()> {
    if value > max {
        return Err(BasketkitError::OutOfRange {
            value,
            bound: format!("<= {max}"),
        });
    }
    Ok(())
}

/// # Errors
/// `InvalidQuantity` if `base` is zero, `NotAMultiple` if `quantity mod base != 0`.
pub fn assert_multiple_of(quantity: Decimal, base: Decimal) -> Result<()> {
    let remainder = quantity
        .checked_rem(base)
        .ok_or_else(|| BasketkitError::InvalidQuantity {
            quantity: base,
            reason: "base unit must be non-zero".to_string(),
        })?;
    if !remainder.is_zero() {
        return Err(BasketkitError::NotAMultiple { quantity, base });
    }
    Ok(())
}

/// # Errors
/// `LengthMismatch` if the slices differ in length.
pub fn assert_equal_length<A, B>(left: &[A], right: &[B]) -> Result<()> {
    if left.len() != right.len() {
        return Err(BasketkitError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(())
}

/// Require the proportions to sum to exactly one.
///
/// The comparison is exact: `[0.3, 0.3, 0.4]` passes, anything that is off
/// by a rounding residue does not.
///
/// # Errors
/// `ProportionsInvalid` unless the sum equals 1, `ArithmeticOverflow` if
/// the sum overflows.
pub fn assert_proportions_sum_to_one(proportions: &[Decimal]) -> Result<()> {
    let sum = proportions
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p))
        .ok_or_else(|| BasketkitError::ArithmeticOverflow {
            context: "sum of proportions".to_string(),
        })?;
    if sum != Decimal::ONE {
        return Err(BasketkitError::ProportionsInvalid { sum });
    }
    Ok(())
}

/// # Errors
/// `EmptyInput` if `items` is empty.
pub fn assert_not_empty<T>(items: &[T], what: &str) -> Result<()> {
    if items.is_empty() {
        return Err(BasketkitError::EmptyInput {
            what: what.to_string(),
        });
    }
    Ok(())
}

/// # Errors
/// `Expired` if `now` is past `expiration`.
pub fn assert_expiration_not_passed(expiration: Timestamp, now: Timestamp) -> Result<()> {
    if now > expiration {
        return Err(BasketkitError::Expired { expiration, now });
    }
    Ok(())
}
