//! Liquidity sufficiency check.
//!
//! Given what a basket needs per unit of `total_quantity` and what the
//! aggregated liquidity orders supply, decide whether filling
//! `quantity_to_fill` is covered.

use std::collections::BTreeMap;

use basketkit_types::{Address, BasketkitError, ComponentFillMap, Result};
use rust_decimal::Decimal;

use crate::invariants::assert_equal_length;
use crate::partial::calculate_partial_amount;

/// Verify that `fills` cover every required component.
///
/// For each `required_tokens[i]`:
/// - if `underlying` maps it to an underlying asset, the underlying must be
///   present in `fills` with a positive amount (no scaling);
/// - otherwise the need is `required_amounts[i] * quantity_to_fill /
///   total_quantity` (truncated) and `fills[token] >= need` must hold.
///
/// # Errors
/// - `LengthMismatch` if tokens and amounts differ in length
/// - `InsufficientLiquidity` if an underlying asset is missing
/// - `InsufficientComponentAmount` if a component is under-supplied
/// - `InvalidQuantity` if `total_quantity` is zero
pub fn verify_liquidity_sufficiency(
    required_tokens: &[Address],
    required_amounts: &[Decimal],
    fills: &ComponentFillMap,
    total_quantity: Decimal,
    quantity_to_fill: Decimal,
    underlying: &BTreeMap<Address, Address>,
) -> Result<()> {
    assert_equal_length(required_tokens, required_amounts)?;

    for (token, required) in required_tokens.iter().zip(required_amounts) {
        if let Some(asset) = underlying.get(token) {
            if fills.get(asset) <= Decimal::ZERO {
                return Err(BasketkitError::InsufficientLiquidity { token: *asset });
            }
            continue;
        }

        let need = calculate_partial_amount(*required, quantity_to_fill, total_quantity)?;
        let have = fills.get(token);
        if have < need {
            return Err(BasketkitError::InsufficientComponentAmount {
                token: *token,
                have,
                need,
            });
        }
    }

    tracing::debug!(
        components = required_tokens.len(),
        quantity = %quantity_to_fill,
        "Liquidity covers all required components"
    );
    Ok(())
}
