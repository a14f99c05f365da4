//! Liquidity fill aggregation.
//!
//! Sums what a list of heterogeneous liquidity orders delivers, per token:
//!
//! - **Limit order**: the maker-side amount scaled by the fraction of the
//!   taker side being filled, `maker * fill / taker`, truncated at the maker amount's scale.
//! - **AMM trade**: exactly `max_destination_quantity`, unscaled.
//! - **Unsupported**: nothing.
//!
//! The result is a plain per-key sum, so it does not depend on the order
//! of the input list.

use basketkit_types::{Address, AmmTrade, ComponentFillMap, FillOrder, LimitOrder, Result};
use rust_decimal::Decimal;

use crate::invariants::assert_positive;
use crate::partial::calculate_partial_amount;

/// Aggregate the per-token inflow supplied by `orders`.
///
/// # Errors
/// - `InvalidQuantity` if a limit order's `fill_amount` or an AMM trade's
///   `source_token_quantity` is not positive, or a taker amount is zero
/// - `InvalidAssetData` if a limit order's maker asset cannot be decoded
/// - `ArithmeticOverflow` if a contribution or running total overflows
pub fn aggregate_fills(orders: &[FillOrder]) -> Result<ComponentFillMap> {
    let mut fills = ComponentFillMap::new();

    for order in orders {
        match order {
            FillOrder::LimitOrder(limit) => {
                let (token, amount) = limit_order_contribution(limit)?;
                fills.accumulate(token, amount)?;
            }
            FillOrder::AmmTrade(trade) => {
                let amount = amm_trade_contribution(trade)?;
                fills.accumulate(trade.destination_token, amount)?;
            }
            FillOrder::Unsupported => {
                tracing::debug!("Skipping unsupported fill order");
            }
        }
    }

    tracing::debug!(
        orders = orders.len(),
        tokens = fills.len(),
        "Aggregated fill orders"
    );
    Ok(fills)
}

fn limit_order_contribution(order: &LimitOrder) -> Result<(Address, Decimal)> {
    assert_positive(order.fill_amount)?;
    let token = order.maker_token()?;
    let amount = calculate_partial_amount(
        order.maker_asset_amount,
        order.fill_amount,
        order.taker_asset_amount,
    )?;
    Ok((token, amount))
}

fn amm_trade_contribution(trade: &AmmTrade) -> Result<Decimal> {
    assert_positive(trade.source_token_quantity)?;
    Ok(trade.max_destination_quantity)
}

#[cfg(test)]
mod tests {
    use basketkit_types::*;

    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn token_x() -> Address {
        Address([0x11; 20])
    }

    #[test]
    fn limit_order_partial_fill_scaling() {
        let orders = [FillOrder::dummy_limit(token_x(), dec(100), dec(50), dec(25))];
        let fills = aggregate_fills(&orders).unwrap();
        assert_eq!(fills.get(&token_x()), dec(50));
    }

    #[test]
    fn fractional_maker_amounts_are_kept() {
        let orders = [
            FillOrder::dummy_limit(token_x(), Decimal::new(5, 1), dec(1), dec(1)),
            FillOrder::dummy_limit(token_x(), Decimal::new(125, 2), dec(2), dec(1)),
        ];
        let fills = aggregate_fills(&orders).unwrap();
        // 0.5 + trunc(1.25 / 2) at two decimal places
        assert_eq!(fills.get(&token_x()), Decimal::new(112, 2));
    }

    #[test]
    fn amm_contribution_is_unscaled() {
        for source in [dec(1), dec(7), dec(1_000_000)] {
            let orders = [FillOrder::AmmTrade(AmmTrade {
                destination_token: token_x(),
                max_destination_quantity: dec(40),
                source_token_quantity: source,
            })];
            assert_eq!(aggregate_fills(&orders).unwrap().get(&token_x()), dec(40));
        }
    }

    #[test]
    fn mixed_orders_sum_per_token() {
        let orders = [
            FillOrder::dummy_limit(token_x(), dec(100), dec(50), dec(25)),
            FillOrder::dummy_amm(token_x(), dec(40)),
        ];
        let fills = aggregate_fills(&orders).unwrap();
        assert_eq!(fills.get(&token_x()), dec(90));
        assert_eq!(fills.len(), 1);
    }

    #[test]
    fn unsupported_orders_contribute_nothing() {
        let orders = [
            FillOrder::Unsupported,
            FillOrder::dummy_amm(token_x(), dec(5)),
            FillOrder::Unsupported,
        ];
        let fills = aggregate_fills(&orders).unwrap();
        assert_eq!(fills.get(&token_x()), dec(5));
        assert_eq!(fills.len(), 1);
    }

    #[test]
    fn empty_order_list_is_empty_map() {
        assert!(aggregate_fills(&[]).unwrap().is_empty());
    }

    #[test]
    fn zero_fill_amount_rejected() {
        let orders = [FillOrder::dummy_limit(token_x(), dec(100), dec(50), Decimal::ZERO)];
        let err = aggregate_fills(&orders).unwrap_err();
        assert!(matches!(err, BasketkitError::InvalidQuantity { .. }));
    }

    #[test]
    fn zero_source_quantity_rejected() {
        let orders = [FillOrder::AmmTrade(AmmTrade {
            destination_token: token_x(),
            max_destination_quantity: dec(40),
            source_token_quantity: Decimal::ZERO,
        })];
        let err = aggregate_fills(&orders).unwrap_err();
        assert!(matches!(err, BasketkitError::InvalidQuantity { .. }));
    }

    #[test]
    fn zero_taker_amount_rejected() {
        let orders = [FillOrder::dummy_limit(token_x(), dec(100), Decimal::ZERO, dec(1))];
        let err = aggregate_fills(&orders).unwrap_err();
        assert!(matches!(err, BasketkitError::InvalidQuantity { .. }));
    }

    #[test]
    fn undecodable_asset_data_rejected() {
        let orders = [FillOrder::LimitOrder(LimitOrder {
            maker_asset_data: "0xdeadbeef".to_string(),
            maker_asset_amount: dec(1),
            taker_asset_amount: dec(1),
            fill_amount: dec(1),
        })];
        let err = aggregate_fills(&orders).unwrap_err();
        assert!(matches!(err, BasketkitError::InvalidAssetData { .. }));
    }

    #[test]
    fn differently_cased_asset_data_share_a_key() {
        let upper = encode_erc20_asset_data(Address([0xAB; 20])).to_uppercase();
        let orders = [
            FillOrder::LimitOrder(LimitOrder {
                maker_asset_data: upper[2..].to_string(),
                maker_asset_amount: dec(10),
                taker_asset_amount: dec(10),
                fill_amount: dec(10),
            }),
            FillOrder::dummy_amm(Address([0xAB; 20]), dec(1)),
        ];
        let fills = aggregate_fills(&orders).unwrap();
        assert_eq!(fills.get(&Address([0xAB; 20])), dec(11));
    }
}
