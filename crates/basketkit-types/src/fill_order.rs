//! Liquidity orders supplied for order-based issuance and bidding.
//!
//! Orders come from outside the SDK (a relayer, an aggregator, the caller)
//! and are decided into a [`FillOrder`] variant once, at deserialization.
//! They are immutable inputs: aggregation produces a new map and never
//! touches the orders themselves.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, BasketkitError, Result, constants};

/// A signed limit order being filled (partially or fully) right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrder {
    /// Total maker-side amount of the order.
    pub maker_asset_amount: Decimal,
    /// Total taker-side amount of the order. Together with
    /// `maker_asset_amount` this fixes the order's ratio.
    pub taker_asset_amount: Decimal,
    /// How much of the taker amount is being filled now.
    pub fill_amount: Decimal,
    /// Asset-proxy encoded maker asset (hex).
    pub maker_asset_data: String,
}

impl LimitOrder {
    /// The token the maker gives, decoded from `maker_asset_data`.
    ///
    /// # Errors
    /// Returns `InvalidAssetData` unless the data is an ERC-20 proxy encoding.
    pub fn maker_token(&self) -> Result<Address> {
        decode_erc20_asset_data(&self.maker_asset_data)
    }
}

/// A trade routed through an AMM / aggregator with a guaranteed output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmTrade {
    pub destination_token: Address,
    /// Amount of `destination_token` guaranteed to be received.
    pub max_destination_quantity: Decimal,
    pub source_token_quantity: Decimal,
}

/// A liquidity order of any supported kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillOrder {
    LimitOrder(LimitOrder),
    AmmTrade(AmmTrade),
    /// Any order kind this SDK does not understand. Contributes nothing.
    #[serde(other)]
    Unsupported,
}

/// Encode a token address as ERC-20 asset-proxy data.
#[must_use]
pub fn encode_erc20_asset_data(token: Address) -> String {
    let mut bytes = Vec::with_capacity(36);
    bytes.extend_from_slice(&constants::ERC20_PROXY_ID);
    bytes.extend_from_slice(&[0u8; 12]);
    bytes.extend_from_slice(token.as_bytes());
    format!("0x{}", hex::encode(bytes))
}

/// Decode ERC-20 asset-proxy data into the token address it names.
///
/// # Errors
/// Returns `InvalidAssetData` on bad hex, wrong length or a non-ERC-20 proxy id.
pub fn decode_erc20_asset_data(data: &str) -> Result<Address> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    let bytes = hex::decode(digits).map_err(|e| BasketkitError::InvalidAssetData {
        reason: format!("{data}: {e}"),
    })?;
    if bytes.len() != 36 {
        return Err(BasketkitError::InvalidAssetData {
            reason: format!("expected 36 bytes, got {}", bytes.len()),
        });
    }
    if bytes[..4] != constants::ERC20_PROXY_ID {
        return Err(BasketkitError::InvalidAssetData {
            reason: format!("unsupported proxy id 0x{}", hex::encode(&bytes[..4])),
        });
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes[4..]);
    Address::from_word(&word).map_err(|e| BasketkitError::InvalidAssetData {
        reason: e.to_string(),
    })
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl FillOrder {
    pub fn dummy_limit(
        token: Address,
        maker_asset_amount: Decimal,
        taker_asset_amount: Decimal,
        fill_amount: Decimal,
    ) -> Self {
        Self::LimitOrder(LimitOrder {
            maker_asset_amount,
            taker_asset_amount,
            fill_amount,
            maker_asset_data: encode_erc20_asset_data(token),
        })
    }

    pub fn dummy_amm(token: Address, max_destination_quantity: Decimal) -> Self {
        Self::AmmTrade(AmmTrade {
            destination_token: token,
            max_destination_quantity,
            source_token_quantity: Decimal::ONE,
        })
    }
}
