//! Token flow and fill accounting types.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, BasketkitError, Result};

/// Result of pricing a bid: index-aligned `tokens`, `inflow` and `outflow`.
///
/// `inflow` is what the bidder must provide, `outflow` what the bidder
/// receives. Built only through [`TokenFlows::new`] so the three sequences
/// always have the same length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTokenFlows")]
pub struct TokenFlows {
    tokens: Vec<Address>,
    inflow: Vec<Decimal>,
    outflow: Vec<Decimal>,
}

#[derive(Deserialize)]
struct RawTokenFlows {
    tokens: Vec<Address>,
    inflow: Vec<Decimal>,
    outflow: Vec<Decimal>,
}

impl TryFrom<RawTokenFlows> for TokenFlows {
    type Error = BasketkitError;

    fn try_from(raw: RawTokenFlows) -> Result<Self> {
        Self::new(raw.tokens, raw.inflow, raw.outflow)
    }
}

impl TokenFlows {
    /// # Errors
    /// Returns `LengthMismatch` if the sequences differ in length.
    pub fn new(tokens: Vec<Address>, inflow: Vec<Decimal>, outflow: Vec<Decimal>) -> Result<Self> {
        if tokens.len() != inflow.len() {
            return Err(BasketkitError::LengthMismatch {
                left: tokens.len(),
                right: inflow.len(),
            });
        }
        if tokens.len() != outflow.len() {
            return Err(BasketkitError::LengthMismatch {
                left: tokens.len(),
                right: outflow.len(),
            });
        }
        Ok(Self {
            tokens,
            inflow,
            outflow,
        })
    }

    #[must_use]
    pub fn tokens(&self) -> &[Address] {
        &self.tokens
    }

    #[must_use]
    pub fn inflow(&self) -> &[Decimal] {
        &self.inflow
    }

    #[must_use]
    pub fn outflow(&self) -> &[Decimal] {
        &self.outflow
    }

    /// Tokens with a non-zero inflow, paired with the amount.
    pub fn required_inflows(&self) -> impl Iterator<Item = (Address, Decimal)> + '_ {
        self.tokens
            .iter()
            .copied()
            .zip(self.inflow.iter().copied())
            .filter(|(_, amount)| !amount.is_zero())
    }
}

// ---------------------------------------------------------------------------
// ComponentFillMap
// ---------------------------------------------------------------------------

/// Accumulated fillable quantity per token.
///
/// Keys are [`Address`]es, so differently-cased spellings of the same token
/// collapse into one entry. An absent key means zero liquidity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentFillMap(BTreeMap<Address, Decimal>);

impl ComponentFillMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity available for `token` (zero if absent).
    #[must_use]
    pub fn get(&self, token: &Address) -> Decimal {
        self.0.get(token).copied().unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn contains(&self, token: &Address) -> bool {
        self.0.contains_key(token)
    }

    /// Add `amount` to the running total for `token`.
    ///
    /// # Errors
    /// Returns `ArithmeticOverflow` if the total no longer fits.
    pub fn accumulate(&mut self, token: Address, amount: Decimal) -> Result<()> {
        let entry = self.0.entry(token).or_insert(Decimal::ZERO);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| BasketkitError::ArithmeticOverflow {
                context: format!("fill total for {token}"),
            })?;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Decimal)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address([b; 20])
    }

    #[test]
    fn token_flows_reject_mismatched_lengths() {
        let err = TokenFlows::new(vec![addr(1)], vec![], vec![Decimal::ONE]).unwrap_err();
        assert!(matches!(
            err,
            BasketkitError::LengthMismatch { left: 1, right: 0 }
        ));
        let err =
            TokenFlows::new(vec![addr(1)], vec![Decimal::ONE], vec![]).unwrap_err();
        assert!(matches!(err, BasketkitError::LengthMismatch { .. }));
    }

    #[test]
    fn token_flows_deserialize_validates() {
        let json = r#"{"tokens":["0x0101010101010101010101010101010101010101"],
                       "inflow":["1","2"],"outflow":["0"]}"#;
        assert!(serde_json::from_str::<TokenFlows>(json).is_err());
    }

    #[test]
    fn required_inflows_skip_zero() {
        let flows = TokenFlows::new(
            vec![addr(1), addr(2)],
            vec![Decimal::ZERO, Decimal::new(3, 0)],
            vec![Decimal::new(5, 0), Decimal::ZERO],
        )
        .unwrap();
        let required: Vec<_> = flows.required_inflows().collect();
        assert_eq!(required, vec![(addr(2), Decimal::new(3, 0))]);
    }

    #[test]
    fn fill_map_accumulates_per_token() {
        let mut map = ComponentFillMap::new();
        map.accumulate(addr(1), Decimal::new(50, 0)).unwrap();
        map.accumulate(addr(1), Decimal::new(40, 0)).unwrap();
        map.accumulate(addr(2), Decimal::ONE).unwrap();
        assert_eq!(map.get(&addr(1)), Decimal::new(90, 0));
        assert_eq!(map.get(&addr(3)), Decimal::ZERO);
        assert!(!map.contains(&addr(3)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn fill_map_overflow_is_an_error() {
        let mut map = ComponentFillMap::new();
        map.accumulate(addr(1), Decimal::MAX).unwrap();
        let err = map.accumulate(addr(1), Decimal::MAX).unwrap_err();
        assert!(matches!(err, BasketkitError::ArithmeticOverflow { .. }));
    }
}
