//! Protocol deployment configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Address, BasketkitError, Result};

/// Addresses of one protocol deployment plus the SDK's per-deployment knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Protocol core (issuance, redemption, factory registry).
    pub core: Address,
    /// Spender that pulls components for issuance and bid inflows.
    pub transfer_proxy: Address,
    /// Wrapped native currency; skipped by balance checks when the caller
    /// pays with native currency.
    #[serde(default)]
    pub wrapped_native: Option<Address>,
    /// Components that wrap an underlying asset (wrapped → underlying).
    /// Liquidity for these is checked against the underlying asset.
    #[serde(default)]
    pub underlying_components: BTreeMap<Address, Address>,
    /// Module that executes order-based issuance.
    #[serde(default)]
    pub issuance_order_module: Option<Address>,
}

impl ProtocolConfig {
    /// Parse a JSON configuration and validate it.
    ///
    /// # Errors
    /// Returns `Serialization` on malformed JSON and `Configuration` if validation fails.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns `Configuration` when a required address is zero or a
    /// component is mapped onto itself.
    pub fn validate(&self) -> Result<()> {
        if self.core.is_zero() {
            return Err(BasketkitError::Configuration(
                "core address must not be zero".to_string(),
            ));
        }
        if self.transfer_proxy.is_zero() {
            return Err(BasketkitError::Configuration(
                "transfer_proxy address must not be zero".to_string(),
            ));
        }
        if let Some((wrapped, _)) = self
            .underlying_components
            .iter()
            .find(|(wrapped, underlying)| wrapped == underlying)
        {
            return Err(BasketkitError::Configuration(format!(
                "component {wrapped} is mapped onto itself"
            )));
        }
        Ok(())
    }

    /// Tokens skipped by balance checks when paying with native currency.
    #[must_use]
    pub fn native_exclusions(&self) -> Vec<Address> {
        self.wrapped_native.into_iter().collect()
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl ProtocolConfig {
    pub fn dummy() -> Self {
        Self {
            core: Address([0xC0; 20]),
            transfer_proxy: Address([0x7A; 20]),
            wrapped_native: None,
            underlying_components: BTreeMap::new(),
            issuance_order_module: Some(Address([0x1E; 20])),
        }
    }
}
