//! Single entry point bundling every API surface over one set of
//! collaborators and one protocol deployment.

use basketkit_types::{ProtocolConfig, Result, constants};

use crate::context::Collaborators;
use crate::exchange_issuance::ExchangeIssuanceApi;
use crate::factory::FactoryApi;
use crate::issuance::IssuanceApi;
use crate::rebalancing::RebalancingApi;

pub struct BasketkitClient {
    pub rebalancing: RebalancingApi,
    pub issuance: IssuanceApi,
    pub exchange_issuance: ExchangeIssuanceApi,
    pub factory: FactoryApi,
}

impl BasketkitClient {
    /// # Errors
    /// `Configuration` if `config` fails validation.
    pub fn new(ctx: Collaborators, config: ProtocolConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            sdk = constants::SDK_NAME,
            version = constants::VERSION,
            core = %config.core,
            "Client initialized"
        );
        Ok(Self {
            rebalancing: RebalancingApi::new(ctx.clone(), config.clone()),
            issuance: IssuanceApi::new(ctx.clone(), config.clone()),
            exchange_issuance: ExchangeIssuanceApi::new(ctx.clone(), config),
            factory: FactoryApi::new(ctx),
        })
    }
}
