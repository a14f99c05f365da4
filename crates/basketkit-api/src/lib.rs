//! # basketkit-api
//!
//! **Orchestration Plane**: the public surface hosts call to propose,
//! auction, bid, issue, redeem and create baskets.
//!
//! ## Architecture
//!
//! Each API method takes a request and:
//! 1. Runs cheap local invariant checks (`basketkit-checks`)
//! 2. Reads the on-chain snapshot concurrently (`StateReader`)
//! 3. Applies the state machine guard (`basketkit-guard`)
//! 4. Verifies balances, allowances and liquidity
//! 5. Submits exactly one [`Action`](basketkit_types::Action)
//!
//! ## Surfaces
//!
//! - **RebalancingApi**: propose, start, bid, settle, end failed auction, manager
//! - **IssuanceApi**: issue, redeem, required components
//! - **ExchangeIssuanceApi**: order-based issuance
//! - **FactoryApi**: set creation, units from proportions
//!
//! Nothing is submitted unless every check passed.

pub mod client;
pub mod context;
pub mod exchange_issuance;
pub mod factory;
pub mod issuance;
pub mod rebalancing;

pub use client::BasketkitClient;
pub use context::Collaborators;
pub use exchange_issuance::ExchangeIssuanceApi;
pub use factory::{FactoryApi, units_from_proportions};
pub use issuance::IssuanceApi;
pub use rebalancing::RebalancingApi;
