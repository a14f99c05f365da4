//! # basketkit-types
//!
//! Shared types, errors, and configuration for the **basketkit** SDK.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`ActionId`], [`TransactionHandle`]
//! - **Rebalance model**: [`RebalanceState`], [`RebalancingToken`], [`BiddingParameters`],
//!   [`AuctionPriceParameters`], [`ProposalTiming`]
//! - **Liquidity model**: [`FillOrder`], [`LimitOrder`], [`AmmTrade`], [`ComponentFillMap`]
//! - **Flows**: [`TokenFlows`]
//! - **Requests and actions**: [`BidRequest`], [`ProposalRequest`], [`IssuanceRequest`],
//!   [`RedemptionRequest`], [`ExchangeIssuanceRequest`], [`CreateSetRequest`], [`Action`]
//! - **Configuration**: [`ProtocolConfig`]
//! - **Errors**: [`BasketkitError`] with `BK_ERR_` prefix codes
//! - **Constants**: protocol limits and encodings

pub mod action;
pub mod address;
pub mod config;
pub mod constants;
pub mod error;
pub mod fill_order;
pub mod flows;
pub mod rebalance;

// Re-export all primary types at crate root for ergonomic imports:
//   use basketkit_types::{Address, FillOrder, RebalanceState, ...};

pub use action::*;
pub use address::*;
pub use config::*;
pub use error::*;
pub use fill_order::*;
pub use flows::*;
pub use rebalance::*;

// Constants are accessed via `basketkit_types::constants::FOO`
// (not re-exported to avoid name collisions).
