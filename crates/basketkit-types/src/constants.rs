//! System-wide constants for the basketkit SDK.

/// Four-byte proxy id prefixing ERC-20 asset data (`bytes4(keccak256("ERC20Token(address)"))`).
pub const ERC20_PROXY_ID: [u8; 4] = [0xf4, 0x72, 0x61, 0xb0];

/// Maximum number of components a basket may hold.
pub const MAX_COMPONENTS: usize = 64;

/// Maximum number of liquidity orders accepted for one exchange issuance.
pub const MAX_FILL_ORDERS: usize = 256;

/// Auction pivot price may be at most this multiple of the start price.
pub const MAX_PIVOT_PRICE_MULTIPLIER: u64 = 5;

/// Auction pivot price may be no less than the start price divided by this.
pub const MIN_PIVOT_PRICE_DIVISOR: u64 = 2;

/// Default proposal period for newly configured rebalancing tokens (1 day).
pub const DEFAULT_PROPOSAL_PERIOD_SECS: u64 = 86_400;

/// Default rebalance interval for newly configured rebalancing tokens (1 day).
pub const DEFAULT_REBALANCE_INTERVAL_SECS: u64 = 86_400;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// SDK name.
pub const SDK_NAME: &str = "basketkit";
