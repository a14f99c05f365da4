//! Error types for the basketkit SDK.
//!
//! All errors use the `BK_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Quantity / invariant errors
//! - 2xx: Ledger (balance / allowance) errors
//! - 3xx: Liquidity errors
//! - 4xx: Rebalance state machine errors
//! - 7xx: Collaborator (read / submit) errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Address, RebalanceState, Timestamp, format_timestamp};

/// Central error enum for all basketkit operations.
#[derive(Debug, Error)]
pub enum BasketkitError {
    // =================================================================
    // Quantity Errors (1xx)
    // =================================================================
    /// A quantity is non-positive where positivity is required.
    #[error("BK_ERR_100: Invalid quantity {quantity}: {reason}")]
    InvalidQuantity { quantity: Decimal, reason: String },

    /// Two related sequences differ in length.
    #[error("BK_ERR_101: Length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    /// A quantity is not an integer multiple of the required base unit.
    #[error("BK_ERR_102: {quantity} is not a multiple of {base}")]
    NotAMultiple { quantity: Decimal, base: Decimal },

    /// A one-sided bound comparison failed.
    #[error("BK_ERR_103: {value} is out of range: must be {bound}")]
    OutOfRange { value: Decimal, bound: String },

    /// Proportions do not sum to exactly one.
    #[error("BK_ERR_104: Proportions must sum to exactly 1, got {sum}")]
    ProportionsInvalid { sum: Decimal },

    /// A sequence that must contain items is empty.
    #[error("BK_ERR_105: {what} must not be empty")]
    EmptyInput { what: String },

    /// An expiration timestamp has passed.
    #[error(
        "BK_ERR_106: Expired at {} (now {})",
        format_timestamp(.expiration),
        format_timestamp(.now)
    )]
    Expired { expiration: Timestamp, now: Timestamp },

    /// Decimal arithmetic overflowed.
    #[error("BK_ERR_107: Arithmetic overflow: {context}")]
    ArithmeticOverflow { context: String },

    // =================================================================
    // Ledger Errors (2xx)
    // =================================================================
    /// The owner's token balance is below the required amount.
    #[error("BK_ERR_200: Insufficient balance of {token} for {owner}: need {need}, have {have}")]
    InsufficientBalance {
        token: Address,
        owner: Address,
        have: Decimal,
        need: Decimal,
    },

    /// The owner has not approved enough for the spender.
    #[error(
        "BK_ERR_201: Insufficient allowance of {token} from {owner} to {spender}: \
         need {need}, have {have}"
    )]
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
        have: Decimal,
        need: Decimal,
    },

    // =================================================================
    // Liquidity Errors (3xx)
    // =================================================================
    /// No liquidity at all was supplied for a required (underlying) token.
    #[error("BK_ERR_300: No liquidity supplied for {token}")]
    InsufficientLiquidity { token: Address },

    /// Aggregated fills do not cover a required component amount.
    #[error("BK_ERR_301: Insufficient liquidity for {token}: need {need}, orders supply {have}")]
    InsufficientComponentAmount {
        token: Address,
        have: Decimal,
        need: Decimal,
    },

    /// Maker asset data could not be decoded into a token address.
    #[error("BK_ERR_302: Invalid asset data: {reason}")]
    InvalidAssetData { reason: String },

    // =================================================================
    // Rebalance Errors (4xx)
    // =================================================================
    /// The rebalancing token is in the wrong phase for the action.
    #[error("BK_ERR_400: Cannot {action} while rebalance state is {actual}")]
    IncorrectState {
        action: &'static str,
        actual: RebalanceState,
    },

    /// The caller is not the manager of the rebalancing token.
    #[error("BK_ERR_401: {caller} is not authorized to {action}; manager is {manager}")]
    NotAuthorized {
        action: &'static str,
        caller: Address,
        manager: Address,
    },

    /// A required cooldown or waiting period has not elapsed yet.
    #[error("BK_ERR_402: {what} has not elapsed; next available at {}", format_timestamp(.available_at))]
    TimingNotElapsed {
        what: &'static str,
        available_at: Timestamp,
        now: Timestamp,
    },

    /// The proposed basket is not registered with the protocol core.
    #[error("BK_ERR_403: {0} is not a recognized basket")]
    UnrecognizedBasket(Address),

    /// The proposed auction price library is not whitelisted by the core.
    #[error("BK_ERR_404: {0} is not a recognized price library")]
    UnrecognizedPriceLibrary(Address),

    /// Next and current natural units are not multiples of each other.
    #[error("BK_ERR_405: Natural units {next} and {current} must be multiples of each other")]
    InvalidNaturalUnit { current: Decimal, next: Decimal },

    // =================================================================
    // Collaborator Errors (7xx)
    // =================================================================
    /// A remote read failed.
    #[error("BK_ERR_700: Collaborator error: {reason}")]
    Collaborator { reason: String },

    /// The submitter refused the action.
    #[error("BK_ERR_701: Submission rejected: {reason}")]
    SubmissionRejected { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Malformed address text or word.
    #[error("BK_ERR_900: Invalid address: {0}")]
    InvalidAddress(String),

    /// Serialization / deserialization error.
    #[error("BK_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("BK_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// Unrecoverable internal error.
    #[error("BK_ERR_903: Internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, BasketkitError>;

impl From<serde_json::Error> for BasketkitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_balance_display() {
        let err = BasketkitError::InsufficientBalance {
            token: Address([1; 20]),
            owner: Address([2; 20]),
            have: Decimal::new(50, 0),
            need: Decimal::new(100, 0),
        };
        let msg = format!("{err}");
        assert!(msg.starts_with("BK_ERR_200"), "Got: {msg}");
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
        assert!(msg.contains("0x0101"));
    }

    #[test]
    fn incorrect_state_display() {
        let err = BasketkitError::IncorrectState {
            action: "bid",
            actual: RebalanceState::Proposal,
        };
        let msg = format!("{err}");
        assert!(msg.contains("BK_ERR_400"));
        assert!(msg.contains("bid"));
        assert!(msg.contains("PROPOSAL"));
    }

    #[test]
    fn timing_message_names_next_available_time() {
        let err = BasketkitError::TimingNotElapsed {
            what: "rebalance interval",
            available_at: 86_400,
            now: 0,
        };
        let msg = format!("{err}");
        assert!(msg.contains("next available at 1970-01-02"), "Got: {msg}");
    }

    #[test]
    fn all_errors_have_bk_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(BasketkitError::ProportionsInvalid {
                sum: Decimal::new(99, 2),
            }),
            Box::new(BasketkitError::EmptyInput {
                what: "components".into(),
            }),
            Box::new(BasketkitError::Expired {
                expiration: 1,
                now: 2,
            }),
            Box::new(BasketkitError::UnrecognizedBasket(Address::ZERO)),
            Box::new(BasketkitError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("BK_ERR_"),
                "Error missing BK_ERR_ prefix: {msg}"
            );
        }
    }
}
