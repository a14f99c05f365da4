//! # basketkit-guard
//!
//! **Precondition Plane**: rebalance lifecycle guards, balance/allowance
//! verification, and the collaborator seams the SDK reads the chain through.
//!
//! ## Architecture
//!
//! The guard plane sits between the orchestration API and the chain:
//! 1. **Collaborators**: `StateReader`, `LedgerReader`, `TransactionSubmitter`
//! 2. **Clock**: injected source of "now" for every timing guard
//! 3. **LedgerVerifier**: confirms balances and allowances before submission
//! 4. **Rebalance guard**: pure predicates over a state snapshot and `now`
//!
//! ## Action Flow
//!
//! ```text
//! API → StateReader (snapshot) → rebalance_guard::assert_can_*()
//!     → LedgerVerifier → TransactionSubmitter.submit()
//! ```
//!
//! Nothing reaches the submitter unless every guard passed.

pub mod clock;
pub mod collaborators;
pub mod ledger_verifier;
pub mod rebalance_guard;

#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;

pub use clock::{Clock, FixedClock, SystemClock};
pub use collaborators::{LedgerReader, StateReader, TransactionSubmitter};
pub use ledger_verifier::{LedgerVerifier, Requirement};
pub use rebalance_guard::ProposalSnapshot;
