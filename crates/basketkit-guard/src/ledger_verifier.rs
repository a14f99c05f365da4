//! Balance and allowance verification.
//!
//! Confirms an owner holds enough of a token and has approved enough of it
//! to a spender *before* a transaction is submitted that would otherwise
//! revert on-chain. Read-only: nothing is reserved or mutated.

use std::sync::Arc;

use basketkit_types::{Address, BasketkitError, Result};
use futures::future::{try_join, try_join_all};
use rust_decimal::Decimal;

use crate::collaborators::LedgerReader;

/// A token amount the owner must be able to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub token: Address,
    pub amount: Decimal,
}

impl Requirement {
    #[must_use]
    pub fn new(token: Address, amount: Decimal) -> Self {
        Self { token, amount }
    }
}

/// Checks balances and allowances against a [`LedgerReader`].
pub struct LedgerVerifier {
    ledger: Arc<dyn LedgerReader>,
}

impl LedgerVerifier {
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerReader>) -> Self {
        Self { ledger }
    }

    /// # Errors
    /// `InsufficientBalance` if `owner` holds less than `required` of `token`.
    pub async fn verify_balance(
        &self,
        token: Address,
        owner: Address,
        required: Decimal,
    ) -> Result<()> {
        let have = self.ledger.balance_of(token, owner).await?;
        check_balance(token, owner, have, required)
    }

    /// # Errors
    /// `InsufficientAllowance` if `owner` approved less than `required` to `spender`.
    pub async fn verify_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        required: Decimal,
    ) -> Result<()> {
        let have = self.ledger.allowance(token, owner, spender).await?;
        check_allowance(token, owner, spender, have, required)
    }

    /// Verify balance and allowance for every requirement not in `exclusions`.
    ///
    /// Requirements naming the same token are summed first. All reads are
    /// issued concurrently and joined; the checks then run in first-seen
    /// order (balance before allowance per token), so the reported failure
    /// is the same regardless of which read finished first.
    ///
    /// # Errors
    /// The first `InsufficientBalance` / `InsufficientAllowance`, or the
    /// first failed read.
    pub async fn verify_balances_and_allowances(
        &self,
        requirements: &[Requirement],
        owner: Address,
        spender: Address,
        exclusions: &[Address],
    ) -> Result<()> {
        let checked = merge_by_token(requirements, exclusions)?;

        let reads = checked.iter().map(|req| {
            try_join(
                self.ledger.balance_of(req.token, owner),
                self.ledger.allowance(req.token, owner, spender),
            )
        });
        let snapshots = try_join_all(reads).await?;

        for (req, (balance, allowance)) in checked.iter().zip(snapshots) {
            check_balance(req.token, owner, balance, req.amount)?;
            check_allowance(req.token, owner, spender, allowance, req.amount)?;
        }

        tracing::debug!(
            owner = %owner,
            spender = %spender,
            tokens = checked.len(),
            requirements = requirements.len(),
            "Balances and allowances sufficient"
        );
        Ok(())
    }
}

/// Sum requirements per token in first-seen order, dropping `exclusions`.
fn merge_by_token(
    requirements: &[Requirement],
    exclusions: &[Address],
) -> Result<Vec<Requirement>> {
    let mut merged: Vec<Requirement> = Vec::with_capacity(requirements.len());
    for req in requirements.iter().filter(|req| !exclusions.contains(&req.token)) {
        match merged.iter_mut().find(|m| m.token == req.token) {
            Some(existing) => {
                existing.amount = existing.amount.checked_add(req.amount).ok_or_else(|| {
                    BasketkitError::ArithmeticOverflow {
                        context: format!("combined requirement for {}", req.token),
                    }
                })?;
            }
            None => merged.push(*req),
        }
    }
    Ok(merged)
}

fn check_balance(token: Address, owner: Address, have: Decimal, need: Decimal) -> Result<()> {
    if have < need {
        return Err(BasketkitError::InsufficientBalance {
            token,
            owner,
            have,
            need,
        });
    }
    Ok(())
}

fn check_allowance(
    token: Address,
    owner: Address,
    spender: Address,
    have: Decimal,
    need: Decimal,
) -> Result<()> {
    if have < need {
        return Err(BasketkitError::InsufficientAllowance {
            token,
            owner,
            spender,
            have,
            need,
        });
    }
    Ok(())
}
