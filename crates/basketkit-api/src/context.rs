//! Collaborator bundle shared by every API surface, and the single
//! submission path.

use std::sync::Arc;

use basketkit_guard::{Clock, LedgerReader, LedgerVerifier, StateReader, TransactionSubmitter};
use basketkit_types::{Action, ActionId, Result, SubmittedAction};

/// Handles to the outside world.
#[derive(Clone)]
pub struct Collaborators {
    pub state: Arc<dyn StateReader>,
    pub ledger: Arc<dyn LedgerReader>,
    pub submitter: Arc<dyn TransactionSubmitter>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    #[must_use]
    pub fn new(
        state: Arc<dyn StateReader>,
        ledger: Arc<dyn LedgerReader>,
        submitter: Arc<dyn TransactionSubmitter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state,
            ledger,
            submitter,
            clock,
        }
    }

    pub(crate) fn verifier(&self) -> LedgerVerifier {
        LedgerVerifier::new(Arc::clone(&self.ledger))
    }

    /// Hand a fully validated action to the submitter. Called exactly once
    /// per successful request.
    pub(crate) async fn submit(&self, action: Action) -> Result<SubmittedAction> {
        let action_id = ActionId::new();
        let tx = self.submitter.submit(&action).await.inspect_err(|e| {
            tracing::warn!(
                action_id = %action_id,
                action = %action,
                error = %e,
                "Submission failed"
            );
        })?;
        tracing::info!(action_id = %action_id, action = %action, tx = %tx, "Action submitted");
        Ok(SubmittedAction {
            action_id,
            action,
            tx,
        })
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Collaborators {
    /// Every collaborator backed by one in-memory chain, frozen at `now`.
    pub fn in_memory(
        chain: &Arc<basketkit_guard::mock::InMemoryChain>,
        now: basketkit_types::Timestamp,
    ) -> Self {
        Self::new(
            chain.clone(),
            chain.clone(),
            chain.clone(),
            Arc::new(basketkit_guard::FixedClock(now)),
        )
    }
}
