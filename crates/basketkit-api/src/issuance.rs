//! Direct issuance and redemption of baskets.

use basketkit_checks::{
    assert_equal_length, assert_multiple_of, assert_positive, calculate_partial_amount,
};
use basketkit_guard::Requirement;
use basketkit_types::{
    Action, Address, BasketkitError, IssuanceRequest, ProtocolConfig, RedemptionRequest, Result,
    SubmittedAction,
};
use rust_decimal::Decimal;

use crate::context::Collaborators;

/// Issue and redeem baskets against their components.
pub struct IssuanceApi {
    ctx: Collaborators,
    config: ProtocolConfig,
}

impl IssuanceApi {
    #[must_use]
    pub fn new(ctx: Collaborators, config: ProtocolConfig) -> Self {
        Self { ctx, config }
    }

    /// Component amounts needed to issue `quantity` of `set`:
    /// `unit * quantity / natural_unit` per component.
    ///
    /// # Errors
    /// `InvalidQuantity` for a non-positive quantity, `UnrecognizedBasket`,
    /// `NotAMultiple` if `quantity` is not a multiple of the natural unit.
    pub async fn required_components(
        &self,
        set: Address,
        quantity: Decimal,
    ) -> Result<Vec<Requirement>> {
        assert_positive(quantity)?;
        self.assert_recognized(set).await?;

        let state = &self.ctx.state;
        let (natural_unit, components, units) = futures::try_join!(
            state.natural_unit(set),
            state.components(set),
            state.units(set),
        )?;
        assert_multiple_of(quantity, natural_unit)?;
        assert_equal_length(&components, &units)?;

        components
            .into_iter()
            .zip(units)
            .map(|(token, unit)| {
                calculate_partial_amount(unit, quantity, natural_unit)
                    .map(|amount| Requirement::new(token, amount))
            })
            .collect()
    }

    /// Issue `quantity` of a basket from the caller's components.
    ///
    /// Every component must be held and approved to the transfer proxy.
    pub async fn issue(&self, request: &IssuanceRequest) -> Result<SubmittedAction> {
        let action = self.check_issue(request).await.inspect_err(|e| {
            tracing::warn!(
                set = %request.set,
                quantity = %request.quantity,
                error = %e,
                "Issue rejected"
            );
        })?;
        self.ctx.submit(action).await
    }

    async fn check_issue(&self, request: &IssuanceRequest) -> Result<Action> {
        let requirements = self
            .required_components(request.set, request.quantity)
            .await?;
        self.ctx
            .verifier()
            .verify_balances_and_allowances(
                &requirements,
                request.caller,
                self.config.transfer_proxy,
                &[],
            )
            .await?;
        Ok(Action::Issue {
            from: request.caller,
            set: request.set,
            quantity: request.quantity,
        })
    }

    /// Redeem `quantity` of a basket held by the caller.
    pub async fn redeem(&self, request: &RedemptionRequest) -> Result<SubmittedAction> {
        let action = self.check_redeem(request).await.inspect_err(|e| {
            tracing::warn!(
                set = %request.set,
                quantity = %request.quantity,
                error = %e,
                "Redeem rejected"
            );
        })?;
        self.ctx.submit(action).await
    }

    async fn check_redeem(&self, request: &RedemptionRequest) -> Result<Action> {
        assert_positive(request.quantity)?;
        self.assert_recognized(request.set).await?;

        let natural_unit = self.ctx.state.natural_unit(request.set).await?;
        assert_multiple_of(request.quantity, natural_unit)?;
        self.ctx
            .verifier()
            .verify_balance(request.set, request.caller, request.quantity)
            .await?;

        Ok(Action::Redeem {
            from: request.caller,
            set: request.set,
            quantity: request.quantity,
            withdraw: request.withdraw,
        })
    }

    async fn assert_recognized(&self, set: Address) -> Result<()> {
        if !self.ctx.state.is_recognized_basket(set).await? {
            return Err(BasketkitError::UnrecognizedBasket(set));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use basketkit_guard::mock::InMemoryChain;

    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    const SET: Address = Address([0x5E; 20]);
    const A: Address = Address([0x0A; 20]);
    const B: Address = Address([0x0B; 20]);
    const CALLER: Address = Address([0xCA; 20]);

    fn setup() -> (Arc<InMemoryChain>, IssuanceApi) {
        let chain = Arc::new(InMemoryChain::new());
        chain.add_set(SET, dec(10), vec![A, B], vec![dec(3), dec(7)]);
        let api = IssuanceApi::new(Collaborators::in_memory(&chain, 0), ProtocolConfig::dummy());
        (chain, api)
    }

    #[tokio::test]
    async fn required_components_scale_by_natural_unit() {
        let (_, api) = setup();
        let reqs = api.required_components(SET, dec(50)).await.unwrap();
        assert_eq!(
            reqs,
            vec![Requirement::new(A, dec(15)), Requirement::new(B, dec(35))]
        );
    }

    #[tokio::test]
    async fn quantity_must_be_multiple_of_natural_unit() {
        let (_, api) = setup();
        let err = api.required_components(SET, dec(15)).await.unwrap_err();
        assert!(matches!(err, BasketkitError::NotAMultiple { .. }));
    }

    #[tokio::test]
    async fn unknown_set_rejected() {
        let (_, api) = setup();
        let err = api
            .required_components(Address([0xFF; 20]), dec(10))
            .await
            .unwrap_err();
        assert!(matches!(err, BasketkitError::UnrecognizedBasket(_)));
    }

    #[tokio::test]
    async fn issue_checks_allowance_to_transfer_proxy() {
        let (chain, api) = setup();
        let proxy = ProtocolConfig::dummy().transfer_proxy;
        chain.fund(A, CALLER, proxy, dec(15));
        chain.set_balance(B, CALLER, dec(35));
        chain.set_allowance(B, CALLER, proxy, dec(34));

        let request = IssuanceRequest {
            set: SET,
            quantity: dec(50),
            caller: CALLER,
        };
        let err = api.issue(&request).await.unwrap_err();
        assert!(matches!(
            err,
            BasketkitError::InsufficientAllowance { token, spender, .. }
                if token == B && spender == proxy
        ));
        assert!(chain.submitted().is_empty());

        chain.set_allowance(B, CALLER, proxy, dec(35));
        let submitted = api.issue(&request).await.unwrap();
        assert_eq!(
            submitted.action,
            Action::Issue {
                from: CALLER,
                set: SET,
                quantity: dec(50),
            }
        );
        assert_eq!(chain.submitted().len(), 1);
    }

    #[tokio::test]
    async fn redeem_requires_set_balance() {
        let (chain, api) = setup();
        chain.set_balance(SET, CALLER, dec(20));
        let request = RedemptionRequest {
            set: SET,
            quantity: dec(30),
            caller: CALLER,
            withdraw: true,
        };
        let err = api.redeem(&request).await.unwrap_err();
        assert!(matches!(err, BasketkitError::InsufficientBalance { .. }));

        let ok = api
            .redeem(&RedemptionRequest {
                quantity: dec(20),
                ..request
            })
            .await
            .unwrap();
        assert!(matches!(ok.action, Action::Redeem { withdraw: true, .. }));
    }
}
