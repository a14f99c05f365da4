//! Order-based issuance.
//!
//! The caller sends tokens that are traded through liquidity orders for
//! the components of a basket, which is then issued in one transaction.
//! Before submitting, the client confirms the orders actually supply enough
//! of every receive token and that the send tokens can be pulled.

use basketkit_checks::{
    aggregate_fills, assert_equal_length, assert_expiration_not_passed, assert_less_or_equal,
    assert_multiple_of, assert_not_empty, assert_positive, verify_liquidity_sufficiency,
};
use basketkit_guard::Requirement;
use basketkit_types::{
    Action, BasketkitError, ExchangeIssuanceParams, ExchangeIssuanceRequest, ProtocolConfig,
    Result, SubmittedAction, constants,
};
use futures::future::try_join;
use rust_decimal::Decimal;

use crate::context::Collaborators;

pub struct ExchangeIssuanceApi {
    ctx: Collaborators,
    config: ProtocolConfig,
}

impl ExchangeIssuanceApi {
    #[must_use]
    pub fn new(ctx: Collaborators, config: ProtocolConfig) -> Self {
        Self { ctx, config }
    }

    /// Issue a basket from send tokens routed through liquidity orders.
    ///
    /// # Errors
    /// `Configuration` without an issuance order module; any parameter,
    /// expiration, liquidity, basket or ledger check failure.
    pub async fn exchange_issue(
        &self,
        request: &ExchangeIssuanceRequest,
    ) -> Result<SubmittedAction> {
        let action = self.check_exchange_issue(request).await.inspect_err(|e| {
            tracing::warn!(
                set = %request.params.set,
                quantity = %request.params.quantity,
                orders = request.orders.len(),
                error = %e,
                "Exchange issuance rejected"
            );
        })?;
        self.ctx.submit(action).await
    }

    async fn check_exchange_issue(&self, request: &ExchangeIssuanceRequest) -> Result<Action> {
        let module = self.config.issuance_order_module.ok_or_else(|| {
            BasketkitError::Configuration("issuance order module is not configured".to_string())
        })?;
        let params = &request.params;

        // Local checks.
        validate_params(params)?;
        assert_not_empty(&request.orders, "liquidity orders")?;
        assert_less_or_equal(
            Decimal::from(request.orders.len()),
            Decimal::from(constants::MAX_FILL_ORDERS),
        )?;
        assert_expiration_not_passed(request.expiration, self.ctx.clock.now())?;

        let fills = aggregate_fills(&request.orders)?;
        verify_liquidity_sufficiency(
            &params.receive_tokens,
            &params.receive_token_amounts,
            &fills,
            params.quantity,
            params.quantity,
            &self.config.underlying_components,
        )?;

        // Remote checks.
        let (recognized, natural_unit) = try_join(
            self.ctx.state.is_recognized_basket(params.set),
            self.ctx.state.natural_unit(params.set),
        )
        .await?;
        if !recognized {
            return Err(BasketkitError::UnrecognizedBasket(params.set));
        }
        assert_multiple_of(params.quantity, natural_unit)?;

        let exclusions = if request.pay_with_native {
            self.config.native_exclusions()
        } else {
            Vec::new()
        };
        let requirements: Vec<Requirement> = params
            .send_tokens
            .iter()
            .zip(&params.send_token_amounts)
            .map(|(token, amount)| Requirement::new(*token, *amount))
            .collect();
        self.ctx
            .verifier()
            .verify_balances_and_allowances(
                &requirements,
                request.caller,
                self.config.transfer_proxy,
                &exclusions,
            )
            .await?;

        tracing::debug!(
            set = %params.set,
            components_filled = fills.len(),
            "Exchange issuance checks passed"
        );
        Ok(Action::ExchangeIssue {
            from: request.caller,
            module,
            params: params.clone(),
            orders: request.orders.clone(),
            pay_with_native: request.pay_with_native,
        })
    }
}

fn validate_params(params: &ExchangeIssuanceParams) -> Result<()> {
    assert_positive(params.quantity)?;

    assert_not_empty(&params.send_tokens, "send tokens")?;
    assert_equal_length(&params.send_tokens, &params.send_token_exchange_ids)?;
    assert_equal_length(&params.send_tokens, &params.send_token_amounts)?;
    for amount in &params.send_token_amounts {
        assert_positive(*amount)?;
    }

    assert_not_empty(&params.receive_tokens, "receive tokens")?;
    assert_equal_length(&params.receive_tokens, &params.receive_token_amounts)?;
    for amount in &params.receive_token_amounts {
        assert_positive(*amount)?;
    }
    Ok(())
}
