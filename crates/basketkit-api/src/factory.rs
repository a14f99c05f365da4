//! Basket creation through the protocol factory.

use std::collections::BTreeSet;

use basketkit_checks::{
    assert_equal_length, assert_less_or_equal, assert_not_empty, assert_positive,
    assert_proportions_sum_to_one,
};
use basketkit_types::{
    Action, BasketkitError, CreateSetRequest, Result, SubmittedAction, constants,
};
use rust_decimal::Decimal;

use crate::context::Collaborators;

/// Integer component units for a basket of `natural_unit` holding the
/// given `proportions` (which must sum to exactly one).
///
/// `unit[i] = trunc(proportion[i] * natural_unit)`; every unit must come
/// out positive.
///
/// # Errors
/// `EmptyInput`, `ProportionsInvalid`, `InvalidQuantity` for a
/// non-positive natural unit or proportion, or a proportion too small to
/// yield a whole unit.
pub fn units_from_proportions(
    proportions: &[Decimal],
    natural_unit: Decimal,
) -> Result<Vec<Decimal>> {
    assert_not_empty(proportions, "proportions")?;
    assert_positive(natural_unit)?;
    for proportion in proportions {
        assert_positive(*proportion)?;
    }
    assert_proportions_sum_to_one(proportions)?;

    proportions
        .iter()
        .map(|proportion| {
            let unit = proportion
                .checked_mul(natural_unit)
                .ok_or_else(|| BasketkitError::ArithmeticOverflow {
                    context: "component unit".to_string(),
                })?
                .trunc();
            if unit.is_zero() {
                return Err(BasketkitError::InvalidQuantity {
                    quantity: *proportion,
                    reason: format!(
                        "proportion yields no whole unit at natural unit {natural_unit}"
                    ),
                });
            }
            Ok(unit)
        })
        .collect()
}

/// Creates new baskets.
pub struct FactoryApi {
    ctx: Collaborators,
}

impl FactoryApi {
    #[must_use]
    pub fn new(ctx: Collaborators) -> Self {
        Self { ctx }
    }

    pub async fn create_set(&self, request: &CreateSetRequest) -> Result<SubmittedAction> {
        let action = check_create_set(request).inspect_err(|e| {
            tracing::warn!(symbol = %request.symbol, error = %e, "Set creation rejected");
        })?;
        self.ctx.submit(action).await
    }
}

fn check_create_set(request: &CreateSetRequest) -> Result<Action> {
    assert_not_empty(&request.components, "components")?;
    assert_equal_length(&request.components, &request.units)?;
    assert_less_or_equal(
        Decimal::from(request.components.len()),
        Decimal::from(constants::MAX_COMPONENTS),
    )?;
    assert_positive(request.natural_unit)?;
    for unit in &request.units {
        assert_positive(*unit)?;
    }

    let mut seen = BTreeSet::new();
    for component in &request.components {
        if component.is_zero() {
            return Err(BasketkitError::InvalidAddress(
                "component must not be the zero address".to_string(),
            ));
        }
        if !seen.insert(component) {
            return Err(BasketkitError::InvalidAddress(format!(
                "duplicate component {component}"
            )));
        }
    }

    if request.name.trim().is_empty() {
        return Err(BasketkitError::EmptyInput {
            what: "name".to_string(),
        });
    }
    if request.symbol.trim().is_empty() {
        return Err(BasketkitError::EmptyInput {
            what: "symbol".to_string(),
        });
    }

    Ok(Action::CreateSet {
        from: request.caller,
        components: request.components.clone(),
        units: request.units.clone(),
        natural_unit: request.natural_unit,
        name: request.name.clone(),
        symbol: request.symbol.clone(),
    })
}
