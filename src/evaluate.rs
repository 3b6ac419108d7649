//! Fixture Evaluation
//!
//! Runs every rule of a fixture set against a fresh copy of its cart, one
//! evaluation cycle per rule, and gathers the decisions into a report.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::{
    config::StoreId,
    cycle::EvaluationCycle,
    engine::{DecisionEngine, EvaluationContext},
    fixtures::{Fixture, FixtureError},
    items::CartLineItem,
    messages::{MessageComposer, MoneyFormatter},
    report::{DecisionReport, DecisionRow},
    rules::{Rule, SimpleAction},
};

/// Discount a rule gives a row, as a simple host would compute it.
///
/// Percent and per-unit fixed actions work on the row's final price; cart
/// fixed amounts are taken from each row up to its total. Other actions, and
/// rows too large to total, give nothing here.
pub fn rule_discount(item: &CartLineItem, rule: &Rule) -> Decimal {
    let Some(row_total) = item.pricing_subject().final_price.checked_mul(item.qty()) else {
        return Decimal::ZERO;
    };

    let remaining = row_total
        .checked_sub(item.discount_amount())
        .map_or(Decimal::ZERO, |remaining| remaining.max(Decimal::ZERO));

    let discount = match rule.simple_action {
        SimpleAction::ByPercent => row_total
            .checked_mul(rule.discount_amount)
            .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED)),
        SimpleAction::ByFixed => rule.discount_amount.checked_mul(item.qty()),
        SimpleAction::CartFixed => Some(rule.discount_amount),
        SimpleAction::BuyXGetY | SimpleAction::Custom(_) => None,
    };

    discount
        .unwrap_or(Decimal::ZERO)
        .min(remaining)
        .max(Decimal::ZERO)
        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Apply `rule` to `item` by adding its [`rule_discount`] to the row.
pub fn apply_rule_discount(item: &mut CartLineItem, rule: &Rule) {
    let discount = rule_discount(item, rule);

    if let Some(total) = item.discount_amount().checked_add(discount) {
        item.set_discount_amount(total);
    }
}

/// Evaluate every rule in `fixture` against its cart.
///
/// # Errors
///
/// Returns an error if the fixture has no cart items or no currency.
pub fn evaluate_fixture(
    fixture: &Fixture,
    engine: &DecisionEngine,
    store: Option<StoreId>,
) -> Result<DecisionReport, FixtureError> {
    let currency = fixture.currency()?;
    let composer = MessageComposer::new(MoneyFormatter::new(currency));

    let mut report = DecisionReport::new();

    for coupon_rule in fixture.rules() {
        let rule = &coupon_rule.rule;
        let ctx = EvaluationContext {
            store,
            coupon_code: coupon_rule.coupon_code.clone(),
        };

        let mut cart = fixture.cart()?;
        let mut cycle = EvaluationCycle::new(engine, &composer);

        for item in &mut cart {
            let outcome = cycle.process(item, rule, &ctx, |item| apply_rule_discount(item, rule));

            debug!(
                product_sku = %item.product().sku,
                rule_id = %rule.id,
                ?outcome,
                "evaluated item"
            );

            report.push(DecisionRow {
                item: item.product().name.clone(),
                rule: rule.name.clone(),
                coupon_code: ctx.coupon_code.clone(),
                regular_price: item.pricing_subject().regular_price,
                final_price: item.pricing_subject().final_price,
                discount: item.discount_amount(),
                outcome,
            });
        }

        let applied: Decimal = cart.iter().map(CartLineItem::discount_amount).sum();
        let summary = cycle.finish(ctx.tracked_coupon(), applied);

        report.push_summary(
            ctx.tracked_coupon().unwrap_or(rule.name.as_str()),
            summary,
        );
    }

    Ok(report)
}
