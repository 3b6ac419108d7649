//! Max-Discount Bypass
//!
//! Reconciles the discount an item already carries against the discount a
//! bypass-enabled rule would give it. The shopper gets the larger of the two,
//! measured from the regular price, never both.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    products::Product,
    rules::{Rule, SimpleAction},
};

/// Tolerance used for all monetary comparisons.
pub const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

const MONEY_DP: u32 = 4;
const PERCENT_DP: u32 = 2;

/// Outcome of a max-discount calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BypassKind {
    /// The rule discount exceeds the existing one; only the difference applies.
    Adjusted,

    /// The existing discount is at least as large; the rule is blocked.
    ExistingBetter,

    /// No per-unit cap is definable for the action; the rule stacks in full.
    StackingFallback,
}

impl BypassKind {
    /// Stable snake case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Adjusted => "adjusted",
            Self::ExistingBetter => "existing_better",
            Self::StackingFallback => "stacking_fallback",
        }
    }
}

impl fmt::Display for BypassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`calculate`]. Monetary fields are per unit unless noted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BypassResult {
    /// Outcome
    pub kind: BypassKind,

    /// Additional discount per unit (zero unless adjusted)
    pub additional_discount: Decimal,

    /// Additional discount for the whole row (`additional_discount` × qty)
    pub max_allowed_total: Decimal,

    /// Regular price
    pub regular_price: Decimal,

    /// Current (final) price
    pub current_price: Decimal,

    /// Discount already taken off the regular price
    pub existing_discount_amount: Decimal,

    /// Rule discount measured from the regular price
    pub rule_discount_from_regular: Decimal,

    /// Existing discount as a percentage of the regular price
    pub existing_discount_percent: Decimal,

    /// Rule discount as a percentage of the regular price
    pub rule_discount_percent: Decimal,

    /// Quantity
    pub qty: Decimal,
}

impl BypassResult {
    /// Whether the rule may still apply (in full or capped).
    pub fn allows_rule(&self) -> bool {
        !matches!(self.kind, BypassKind::ExistingBetter)
    }
}

/// Compute how much additional discount `rule` may still give `product`.
///
/// Actions without a per-unit amount (`cart_fixed`, `buy_x_get_y`) fall back
/// to stacking. A regular price below [`EPSILON`], or figures too large to
/// compute, are always [`BypassKind::ExistingBetter`].
pub fn calculate(product: &Product, rule: &Rule, qty: Decimal) -> BypassResult {
    let regular = product.regular_price;
    let current = product.final_price;

    if !rule.simple_action.is_per_unit() && !matches!(rule.simple_action, SimpleAction::Custom(_))
    {
        return build_result(
            BypassKind::StackingFallback,
            Amounts::zero(regular, current),
            qty,
        );
    }

    if regular < EPSILON {
        return existing_better(regular, current, qty);
    }

    let existing = product.existing_discount();

    let Some(rule_discount) = rule_discount_from_regular(rule, regular) else {
        warn!(
            product_sku = %product.sku,
            rule_id = %rule.id,
            "rule discount out of range, keeping existing discount"
        );

        return existing_better(regular, current, qty);
    };

    let additional = rule_discount
        .checked_sub(existing)
        .map_or(Decimal::ZERO, |difference| difference.max(Decimal::ZERO));

    let kind = if additional > EPSILON {
        BypassKind::Adjusted
    } else {
        BypassKind::ExistingBetter
    };

    build_result(
        kind,
        Amounts {
            regular,
            current,
            existing,
            rule_discount,
            additional,
        },
        qty,
    )
}

/// Cap a rule discount computed by the host for an adjusted item.
///
/// `before` and `after` are the row discount before and after the rule ran.
/// Returns the row discount to write back when the rule gave more than
/// `max_allowed_total`, or `None` when it stayed within the cap.
pub fn cap_discount(before: Decimal, after: Decimal, max_allowed_total: Decimal) -> Option<Decimal> {
    let rule_discount = after.checked_sub(before)?;
    let limit = max_allowed_total.checked_add(EPSILON)?;

    if rule_discount > limit {
        before.checked_add(max_allowed_total)
    } else {
        None
    }
}

fn rule_discount_from_regular(rule: &Rule, regular: Decimal) -> Option<Decimal> {
    match rule.simple_action {
        SimpleAction::ByPercent => regular
            .checked_mul(rule.discount_amount)?
            .checked_div(Decimal::ONE_HUNDRED),
        SimpleAction::ByFixed => Some(rule.discount_amount),
        _ => Some(Decimal::ZERO),
    }
}

fn existing_better(regular: Decimal, current: Decimal, qty: Decimal) -> BypassResult {
    build_result(
        BypassKind::ExistingBetter,
        Amounts::zero(regular, current),
        qty,
    )
}

#[derive(Debug, Clone, Copy)]
struct Amounts {
    regular: Decimal,
    current: Decimal,
    existing: Decimal,
    rule_discount: Decimal,
    additional: Decimal,
}

impl Amounts {
    fn zero(regular: Decimal, current: Decimal) -> Self {
        Self {
            regular,
            current,
            existing: Decimal::ZERO,
            rule_discount: Decimal::ZERO,
            additional: Decimal::ZERO,
        }
    }
}

fn build_result(kind: BypassKind, amounts: Amounts, qty: Decimal) -> BypassResult {
    let Some(max_allowed_total) = amounts.additional.checked_mul(qty) else {
        return existing_better(amounts.regular, amounts.current, qty);
    };

    BypassResult {
        kind,
        additional_discount: round_money(amounts.additional),
        max_allowed_total: round_money(max_allowed_total),
        regular_price: amounts.regular,
        current_price: amounts.current,
        existing_discount_amount: round_money(amounts.existing),
        rule_discount_from_regular: round_money(amounts.rule_discount),
        existing_discount_percent: percent_of(amounts.existing, amounts.regular),
        rule_discount_percent: percent_of(amounts.rule_discount, amounts.regular),
        qty,
    }
}

fn percent_of(amount: Decimal, regular: Decimal) -> Decimal {
    if regular <= EPSILON {
        return Decimal::ZERO;
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(regular))
        .map_or(Decimal::ZERO, |percent| {
            percent.round_dp_with_strategy(PERCENT_DP, RoundingStrategy::MidpointAwayFromZero)
        })
}

fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(regular: i64, final_price: Decimal) -> Product {
        Product::new(1, "Widget", Decimal::new(regular, 0), final_price)
    }

    fn percent_rule(percent: i64) -> Rule {
        Rule::new(1, SimpleAction::ByPercent, Decimal::new(percent, 0))
    }

    #[test]
    fn epsilon_is_one_thousandth() {
        assert_eq!(EPSILON, Decimal::new(1, 3));
    }

    #[test]
    fn percent_rule_larger_than_existing_is_adjusted() {
        let result = calculate(&product(100, Decimal::new(75, 0)), &percent_rule(30), Decimal::ONE);

        assert_eq!(result.kind, BypassKind::Adjusted);
        assert_eq!(result.additional_discount, Decimal::new(5, 0));
        assert_eq!(result.max_allowed_total, Decimal::new(5, 0));
        assert_eq!(result.existing_discount_percent, Decimal::new(25, 0));
        assert_eq!(result.rule_discount_percent, Decimal::new(30, 0));
        assert_eq!(result.existing_discount_amount, Decimal::new(25, 0));
        assert_eq!(result.rule_discount_from_regular, Decimal::new(30, 0));
    }

    #[test]
    fn percent_rule_smaller_than_existing_is_existing_better() {
        let result = calculate(&product(100, Decimal::new(75, 0)), &percent_rule(20), Decimal::ONE);

        assert_eq!(result.kind, BypassKind::ExistingBetter);
        assert_eq!(result.additional_discount, Decimal::ZERO);
        assert_eq!(result.max_allowed_total, Decimal::ZERO);
    }

    #[test]
    fn equal_discounts_are_not_adjusted() {
        let result = calculate(&product(100, Decimal::new(75, 0)), &percent_rule(25), Decimal::ONE);

        assert_eq!(result.kind, BypassKind::ExistingBetter);
    }

    #[test]
    fn zero_regular_price_is_existing_better() {
        let result = calculate(&product(0, Decimal::ZERO), &percent_rule(30), Decimal::ONE);

        assert_eq!(result.kind, BypassKind::ExistingBetter);
        assert_eq!(result.existing_discount_percent, Decimal::ZERO);
        assert_eq!(result.rule_discount_percent, Decimal::ZERO);
    }

    #[test]
    fn cart_level_actions_fall_back_to_stacking() {
        let item = product(100, Decimal::new(75, 0));

        for action in [SimpleAction::CartFixed, SimpleAction::BuyXGetY] {
            let rule = Rule::new(1, action, Decimal::new(20, 0));
            let result = calculate(&item, &rule, Decimal::TWO);

            assert_eq!(result.kind, BypassKind::StackingFallback);
            assert_eq!(result.additional_discount, Decimal::ZERO);
            assert_eq!(result.existing_discount_amount, Decimal::ZERO);
            assert_eq!(result.rule_discount_from_regular, Decimal::ZERO);
            assert!(result.allows_rule());
        }
    }

    #[test]
    fn fixed_rule_larger_than_existing_is_adjusted() {
        let rule = Rule::new(1, SimpleAction::ByFixed, Decimal::TEN);
        let result = calculate(&product(100, Decimal::new(9250, 2)), &rule, Decimal::ONE);

        assert_eq!(result.kind, BypassKind::Adjusted);
        assert_eq!(result.additional_discount, Decimal::new(250, 2));
    }

    #[test]
    fn fixed_rule_smaller_than_existing_is_existing_better() {
        let rule = Rule::new(1, SimpleAction::ByFixed, Decimal::new(5, 0));
        let result = calculate(&product(100, Decimal::new(9250, 2)), &rule, Decimal::ONE);

        assert_eq!(result.kind, BypassKind::ExistingBetter);
        assert!(!result.allows_rule());
    }

    #[test]
    fn undiscounted_product_gets_full_rule_discount() {
        let result = calculate(&product(100, Decimal::new(100, 0)), &percent_rule(30), Decimal::ONE);

        assert_eq!(result.kind, BypassKind::Adjusted);
        assert_eq!(result.additional_discount, Decimal::new(30, 0));
    }

    #[test]
    fn max_allowed_total_scales_with_quantity() {
        let result = calculate(
            &product(100, Decimal::new(75, 0)),
            &percent_rule(30),
            Decimal::new(3, 0),
        );

        assert_eq!(result.additional_discount, Decimal::new(5, 0));
        assert_eq!(result.max_allowed_total, Decimal::new(15, 0));
        assert_eq!(result.qty, Decimal::new(3, 0));
    }

    #[test]
    fn fixed_rule_percentages_are_relative_to_regular_price() {
        let rule = Rule::new(1, SimpleAction::ByFixed, Decimal::new(50, 0));
        let result = calculate(&product(200, Decimal::new(160, 0)), &rule, Decimal::TWO);

        assert_eq!(result.kind, BypassKind::Adjusted);
        assert_eq!(result.additional_discount, Decimal::TEN);
        assert_eq!(result.max_allowed_total, Decimal::new(20, 0));
        assert_eq!(result.existing_discount_percent, Decimal::new(20, 0));
        assert_eq!(result.rule_discount_percent, Decimal::new(25, 0));
    }

    #[test]
    fn percentages_round_to_two_places() {
        let result = calculate(
            &Product::new(1, "Odd", Decimal::new(3, 0), Decimal::TWO),
            &percent_rule(50),
            Decimal::ONE,
        );

        assert_eq!(result.existing_discount_percent, Decimal::new(3333, 2));
        assert_eq!(result.rule_discount_percent, Decimal::new(50, 0));
        assert_eq!(result.additional_discount, Decimal::new(5, 1));
    }

    #[test]
    fn custom_actions_are_existing_better() {
        let rule = Rule::new(1, SimpleAction::Custom("ampromo_items".into()), Decimal::ONE);
        let result = calculate(&product(100, Decimal::new(75, 0)), &rule, Decimal::ONE);

        assert_eq!(result.kind, BypassKind::ExistingBetter);
    }

    #[test]
    fn cap_discount_limits_rule_discount() {
        let capped = cap_discount(Decimal::TWO, Decimal::new(32, 0), Decimal::new(5, 0));

        assert_eq!(capped, Some(Decimal::new(7, 0)));
    }

    #[test]
    fn cap_discount_leaves_discounts_within_tolerance() {
        let within = cap_discount(Decimal::ZERO, Decimal::new(50005, 4), Decimal::new(5, 0));

        assert_eq!(within, None);
    }

    #[test]
    fn oversized_prices_keep_existing_discount() {
        let item = Product::new(1, "Gold Bar", Decimal::MAX, Decimal::MAX);
        let result = calculate(&item, &percent_rule(30), Decimal::ONE);

        assert_eq!(result.kind, BypassKind::ExistingBetter);
        assert_eq!(result.additional_discount, Decimal::ZERO);
        assert_eq!(result.max_allowed_total, Decimal::ZERO);
    }

    #[test]
    fn oversized_row_total_keeps_existing_discount() {
        let rule = Rule::new(1, SimpleAction::ByFixed, Decimal::MAX);
        let result = calculate(&product(100, Decimal::new(100, 0)), &rule, Decimal::new(3, 0));

        assert_eq!(result.kind, BypassKind::ExistingBetter);
        assert!(!result.allows_rule());
    }

    #[test]
    fn cap_discount_tolerates_extreme_amounts() {
        assert_eq!(cap_discount(Decimal::MIN, Decimal::MAX, Decimal::ONE), None);
        assert_eq!(cap_discount(Decimal::ZERO, Decimal::ONE, Decimal::MAX), None);
    }

    #[test]
    fn bypass_kind_names_are_snake_case() {
        assert_eq!(BypassKind::Adjusted.to_string(), "adjusted");
        assert_eq!(BypassKind::ExistingBetter.as_str(), "existing_better");
        assert_eq!(BypassKind::StackingFallback.as_str(), "stacking_fallback");
    }
}
