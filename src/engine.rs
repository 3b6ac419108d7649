//! Decision Engine
//!
//! Runs the guard chain and the strategy chain for one item/rule pair, and
//! drives the bypass path for rules that opt into it.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::{
    bypass::{self, BypassKind, BypassResult},
    collector::{MessageParams, ResultCollector},
    config::{Config, StoreId},
    guards::{EligibilityGuard, default_guards},
    items::CartLineItem,
    products::Product,
    rules::Rule,
    strategies::ExclusionStrategy,
};

/// Per-call context supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationContext {
    /// Store the cart belongs to
    pub store: Option<StoreId>,

    /// Coupon code being applied, if known
    pub coupon_code: Option<String>,
}

impl EvaluationContext {
    /// Context for a coupon in the default store.
    pub fn with_coupon(coupon_code: impl Into<String>) -> Self {
        Self {
            store: None,
            coupon_code: Some(coupon_code.into()),
        }
    }

    /// Set the store.
    #[must_use]
    pub fn in_store(mut self, store: StoreId) -> Self {
        self.store = Some(store);
        self
    }

    /// The coupon code when it is present and non-empty.
    pub fn tracked_coupon(&self) -> Option<&str> {
        self.coupon_code.as_deref().filter(|code| !code.is_empty())
    }
}

/// Verdict of the bypass path.
#[derive(Debug, Clone, PartialEq)]
pub enum BypassVerdict {
    /// Item is not already discounted; the rule applies in full.
    NotDiscounted,

    /// No per-item cap is definable; the rule applies in full.
    StackingFallback(BypassResult),

    /// Existing discount is at least as large; the rule is blocked.
    ExistingBetter(BypassResult),

    /// The rule applies, capped to the difference.
    Adjusted(BypassResult),
}

impl BypassVerdict {
    /// Whether the rule may run.
    pub fn allows_rule(&self) -> bool {
        !matches!(self, Self::ExistingBetter(_))
    }
}

/// Why an item was passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Module disabled for the store
    ModuleDisabled,

    /// Child items are evaluated through their parent
    ChildItem,
}

/// Result of [`DecisionEngine::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Exclusion logic did not run; the rule was applied.
    Skipped(SkipReason),

    /// The rule was applied normally.
    Applied,

    /// The rule was blocked on the standard path.
    Excluded,

    /// The rule was blocked on the bypass path.
    ExistingBetter,

    /// The rule was applied in full on the bypass path.
    StackingFallback,

    /// The rule was applied on the bypass path, capped when it exceeded the allowance.
    Adjusted {
        /// Item discount written back after capping
        capped_to: Option<Decimal>,
    },
}

impl Outcome {
    /// Whether the rule's discount calculation ran.
    pub fn rule_applied(self) -> bool {
        !matches!(self, Self::Excluded | Self::ExistingBetter)
    }
}

/// Decides whether a rule may discount a cart item.
#[derive(Debug)]
pub struct DecisionEngine {
    guards: Vec<Box<dyn EligibilityGuard>>,
    strategies: Vec<Box<dyn ExclusionStrategy>>,
    config: Config,
}

impl DecisionEngine {
    /// Create an engine from explicit guard and strategy lists.
    pub fn new(
        guards: Vec<Box<dyn EligibilityGuard>>,
        strategies: Vec<Box<dyn ExclusionStrategy>>,
        config: Config,
    ) -> Self {
        Self {
            guards,
            strategies,
            config,
        }
    }

    /// Create an engine with the standard guards and no strategies.
    pub fn with_defaults(config: Config) -> Self {
        Self::new(default_guards(), Vec::new(), config)
    }

    /// Append a strategy; strategies run in insertion order.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl ExclusionStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Append a guard; guards run in insertion order.
    #[must_use]
    pub fn with_guard(mut self, guard: impl EligibilityGuard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    /// Engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Standard path: whether the rule must be blocked for this item.
    pub fn decide(&self, product: &Product, item: &CartLineItem, rule: &Rule) -> bool {
        self.find_exclusion(product, item, rule, false).is_some()
    }

    /// Whether the item counts as already discounted for a bypass rule.
    ///
    /// Runs the same detection as [`Self::decide`] minus guards scoped to the
    /// standard path.
    pub fn is_already_discounted(&self, product: &Product, item: &CartLineItem, rule: &Rule) -> bool {
        self.find_exclusion(product, item, rule, true).is_some()
    }

    /// Bypass path: how a bypass rule may discount this item.
    pub fn decide_with_bypass(
        &self,
        product: &Product,
        item: &CartLineItem,
        rule: &Rule,
        qty: Decimal,
    ) -> BypassVerdict {
        if !self.is_already_discounted(product, item, rule) {
            debug!(
                product_sku = %product.sku,
                rule_id = %rule.id,
                "bypass rule on non-discounted product, proceeding normally"
            );

            return BypassVerdict::NotDiscounted;
        }

        let result = bypass::calculate(product, rule, qty);

        debug!(
            product_sku = %product.sku,
            rule_id = %rule.id,
            kind = %result.kind,
            additional_discount = %result.additional_discount,
            max_allowed_total = %result.max_allowed_total,
            "bypass result"
        );

        match result.kind {
            BypassKind::StackingFallback => BypassVerdict::StackingFallback(result),
            BypassKind::ExistingBetter => BypassVerdict::ExistingBetter(result),
            BypassKind::Adjusted => BypassVerdict::Adjusted(result),
        }
    }

    /// Evaluate one item against one rule, running `apply_rule` when the rule
    /// is allowed and recording blocks and adjustments in `collector`.
    pub fn process<F>(
        &self,
        item: &mut CartLineItem,
        rule: &Rule,
        ctx: &EvaluationContext,
        collector: &mut ResultCollector,
        apply_rule: F,
    ) -> Outcome
    where
        F: FnOnce(&mut CartLineItem),
    {
        if !self.config.is_enabled(ctx.store) {
            apply_rule(item);

            return Outcome::Skipped(SkipReason::ModuleDisabled);
        }

        if item.is_child() {
            apply_rule(item);

            return Outcome::Skipped(SkipReason::ChildItem);
        }

        let subject = item.pricing_subject().clone();

        if rule.bypass_enabled {
            self.process_bypass(&subject, item, rule, ctx, collector, apply_rule)
        } else {
            self.process_standard(&subject, item, rule, ctx, collector, apply_rule)
        }
    }

    fn process_standard<F>(
        &self,
        subject: &Product,
        item: &mut CartLineItem,
        rule: &Rule,
        ctx: &EvaluationContext,
        collector: &mut ResultCollector,
        apply_rule: F,
    ) -> Outcome
    where
        F: FnOnce(&mut CartLineItem),
    {
        let Some(strategy) = self.find_exclusion(subject, item, rule, false) else {
            debug!(
                product_sku = %subject.sku,
                rule_id = %rule.id,
                "allowing discount for product"
            );

            apply_rule(item);

            return Outcome::Applied;
        };

        info!(
            product_sku = %subject.sku,
            product_name = %subject.name,
            rule_id = %rule.id,
            coupon_code = ctx.coupon_code.as_deref(),
            "blocking discount for product"
        );

        match ctx.tracked_coupon() {
            Some(coupon_code) => collector.add_excluded(
                item.product().id,
                item.product().name.as_str(),
                strategy.reason(),
                coupon_code,
            ),
            None => warn!(
                product_sku = %subject.sku,
                "no coupon code found, cannot track exclusion"
            ),
        }

        Outcome::Excluded
    }

    fn process_bypass<F>(
        &self,
        subject: &Product,
        item: &mut CartLineItem,
        rule: &Rule,
        ctx: &EvaluationContext,
        collector: &mut ResultCollector,
        apply_rule: F,
    ) -> Outcome
    where
        F: FnOnce(&mut CartLineItem),
    {
        match self.decide_with_bypass(subject, item, rule, item.qty()) {
            BypassVerdict::NotDiscounted => {
                apply_rule(item);

                Outcome::Applied
            }
            BypassVerdict::StackingFallback(_) => {
                apply_rule(item);

                Outcome::StackingFallback
            }
            BypassVerdict::ExistingBetter(result) => {
                info!(
                    product_sku = %subject.sku,
                    rule_id = %rule.id,
                    "bypass existing better, blocking discount"
                );

                record_bypass(collector, item, rule, ctx, &result);

                Outcome::ExistingBetter
            }
            BypassVerdict::Adjusted(result) => {
                let before = item.discount_amount();

                apply_rule(item);

                let after = item.discount_amount();
                let capped_to = bypass::cap_discount(before, after, result.max_allowed_total);

                if let Some(capped) = capped_to {
                    item.set_discount_amount(capped);

                    info!(
                        product_sku = %subject.sku,
                        rule_id = %rule.id,
                        original_discount = %(after - before),
                        capped_to = %result.max_allowed_total,
                        "capped bypass discount"
                    );
                }

                record_bypass(collector, item, rule, ctx, &result);

                Outcome::Adjusted { capped_to }
            }
        }
    }

    fn find_exclusion(
        &self,
        product: &Product,
        item: &CartLineItem,
        rule: &Rule,
        bypass_path: bool,
    ) -> Option<&dyn ExclusionStrategy> {
        for guard in &self.guards {
            if bypass_path && !guard.applies_to_bypass_path() {
                continue;
            }

            if !guard.can_process(product, item, rule) {
                debug!(
                    guard = guard.name(),
                    product_sku = %product.sku,
                    rule_id = %rule.id,
                    "guard exempted item from exclusion"
                );

                return None;
            }
        }

        if product.is_marked_up() {
            debug!(
                product_sku = %product.sku,
                regular_price = %product.regular_price,
                final_price = %product.final_price,
                "final price above regular price, not treated as discounted"
            );

            return None;
        }

        let strategy = self
            .strategies
            .iter()
            .find(|strategy| strategy.should_exclude(product, item))?;

        debug!(
            strategy = strategy.name(),
            product_sku = %product.sku,
            rule_id = %rule.id,
            "strategy matched"
        );

        Some(&**strategy)
    }
}

fn record_bypass(
    collector: &mut ResultCollector,
    item: &CartLineItem,
    rule: &Rule,
    ctx: &EvaluationContext,
    result: &BypassResult,
) {
    if let Some(coupon_code) = ctx.tracked_coupon() {
        collector.add_bypassed(
            item.product().id,
            item.product().name.as_str(),
            result.kind,
            MessageParams::from_bypass(rule, result),
            coupon_code,
        );
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use crate::{
        config::StoreOverrides,
        guards::ZeroPriceGuard,
        products::ProductId,
        rules::{CouponRequirement, SimpleAction},
        strategies::SpecialPriceStrategy,
    };

    use super::*;

    #[derive(Debug)]
    struct StubGuard {
        allow: bool,
        calls: Rc<Cell<usize>>,
    }

    impl EligibilityGuard for StubGuard {
        fn name(&self) -> &str {
            "stub_guard"
        }

        fn can_process(&self, _product: &Product, _item: &CartLineItem, _rule: &Rule) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.allow
        }
    }

    #[derive(Debug)]
    struct StubStrategy {
        exclude: bool,
        reason: &'static str,
        calls: Rc<Cell<usize>>,
    }

    impl ExclusionStrategy for StubStrategy {
        fn name(&self) -> &str {
            "stub_strategy"
        }

        fn reason(&self) -> &str {
            self.reason
        }

        fn should_exclude(&self, _product: &Product, _item: &CartLineItem) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.exclude
        }
    }

    fn guard(allow: bool) -> (StubGuard, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));

        (
            StubGuard {
                allow,
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }

    fn strategy(exclude: bool, reason: &'static str) -> (StubStrategy, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));

        (
            StubStrategy {
                exclude,
                reason,
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }

    fn discounted() -> Product {
        Product::new(1, "Widget A", Decimal::new(100, 0), Decimal::new(75, 0))
            .with_special_price(Decimal::new(75, 0))
    }

    fn full_price() -> Product {
        Product::new(2, "Widget B", Decimal::new(100, 0), Decimal::new(100, 0))
    }

    fn percent_rule(percent: i64) -> Rule {
        Rule::new(7, SimpleAction::ByPercent, Decimal::new(percent, 0))
    }

    fn engine() -> DecisionEngine {
        DecisionEngine::with_defaults(Config::default()).with_strategy(SpecialPriceStrategy)
    }

    fn discount_by(amount: i64) -> impl FnOnce(&mut CartLineItem) {
        move |item: &mut CartLineItem| {
            let total = item.discount_amount() + Decimal::new(amount, 0);
            item.set_discount_amount(total);
        }
    }

    #[test]
    fn failing_guard_short_circuits_everything() {
        let (first, first_calls) = guard(false);
        let (second, second_calls) = guard(true);
        let (strat, strat_calls) = strategy(true, "nope");

        let engine = DecisionEngine::new(
            vec![Box::new(first), Box::new(second)],
            vec![Box::new(strat)],
            Config::default(),
        );

        let product = discounted();
        let item = CartLineItem::new(product.clone(), Decimal::ONE);

        assert!(!engine.decide(&product, &item, &percent_rule(10)));
        assert_eq!(first_calls.get(), 1);
        assert_eq!(second_calls.get(), 0);
        assert_eq!(strat_calls.get(), 0);
    }

    #[test]
    fn first_matching_strategy_wins() {
        let (first, first_calls) = strategy(false, "first");
        let (second, second_calls) = strategy(true, "second");
        let (third, third_calls) = strategy(true, "third");

        let engine = DecisionEngine::new(
            Vec::new(),
            vec![Box::new(first), Box::new(second), Box::new(third)],
            Config::default(),
        );

        let mut item = CartLineItem::new(full_price(), Decimal::ONE);
        let mut collector = ResultCollector::new();

        let outcome = engine.process(
            &mut item,
            &percent_rule(10),
            &EvaluationContext::with_coupon("SAVE10"),
            &mut collector,
            discount_by(10),
        );

        assert_eq!(outcome, Outcome::Excluded);
        assert_eq!(first_calls.get(), 1);
        assert_eq!(second_calls.get(), 1);
        assert_eq!(third_calls.get(), 0);
        assert_eq!(
            collector
                .excluded("SAVE10")
                .first()
                .map(|(_, record)| record.reason.as_str()),
            Some("second")
        );
    }

    #[test]
    fn empty_guards_proceed_to_strategies() {
        let (strat, calls) = strategy(true, "reason");
        let engine = DecisionEngine::new(Vec::new(), vec![Box::new(strat)], Config::default());

        let product = full_price();
        let item = CartLineItem::new(product.clone(), Decimal::ONE);

        assert!(engine.decide(&product, &item, &percent_rule(10)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn empty_strategies_never_exclude() {
        let engine = DecisionEngine::with_defaults(Config::default());

        let product = discounted();
        let item = CartLineItem::new(product.clone(), Decimal::ONE);

        assert!(!engine.decide(&product, &item, &percent_rule(10)));
    }

    #[test]
    fn standard_block_records_exclusion() {
        let mut item = CartLineItem::new(discounted(), Decimal::ONE);
        let mut collector = ResultCollector::new();

        let outcome = engine().process(
            &mut item,
            &percent_rule(10),
            &EvaluationContext::with_coupon("SAVE10"),
            &mut collector,
            discount_by(10),
        );

        assert_eq!(outcome, Outcome::Excluded);
        assert!(!outcome.rule_applied());
        assert_eq!(item.discount_amount(), Decimal::ZERO);
        assert_eq!(
            collector.excluded("SAVE10").first().map(|(id, record)| (*id, record.name.as_str())),
            Some((ProductId(1), "Widget A"))
        );
    }

    #[test]
    fn standard_allow_applies_rule() {
        let mut item = CartLineItem::new(full_price(), Decimal::ONE);
        let mut collector = ResultCollector::new();

        let outcome = engine().process(
            &mut item,
            &percent_rule(10),
            &EvaluationContext::with_coupon("SAVE10"),
            &mut collector,
            discount_by(10),
        );

        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(item.discount_amount(), Decimal::TEN);
        assert!(!collector.has_any_excluded());
    }

    #[test]
    fn missing_coupon_blocks_without_recording() {
        let mut item = CartLineItem::new(discounted(), Decimal::ONE);
        let mut collector = ResultCollector::new();

        let ctx = EvaluationContext {
            store: None,
            coupon_code: Some(String::new()),
        };

        let outcome = engine().process(&mut item, &percent_rule(10), &ctx, &mut collector, discount_by(10));

        assert_eq!(outcome, Outcome::Excluded);
        assert!(!collector.has_any_excluded());
    }

    #[test]
    fn automatic_rules_are_never_blocked() {
        let mut item = CartLineItem::new(discounted(), Decimal::ONE);
        let mut collector = ResultCollector::new();

        let rule = percent_rule(10).with_coupon_requirement(CouponRequirement::None);

        let outcome = engine().process(
            &mut item,
            &rule,
            &EvaluationContext::default(),
            &mut collector,
            discount_by(10),
        );

        assert_eq!(outcome, Outcome::Applied);
    }

    #[test]
    fn disabled_module_passes_everything_through() {
        let config = Config::default().with_store(
            StoreId(2),
            StoreOverrides {
                enabled: Some(false),
                messages_enabled: None,
            },
        );

        let engine = DecisionEngine::with_defaults(config).with_strategy(SpecialPriceStrategy);

        let mut item = CartLineItem::new(discounted(), Decimal::ONE);
        let mut collector = ResultCollector::new();

        let outcome = engine.process(
            &mut item,
            &percent_rule(10),
            &EvaluationContext::with_coupon("SAVE10").in_store(StoreId(2)),
            &mut collector,
            discount_by(10),
        );

        assert_eq!(outcome, Outcome::Skipped(SkipReason::ModuleDisabled));
        assert_eq!(item.discount_amount(), Decimal::TEN);
        assert!(!collector.has_any_excluded());
    }

    #[test]
    fn child_items_are_passed_through() {
        let mut child = CartLineItem::new(discounted(), Decimal::ONE).with_parent(ProductId(9));
        let mut collector = ResultCollector::new();

        let outcome = engine().process(
            &mut child,
            &percent_rule(10),
            &EvaluationContext::with_coupon("SAVE10"),
            &mut collector,
            discount_by(10),
        );

        assert_eq!(outcome, Outcome::Skipped(SkipReason::ChildItem));
        assert!(outcome.rule_applied());
    }

    #[test]
    fn parent_is_judged_by_first_child() {
        let parent = Product::new(9, "Bundle", Decimal::new(100, 0), Decimal::new(100, 0));
        let mut item = CartLineItem::new(parent, Decimal::ONE)
            .with_child(CartLineItem::new(discounted(), Decimal::ONE));
        let mut collector = ResultCollector::new();

        let outcome = engine().process(
            &mut item,
            &percent_rule(10),
            &EvaluationContext::with_coupon("SAVE10"),
            &mut collector,
            discount_by(10),
        );

        assert_eq!(outcome, Outcome::Excluded);
        assert_eq!(
            collector.excluded("SAVE10").first().map(|(id, _)| *id),
            Some(ProductId(9))
        );
    }

    #[test]
    fn bypass_detection_ignores_bypass_flag_guard() {
        let product = discounted();
        let item = CartLineItem::new(product.clone(), Decimal::ONE);
        let rule = percent_rule(30).with_bypass(true);

        assert!(!engine().decide(&product, &item, &rule));
        assert!(engine().is_already_discounted(&product, &item, &rule));
    }

    #[test]
    fn bypass_on_full_price_item_applies_in_full() {
        let product = full_price();
        let item = CartLineItem::new(product.clone(), Decimal::ONE);
        let rule = percent_rule(30).with_bypass(true);

        let verdict = engine().decide_with_bypass(&product, &item, &rule, Decimal::ONE);

        assert_eq!(verdict, BypassVerdict::NotDiscounted);
        assert!(verdict.allows_rule());
    }

    #[test]
    fn bypass_adjusted_caps_discount() {
        let mut item = CartLineItem::new(discounted(), Decimal::ONE);
        let mut collector = ResultCollector::new();

        let outcome = engine().process(
            &mut item,
            &percent_rule(30).with_bypass(true),
            &EvaluationContext::with_coupon("SAVE30"),
            &mut collector,
            discount_by(30),
        );

        assert_eq!(
            outcome,
            Outcome::Adjusted {
                capped_to: Some(Decimal::new(5, 0))
            }
        );
        assert_eq!(item.discount_amount(), Decimal::new(5, 0));
        assert_eq!(
            collector.bypassed("SAVE30").first().map(|(_, record)| record.kind),
            Some(BypassKind::Adjusted)
        );
    }

    #[test]
    fn bypass_adjusted_within_allowance_is_not_capped() {
        let mut item = CartLineItem::new(discounted(), Decimal::ONE);
        let mut collector = ResultCollector::new();

        let outcome = engine().process(
            &mut item,
            &percent_rule(30).with_bypass(true),
            &EvaluationContext::with_coupon("SAVE30"),
            &mut collector,
            discount_by(4),
        );

        assert_eq!(outcome, Outcome::Adjusted { capped_to: None });
        assert_eq!(item.discount_amount(), Decimal::new(4, 0));
    }

    #[test]
    fn bypass_existing_better_blocks_and_records() {
        let mut item = CartLineItem::new(discounted(), Decimal::ONE);
        let mut collector = ResultCollector::new();

        let outcome = engine().process(
            &mut item,
            &percent_rule(20).with_bypass(true),
            &EvaluationContext::with_coupon("SAVE20"),
            &mut collector,
            discount_by(20),
        );

        assert_eq!(outcome, Outcome::ExistingBetter);
        assert_eq!(item.discount_amount(), Decimal::ZERO);
        assert_eq!(
            collector.bypassed("SAVE20").first().map(|(_, record)| record.kind),
            Some(BypassKind::ExistingBetter)
        );
    }

    #[test]
    fn bypass_cart_fixed_stacks_in_full() {
        let mut item = CartLineItem::new(discounted(), Decimal::ONE);
        let mut collector = ResultCollector::new();

        let rule = Rule::new(3, SimpleAction::CartFixed, Decimal::new(50, 0)).with_bypass(true);

        let outcome = engine().process(
            &mut item,
            &rule,
            &EvaluationContext::with_coupon("CART50"),
            &mut collector,
            discount_by(50),
        );

        assert_eq!(outcome, Outcome::StackingFallback);
        assert_eq!(item.discount_amount(), Decimal::new(50, 0));
        assert!(!collector.has_any_bypassed());
    }

    #[test]
    fn bypass_respects_zero_price_guard() {
        let engine = DecisionEngine::new(
            vec![Box::new(ZeroPriceGuard)],
            vec![Box::new(SpecialPriceStrategy)],
            Config::default(),
        );

        let free = Product::new(3, "Gift", Decimal::new(10, 0), Decimal::ZERO)
            .with_special_price(Decimal::ZERO);
        let item = CartLineItem::new(free.clone(), Decimal::ONE);

        let verdict =
            engine.decide_with_bypass(&free, &item, &percent_rule(30).with_bypass(true), Decimal::ONE);

        assert_eq!(verdict, BypassVerdict::NotDiscounted);
    }

    fn marked_up() -> Product {
        Product::new(4, "Widget C", Decimal::new(100, 0), Decimal::new(120, 0))
            .with_special_price(Decimal::new(120, 0))
    }

    #[test]
    fn marked_up_product_is_never_excluded() {
        let product = marked_up();
        let mut item = CartLineItem::new(product.clone(), Decimal::ONE);
        let mut collector = ResultCollector::new();

        assert!(!engine().decide(&product, &item, &percent_rule(10)));

        let outcome = engine().process(
            &mut item,
            &percent_rule(10),
            &EvaluationContext::with_coupon("SAVE10"),
            &mut collector,
            discount_by(12),
        );

        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(item.discount_amount(), Decimal::new(12, 0));
        assert!(!collector.has_any_excluded());
    }

    #[test]
    fn marked_up_product_is_not_discounted_on_bypass_path() {
        let product = marked_up();
        let rule = percent_rule(30).with_bypass(true);
        let mut item = CartLineItem::new(product.clone(), Decimal::ONE);
        let mut collector = ResultCollector::new();

        assert!(!engine().is_already_discounted(&product, &item, &rule));
        assert_eq!(
            engine().decide_with_bypass(&product, &item, &rule, Decimal::ONE),
            BypassVerdict::NotDiscounted
        );

        let outcome = engine().process(
            &mut item,
            &rule,
            &EvaluationContext::with_coupon("SAVE30"),
            &mut collector,
            discount_by(36),
        );

        assert_eq!(outcome, Outcome::Applied);
        assert!(!collector.has_any_bypassed());
    }
}
