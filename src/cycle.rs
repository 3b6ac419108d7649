//! Evaluation Cycle
//!
//! One cart recalculation: items are processed against rules, then the
//! collected records are turned into messages and the collector is reset.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    bypass::BypassKind,
    collector::ResultCollector,
    config::StoreId,
    engine::{DecisionEngine, EvaluationContext, Outcome},
    items::CartLineItem,
    messages::{Message, MessageComposer, PriceFormatter},
    rules::Rule,
};

/// Smallest applied discount that keeps a coupon on the cart.
pub const MIN_APPLIED_DISCOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// What a finished cycle tells the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    /// Messages to show the shopper, in display order
    pub messages: Vec<Message>,

    /// Whether the coupon should be taken off the cart
    pub remove_coupon: bool,
}

/// A single cart evaluation cycle.
#[derive(Debug)]
pub struct EvaluationCycle<'a, F> {
    engine: &'a DecisionEngine,
    composer: &'a MessageComposer<F>,
    collector: ResultCollector,
    store: Option<StoreId>,
}

impl<'a, F: PriceFormatter> EvaluationCycle<'a, F> {
    /// Start a cycle with an empty collector.
    pub fn new(engine: &'a DecisionEngine, composer: &'a MessageComposer<F>) -> Self {
        Self {
            engine,
            composer,
            collector: ResultCollector::new(),
            store: None,
        }
    }

    /// Evaluate one item against one rule. See [`DecisionEngine::process`].
    pub fn process(
        &mut self,
        item: &mut CartLineItem,
        rule: &Rule,
        ctx: &EvaluationContext,
        apply_rule: impl FnOnce(&mut CartLineItem),
    ) -> Outcome {
        self.store = ctx.store;

        self.engine
            .process(item, rule, ctx, &mut self.collector, apply_rule)
    }

    /// Records collected so far.
    pub fn collector(&self) -> &ResultCollector {
        &self.collector
    }

    /// Finish the cycle for `coupon_code`.
    ///
    /// Messages are built once, unless they are disabled for the store of
    /// the processed items. The coupon is flagged for removal when it
    /// discounted nothing and no item received an adjusted discount. The
    /// collector is always cleared.
    pub fn finish(
        &mut self,
        coupon_code: Option<&str>,
        applied_discount_total: Decimal,
    ) -> CycleSummary {
        let summary = match coupon_code.filter(|code| !code.is_empty()) {
            Some(code)
                if self.collector.has_excluded(code) || self.collector.has_bypassed(code) =>
            {
                self.summarise(code, applied_discount_total)
            }
            _ => CycleSummary::default(),
        };

        self.collector.clear();

        summary
    }

    fn summarise(&self, coupon_code: &str, applied_discount_total: Decimal) -> CycleSummary {
        let messages = if self.engine.config().is_messages_enabled(self.store) {
            self.composer.build(coupon_code, &self.collector)
        } else {
            debug!(coupon_code, store = ?self.store, "messages disabled for store");

            Vec::new()
        };

        let has_adjusted = self
            .collector
            .bypassed(coupon_code)
            .iter()
            .any(|(_, record)| record.kind == BypassKind::Adjusted);

        let remove_coupon = applied_discount_total.abs() < MIN_APPLIED_DISCOUNT && !has_adjusted;

        if remove_coupon {
            info!(coupon_code, "removing coupon, no discount applied");
        }

        debug!(
            coupon_code,
            messages = messages.len(),
            remove_coupon,
            "evaluation cycle finished"
        );

        CycleSummary {
            messages,
            remove_coupon,
        }
    }
}
