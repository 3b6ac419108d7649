//! Exclusion Strategies
//!
//! Each strategy detects one way an item can already be discounted.
//! Strategies are combined with OR in list order; the first match wins.

use std::fmt;

use rust_decimal::Decimal;
use tracing::warn;

use crate::{
    catalog::{CatalogRuleLookup, Clock, ShopperScope},
    items::CartLineItem,
    products::Product,
};

/// Reason recorded when an item is blocked for being already discounted.
pub const ALREADY_DISCOUNTED: &str = "Product is already discounted";

/// Detects a specific "already discounted" condition.
pub trait ExclusionStrategy: fmt::Debug {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Reason recorded when this strategy excludes an item.
    fn reason(&self) -> &str {
        ALREADY_DISCOUNTED
    }

    /// Whether the item should be excluded from further discount.
    fn should_exclude(&self, product: &Product, item: &CartLineItem) -> bool;
}

/// Excludes products whose special price is the price actually charged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecialPriceStrategy;

impl ExclusionStrategy for SpecialPriceStrategy {
    fn name(&self) -> &str {
        "special_price"
    }

    fn should_exclude(&self, product: &Product, _item: &CartLineItem) -> bool {
        product
            .special_price
            .is_some_and(|special| special > Decimal::ZERO && special == product.final_price)
    }
}

/// Excludes products covered by any catalog price rule for the shopper.
///
/// Presence of a matching rule is enough, whether or not that rule is the one
/// that produced the final price. Lookup failures count as "no rules".
pub struct CatalogRuleStrategy<L, C> {
    lookup: L,
    clock: C,
    scope: ShopperScope,
}

impl<L: CatalogRuleLookup, C: Clock> CatalogRuleStrategy<L, C> {
    /// Create a strategy querying `lookup` for the given shopper.
    pub fn new(lookup: L, clock: C, scope: ShopperScope) -> Self {
        Self {
            lookup,
            clock,
            scope,
        }
    }
}

impl<L, C> fmt::Debug for CatalogRuleStrategy<L, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogRuleStrategy")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl<L: CatalogRuleLookup, C: Clock> ExclusionStrategy for CatalogRuleStrategy<L, C> {
    fn name(&self) -> &str {
        "catalog_rule"
    }

    fn should_exclude(&self, product: &Product, _item: &CartLineItem) -> bool {
        match self.lookup.lookup(
            self.clock.now(),
            self.scope.website,
            self.scope.customer_group,
            product.id,
        ) {
            Ok(rules) => !rules.is_empty(),
            Err(err) => {
                warn!(
                    product_sku = %product.sku,
                    error = %err,
                    "catalog rule lookup failed, treating product as not discounted"
                );

                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::{
        catalog::{
            CatalogLookupError, CustomerGroupId, FixedClock, MockCatalogRuleLookup, RuleRef,
            WebsiteId,
        },
        products::ProductId,
    };

    use super::*;

    fn product(final_price: i64, special_price: Option<i64>) -> Product {
        let product = Product::new(1, "Widget", Decimal::new(100, 0), Decimal::new(final_price, 0));

        match special_price {
            Some(special) => product.with_special_price(Decimal::new(special, 0)),
            None => product,
        }
    }

    fn item(product: &Product) -> CartLineItem {
        CartLineItem::new(product.clone(), Decimal::ONE)
    }

    #[test]
    fn special_price_winning_at_checkout_excludes() {
        let product = product(80, Some(80));

        assert!(SpecialPriceStrategy.should_exclude(&product, &item(&product)));
    }

    #[test]
    fn special_price_beaten_by_catalog_rule_does_not_exclude() {
        let product = product(70, Some(80));

        assert!(!SpecialPriceStrategy.should_exclude(&product, &item(&product)));
    }

    #[test]
    fn missing_or_zero_special_price_does_not_exclude() {
        let none = product(100, None);
        let zero = product(0, Some(0));

        assert!(!SpecialPriceStrategy.should_exclude(&none, &item(&none)));
        assert!(!SpecialPriceStrategy.should_exclude(&zero, &item(&zero)));
    }

    #[test]
    fn special_price_strategy_uses_shared_reason() {
        assert_eq!(SpecialPriceStrategy.reason(), ALREADY_DISCOUNTED);
    }

    #[test]
    fn catalog_rule_match_excludes() -> TestResult {
        let at: Timestamp = "2026-03-01T10:00:00Z".parse()?;
        let mut lookup = MockCatalogRuleLookup::new();

        lookup
            .expect_lookup()
            .with(eq(at), eq(WebsiteId(1)), eq(CustomerGroupId(2)), eq(ProductId(1)))
            .times(1)
            .returning(|_, _, _, _| {
                Ok(vec![RuleRef {
                    id: 4,
                    name: "Spring".to_string(),
                }])
            });

        let strategy = CatalogRuleStrategy::new(
            lookup,
            FixedClock(at),
            ShopperScope {
                website: WebsiteId(1),
                customer_group: CustomerGroupId(2),
            },
        );

        let product = product(100, None);

        assert!(strategy.should_exclude(&product, &item(&product)));

        Ok(())
    }

    #[test]
    fn no_catalog_rules_does_not_exclude() {
        let mut lookup = MockCatalogRuleLookup::new();

        lookup
            .expect_lookup()
            .times(1)
            .returning(|_, _, _, _| Ok(Vec::new()));

        let strategy = CatalogRuleStrategy::new(
            lookup,
            FixedClock(Timestamp::UNIX_EPOCH),
            ShopperScope::default(),
        );

        let product = product(100, None);

        assert!(!strategy.should_exclude(&product, &item(&product)));
    }

    #[test]
    fn catalog_lookup_failure_fails_open() {
        let mut lookup = MockCatalogRuleLookup::new();

        lookup
            .expect_lookup()
            .times(1)
            .returning(|_, _, _, _| Err(CatalogLookupError::Unavailable("down".to_string())));

        let strategy = CatalogRuleStrategy::new(
            lookup,
            FixedClock(Timestamp::UNIX_EPOCH),
            ShopperScope::default(),
        );

        let product = product(80, None);

        assert!(!strategy.should_exclude(&product, &item(&product)));
    }
}
