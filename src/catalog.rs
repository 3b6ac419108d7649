//! Catalog Rules
//!
//! Collaborators used to ask whether a catalog-level price rule currently
//! covers a product: the rule index lookup and a clock.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::ProductId;

/// Website id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebsiteId(pub u32);

/// Customer group id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerGroupId(pub u32);

/// The shopper a catalog rule lookup is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShopperScope {
    /// Website the cart belongs to
    pub website: WebsiteId,

    /// Shopper's customer group
    pub customer_group: CustomerGroupId,
}

/// Reference to a catalog rule that matched a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRef {
    /// Catalog rule id
    pub id: u64,

    /// Catalog rule name
    pub name: String,
}

/// Errors from a catalog rule index.
#[derive(Debug, Error)]
pub enum CatalogLookupError {
    /// The index could not be reached or read.
    #[error("catalog rule index unavailable: {0}")]
    Unavailable(String),
}

/// Looks up the catalog rules applying to a product.
#[cfg_attr(test, mockall::automock)]
pub trait CatalogRuleLookup {
    /// Return the catalog rules applying to `product` for the given scope at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogLookupError`] when the index cannot be queried.
    fn lookup(
        &self,
        at: Timestamp,
        website: WebsiteId,
        customer_group: CustomerGroupId,
        product: ProductId,
    ) -> Result<Vec<RuleRef>, CatalogLookupError>;
}

/// Supplies "now".
pub trait Clock {
    /// Current instant
    fn now(&self) -> Timestamp;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// A catalog rule as held by [`CatalogRuleIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRule {
    /// Rule id
    pub id: u64,

    /// Rule name
    pub name: String,

    /// Products covered by the rule
    pub products: Vec<ProductId>,

    /// Websites the rule runs on; empty means all
    #[serde(default)]
    pub websites: Vec<WebsiteId>,

    /// Customer groups the rule targets; empty means all
    #[serde(default)]
    pub customer_groups: Vec<CustomerGroupId>,

    /// Start of the rule's validity
    #[serde(default)]
    pub from: Option<Timestamp>,

    /// End of the rule's validity (exclusive)
    #[serde(default)]
    pub to: Option<Timestamp>,

    /// Whether the rule is active
    #[serde(default = "active_default")]
    pub active: bool,
}

fn active_default() -> bool {
    true
}

impl CatalogRule {
    /// Whether the rule covers `product` for the scope at `at`.
    pub fn applies(
        &self,
        at: Timestamp,
        website: WebsiteId,
        customer_group: CustomerGroupId,
        product: ProductId,
    ) -> bool {
        self.active
            && self.products.contains(&product)
            && (self.websites.is_empty() || self.websites.contains(&website))
            && (self.customer_groups.is_empty() || self.customer_groups.contains(&customer_group))
            && self.from.is_none_or(|from| from <= at)
            && self.to.is_none_or(|to| at < to)
    }
}

/// In-memory catalog rule index.
#[derive(Debug, Clone, Default)]
pub struct CatalogRuleIndex {
    rules: Vec<CatalogRule>,
}

impl CatalogRuleIndex {
    /// Create an index over the given rules.
    pub fn new(rules: impl Into<Vec<CatalogRule>>) -> Self {
        Self {
            rules: rules.into(),
        }
    }

    /// Number of rules in the index.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the index holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl CatalogRuleLookup for CatalogRuleIndex {
    fn lookup(
        &self,
        at: Timestamp,
        website: WebsiteId,
        customer_group: CustomerGroupId,
        product: ProductId,
    ) -> Result<Vec<RuleRef>, CatalogLookupError> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| rule.applies(at, website, customer_group, product))
            .map(|rule| RuleRef {
                id: rule.id,
                name: rule.name.clone(),
            })
            .collect())
    }
}
