//! Products

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product identifier, as assigned by the host catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Pricing facts for a product at the time of evaluation.
///
/// `final_price` is expected to be at or below `regular_price`, but this is
/// not enforced. Callers treat violations as "not discounted".
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product id
    pub id: ProductId,

    /// Product SKU
    pub sku: String,

    /// Product name, used when narrating decisions
    pub name: String,

    /// Regular (list) price
    pub regular_price: Decimal,

    /// Price the shopper actually pays before cart rules
    pub final_price: Decimal,

    /// Special price, when one is configured
    pub special_price: Option<Decimal>,
}

impl Product {
    /// Create a product with no special price.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        regular_price: Decimal,
        final_price: Decimal,
    ) -> Self {
        let name = name.into();

        Self {
            id: ProductId(id),
            sku: name.to_lowercase().replace(' ', "-"),
            name,
            regular_price,
            final_price,
            special_price: None,
        }
    }

    /// Set the SKU.
    #[must_use]
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    /// Set the special price.
    #[must_use]
    pub fn with_special_price(mut self, special_price: Decimal) -> Self {
        self.special_price = Some(special_price);
        self
    }

    /// Whether the final price is above the regular price.
    pub fn is_marked_up(&self) -> bool {
        self.final_price > self.regular_price
    }

    /// Amount already taken off the regular price, never negative.
    pub fn existing_discount(&self) -> Decimal {
        self.regular_price
            .checked_sub(self.final_price)
            .map_or(Decimal::ZERO, |discount| discount.max(Decimal::ZERO))
    }
}
