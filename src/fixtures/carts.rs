//! Cart Fixtures

use rust_decimal::Decimal;
use serde::Deserialize;

/// Wrapper for cart line items in YAML
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Line items, in cart order
    pub items: Vec<LineItemFixture>,
}

/// A cart line item referencing products by key
#[derive(Debug, Deserialize)]
pub struct LineItemFixture {
    /// Product key
    pub product: String,

    /// Quantity
    #[serde(default = "default_qty")]
    pub qty: Decimal,

    /// Product keys of child items (bundle components)
    #[serde(default)]
    pub children: Vec<String>,
}

fn default_qty() -> Decimal {
    Decimal::ONE
}
