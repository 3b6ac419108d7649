//! Product Fixtures

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::iso::{Currency, EUR, GBP, USD};
use serde::Deserialize;

use crate::{fixtures::FixtureError, products::Product};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Map of product key (SKU) -> product fixture
    pub products: FxHashMap<String, ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product id
    pub id: u64,

    /// Product name
    pub name: String,

    /// Regular price (e.g., "100.00 GBP")
    pub regular_price: String,

    /// Price charged after catalog-level discounts
    pub final_price: String,

    /// Special price, if one is set
    #[serde(default)]
    pub special_price: Option<String>,
}

impl ProductFixture {
    /// Convert to a [`Product`] keyed by `sku`, returning the currency its
    /// prices are quoted in.
    ///
    /// # Errors
    ///
    /// Returns an error if a price is malformed or the prices use different currencies.
    pub fn into_product(self, sku: &str) -> Result<(Product, &'static Currency), FixtureError> {
        let (regular, currency) = parse_price(&self.regular_price)?;
        let final_price = parse_price_in(&self.final_price, currency)?;

        let product = Product::new(self.id, self.name, regular, final_price).with_sku(sku);

        let product = match self.special_price {
            Some(special) => product.with_special_price(parse_price_in(&special, currency)?),
            None => product,
        };

        Ok((product, currency))
    }
}

/// Parse price string (e.g., "2.99 GBP") into an amount and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a decimal, or if the currency code is not recognized.
pub fn parse_price(s: &str) -> Result<(Decimal, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    if amount.is_sign_negative() {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    }

    let currency = match *currency_code {
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    Ok((amount, currency))
}

fn parse_price_in(s: &str, expected: &'static Currency) -> Result<Decimal, FixtureError> {
    let (amount, currency) = parse_price(s)?;

    if currency != expected {
        return Err(FixtureError::CurrencyMismatch(
            expected.iso_alpha_code.to_string(),
            currency.iso_alpha_code.to_string(),
        ));
    }

    Ok(amount)
}
