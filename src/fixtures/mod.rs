//! Fixtures

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    catalog::{CatalogRule, CatalogRuleIndex},
    fixtures::{
        carts::CartFixture,
        catalog::CatalogFixture,
        products::ProductsFixture,
        rules::{CouponRule, RulesFixture},
    },
    items::CartLineItem,
    products::Product,
};

pub mod carts;
pub mod catalog;
pub mod products;
pub mod rules;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,

    /// No cart items loaded
    #[error("No items loaded; cannot evaluate an empty cart")]
    NoItems,
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Product key -> product
    products: FxHashMap<String, Product>,

    /// Cart line items, in cart order
    items: Vec<CartLineItem>,

    /// Rules with their coupon codes, in evaluation order
    rules: Vec<CouponRule>,

    /// Catalog price rules
    catalog_rules: Vec<CatalogRule>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,

    /// Bypass flag given to rules that leave it unset
    bypass_default: bool,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            products: FxHashMap::default(),
            items: Vec::new(),
            rules: Vec::new(),
            catalog_rules: Vec::new(),
            currency: None,
            bypass_default: false,
        }
    }

    /// Set the bypass flag given to rules loaded afterwards that leave it unset
    pub fn set_bypass_default(&mut self, bypass_default: bool) -> &mut Self {
        self.bypass_default = bypass_default;
        self
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if there are currency mismatches.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("products").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: ProductsFixture = serde_norway::from_str(&contents)?;

        for (key, product_fixture) in fixture.products {
            let (product, currency) = product_fixture.into_product(&key)?;

            if let Some(existing_currency) = self.currency {
                if existing_currency != currency {
                    return Err(FixtureError::CurrencyMismatch(
                        existing_currency.iso_alpha_code.to_string(),
                        currency.iso_alpha_code.to_string(),
                    ));
                }
            } else {
                self.currency = Some(currency);
            }

            self.products.insert(key, product);
        }

        Ok(self)
    }

    /// Load cart line items from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if referenced products don't exist.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("carts").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: CartFixture = serde_norway::from_str(&contents)?;

        for line in fixture.items {
            let mut item = CartLineItem::new(self.product(&line.product)?.clone(), line.qty);

            for child_key in &line.children {
                let child = CartLineItem::new(self.product(child_key)?.clone(), line.qty);

                item = item.with_child(child);
            }

            self.items.push(item);
        }

        Ok(self)
    }

    /// Load cart price rules from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_rules(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("rules").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: RulesFixture = serde_norway::from_str(&contents)?;

        self.rules.extend(
            fixture
                .rules
                .iter()
                .map(|rule| CouponRule::from_fixture(rule, self.bypass_default)),
        );

        Ok(self)
    }

    /// Load catalog price rules from a YAML fixture file, if one exists
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_catalog(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("catalog").join(format!("{name}.yml"));

        if !file_path.exists() {
            return Ok(self);
        }

        let contents = fs::read_to_string(&file_path)?;
        let fixture: CatalogFixture = serde_norway::from_str(&contents)?;

        self.catalog_rules.extend(fixture.catalog_rules);

        Ok(self)
    }

    /// Load a complete fixture set (products, cart, rules and catalog rules with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in("./fixtures", name)
    }

    /// Load a complete fixture set from a custom base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set_in(base_path: impl Into<PathBuf>, name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::with_base_path(base_path);

        fixture.load_set(name)?;

        Ok(fixture)
    }

    /// Load every file of a fixture set into this fixture
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn load_set(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        self.load_products(name)?
            .load_cart(name)?
            .load_rules(name)?
            .load_catalog(name)
    }

    /// Get a product by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&Product, FixtureError> {
        self.products
            .get(key)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Cart line items, cloned so each evaluation starts undiscounted
    ///
    /// # Errors
    ///
    /// Returns an error if no items are loaded.
    pub fn cart(&self) -> Result<Vec<CartLineItem>, FixtureError> {
        if self.items.is_empty() {
            return Err(FixtureError::NoItems);
        }

        Ok(self.items.clone())
    }

    /// Get all cart items
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Get all rules
    pub fn rules(&self) -> &[CouponRule] {
        &self.rules
    }

    /// Build a catalog rule index from the loaded catalog rules
    pub fn catalog_index(&self) -> CatalogRuleIndex {
        CatalogRuleIndex::new(self.catalog_rules.clone())
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
