//! Catalog Rule Fixtures

use serde::Deserialize;

use crate::catalog::CatalogRule;

/// Wrapper for catalog price rules in YAML
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Catalog rules
    #[serde(default)]
    pub catalog_rules: Vec<CatalogRule>,
}
