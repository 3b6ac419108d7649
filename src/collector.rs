//! Result Collector
//!
//! Per-coupon, per-product record of exclusion and bypass decisions made
//! during one discount evaluation cycle. The first record for a
//! `(coupon, product)` pair wins; later ones are ignored.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    bypass::{BypassKind, BypassResult},
    products::ProductId,
    rules::{Rule, SimpleAction},
};

/// An item blocked because it is already discounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRecord {
    /// Product name
    pub name: String,

    /// Why the item was blocked
    pub reason: String,
}

/// Figures used to phrase a bypass message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageParams {
    /// Rule action
    pub simple_action: SimpleAction,

    /// Rule discount as a percentage of the regular price
    pub rule_discount_percent: Decimal,

    /// Existing discount as a percentage of the regular price
    pub existing_discount_percent: Decimal,

    /// Percentage points granted on top of the existing discount
    pub additional_discount_percent: Decimal,

    /// Rule discount per unit, from the regular price
    pub rule_discount_amount: Decimal,

    /// Existing discount per unit
    pub existing_discount_amount: Decimal,

    /// Additional discount granted per unit
    pub additional_discount_amount: Decimal,
}

impl MessageParams {
    /// Collect message figures from a rule and its bypass result.
    pub fn from_bypass(rule: &Rule, result: &BypassResult) -> Self {
        Self {
            simple_action: rule.simple_action.clone(),
            rule_discount_percent: result.rule_discount_percent,
            existing_discount_percent: result.existing_discount_percent,
            additional_discount_percent: result.rule_discount_percent
                - result.existing_discount_percent,
            rule_discount_amount: result.rule_discount_from_regular,
            existing_discount_amount: result.existing_discount_amount,
            additional_discount_amount: result.additional_discount,
        }
    }
}

/// An item handled by a bypass-enabled rule.
#[derive(Debug, Clone, PartialEq)]
pub struct BypassRecord {
    /// Product name
    pub name: String,

    /// Bypass outcome
    pub kind: BypassKind,

    /// Message figures
    pub params: MessageParams,
}

/// Insertion-ordered records for one coupon, keyed by product.
#[derive(Debug, Clone)]
struct CouponRecords<R> {
    records: Vec<(ProductId, R)>,
    index: FxHashMap<ProductId, usize>,
}

impl<R> Default for CouponRecords<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<R> CouponRecords<R> {
    /// Insert unless the product is already recorded. Returns whether it was inserted.
    fn insert_first(&mut self, product: ProductId, record: R) -> bool {
        if self.index.contains_key(&product) {
            return false;
        }

        self.index.insert(product, self.records.len());
        self.records.push((product, record));

        true
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Records exclusion and bypass outcomes for one evaluation cycle.
///
/// Scope one collector per cycle (per request); it never expires on its own
/// and must be cleared explicitly.
#[derive(Debug, Clone, Default)]
pub struct ResultCollector {
    excluded: FxHashMap<String, CouponRecords<ExclusionRecord>>,
    bypassed: FxHashMap<String, CouponRecords<BypassRecord>>,
    coupon_codes: Vec<String>,
}

impl ResultCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an excluded product. A product already recorded for the coupon is ignored.
    pub fn add_excluded(
        &mut self,
        product: ProductId,
        name: impl Into<String>,
        reason: impl Into<String>,
        coupon_code: &str,
    ) {
        let name = name.into();
        let reason = reason.into();

        let records = self.excluded.entry(coupon_code.to_string()).or_default();

        let inserted = records.insert_first(
            product,
            ExclusionRecord {
                name: name.clone(),
                reason: reason.clone(),
            },
        );

        if !inserted {
            return;
        }

        debug!(
            product_id = %product,
            product_name = %name,
            reason = %reason,
            coupon_code,
            total_excluded = records.len(),
            "collector added excluded item"
        );

        self.remember_coupon(coupon_code);
    }

    /// Record a bypassed product. A product already recorded for the coupon is ignored.
    pub fn add_bypassed(
        &mut self,
        product: ProductId,
        name: impl Into<String>,
        kind: BypassKind,
        params: MessageParams,
        coupon_code: &str,
    ) {
        let name = name.into();

        let records = self.bypassed.entry(coupon_code.to_string()).or_default();

        let inserted = records.insert_first(
            product,
            BypassRecord {
                name: name.clone(),
                kind,
                params,
            },
        );

        if !inserted {
            return;
        }

        debug!(
            product_id = %product,
            product_name = %name,
            kind = %kind,
            coupon_code,
            total_bypassed = records.len(),
            "collector added bypassed item"
        );

        self.remember_coupon(coupon_code);
    }

    /// Whether any product was excluded for the coupon.
    pub fn has_excluded(&self, coupon_code: &str) -> bool {
        self.excluded
            .get(coupon_code)
            .is_some_and(|records| !records.is_empty())
    }

    /// Whether any product was bypassed for the coupon.
    pub fn has_bypassed(&self, coupon_code: &str) -> bool {
        self.bypassed
            .get(coupon_code)
            .is_some_and(|records| !records.is_empty())
    }

    /// Whether any product was excluded for any coupon.
    pub fn has_any_excluded(&self) -> bool {
        self.excluded.values().any(|records| !records.is_empty())
    }

    /// Whether any product was bypassed for any coupon.
    pub fn has_any_bypassed(&self) -> bool {
        self.bypassed.values().any(|records| !records.is_empty())
    }

    /// Excluded products for the coupon, in the order they were recorded.
    pub fn excluded(&self, coupon_code: &str) -> &[(ProductId, ExclusionRecord)] {
        self.excluded
            .get(coupon_code)
            .map_or(&[], |records| records.records.as_slice())
    }

    /// Bypassed products for the coupon, in the order they were recorded.
    pub fn bypassed(&self, coupon_code: &str) -> &[(ProductId, BypassRecord)] {
        self.bypassed
            .get(coupon_code)
            .map_or(&[], |records| records.records.as_slice())
    }

    /// Coupon codes with at least one record, in first-seen order.
    pub fn coupon_codes(&self) -> &[String] {
        &self.coupon_codes
    }

    /// Drop every record for every coupon.
    pub fn clear(&mut self) {
        debug!(
            had_excluded = self.has_any_excluded(),
            had_bypassed = self.has_any_bypassed(),
            "collector clearing all results"
        );

        self.excluded.clear();
        self.bypassed.clear();
        self.coupon_codes.clear();
    }

    fn remember_coupon(&mut self, coupon_code: &str) {
        if !self.coupon_codes.iter().any(|code| code == coupon_code) {
            self.coupon_codes.push(coupon_code.to_string());
        }
    }
}
