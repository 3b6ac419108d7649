//! Eligibility Guards
//!
//! Hard preconditions deciding whether exclusion logic applies to an
//! item/rule pair at all. Guards are combined with AND in list order.

use std::fmt;

use rust_decimal::Decimal;
use smallvec::{SmallVec, smallvec};

use crate::{
    items::CartLineItem,
    products::Product,
    rules::{CouponRequirement, Rule},
};

/// A precondition for running exclusion strategies.
pub trait EligibilityGuard: fmt::Debug {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Whether exclusion logic may run for this product, item and rule.
    fn can_process(&self, product: &Product, item: &CartLineItem, rule: &Rule) -> bool;

    /// Whether the guard also gates "already discounted?" detection on the
    /// bypass path. Guards that only concern the standard path return `false`.
    fn applies_to_bypass_path(&self) -> bool {
        true
    }
}

/// Free and gift items (final price of zero) are exempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroPriceGuard;

impl EligibilityGuard for ZeroPriceGuard {
    fn name(&self) -> &str {
        "zero_price"
    }

    fn can_process(&self, product: &Product, _item: &CartLineItem, _rule: &Rule) -> bool {
        product.final_price > Decimal::ZERO
    }
}

/// Automatic, coupon-less rules are never subject to exclusion.
#[derive(Debug, Clone, Copy, Default)]
pub struct CouponRequiredGuard;

impl EligibilityGuard for CouponRequiredGuard {
    fn name(&self) -> &str {
        "coupon_required"
    }

    fn can_process(&self, _product: &Product, _item: &CartLineItem, rule: &Rule) -> bool {
        rule.coupon_requirement != CouponRequirement::None
    }
}

/// Bypass-enabled rules skip standard exclusion in favour of the bypass path.
#[derive(Debug, Clone, Copy, Default)]
pub struct BypassFlagGuard;

impl EligibilityGuard for BypassFlagGuard {
    fn name(&self) -> &str {
        "bypass_flag"
    }

    fn can_process(&self, _product: &Product, _item: &CartLineItem, rule: &Rule) -> bool {
        !rule.bypass_enabled
    }

    fn applies_to_bypass_path(&self) -> bool {
        false
    }
}

/// Rules whose action belongs to a free-gift family are never blocked.
///
/// An action matches when its code contains any of the configured fragments.
#[derive(Debug, Clone)]
pub struct ActionFamilyGuard {
    fragments: SmallVec<[String; 2]>,
}

impl ActionFamilyGuard {
    /// Guard against actions whose code contains any of `fragments`.
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments
                .into_iter()
                .map(Into::into)
                .filter(|fragment: &String| !fragment.is_empty())
                .collect(),
        }
    }

    /// Free-gift actions of the common promo-gift extension (`ampromo_*`).
    pub fn free_gift() -> Self {
        Self {
            fragments: smallvec!["ampromo".to_string()],
        }
    }
}

impl Default for ActionFamilyGuard {
    fn default() -> Self {
        Self::free_gift()
    }
}

impl EligibilityGuard for ActionFamilyGuard {
    fn name(&self) -> &str {
        "action_family"
    }

    fn can_process(&self, _product: &Product, _item: &CartLineItem, rule: &Rule) -> bool {
        let code = rule.simple_action.code();

        !self
            .fragments
            .iter()
            .any(|fragment| code.contains(fragment.as_str()))
    }
}

/// The standard guard list, in evaluation order.
pub fn default_guards() -> Vec<Box<dyn EligibilityGuard>> {
    vec![
        Box::new(ZeroPriceGuard),
        Box::new(CouponRequiredGuard),
        Box::new(BypassFlagGuard),
        Box::new(ActionFamilyGuard::free_gift()),
    ]
}
