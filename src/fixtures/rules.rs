//! Rule Fixtures

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rules::{CouponRequirement, Rule, SimpleAction};

/// Wrapper for cart price rules in YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesFixture {
    /// Rules, in evaluation order
    pub rules: Vec<RuleFixture>,
}

/// Rule Fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFixture {
    /// Rule id
    pub id: u64,

    /// Rule name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Discount action code (e.g., `by_percent`)
    pub simple_action: SimpleAction,

    /// Percentage or amount
    pub discount_amount: Decimal,

    /// Coupon requirement; defaults to a specific coupon
    #[serde(default = "specific_coupon")]
    pub coupon_requirement: CouponRequirement,

    /// Coupon code the rule is applied with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,

    /// Bypass flag; unset rules take the configured default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass: Option<bool>,
}

fn specific_coupon() -> CouponRequirement {
    CouponRequirement::Specific
}

impl RuleFixture {
    /// Stored bypass flag; unset counts as disabled
    pub fn bypass_enabled(&self) -> bool {
        self.bypass_or(false)
    }

    /// Bypass flag, falling back to `default` when unset
    pub fn bypass_or(&self, default: bool) -> bool {
        self.bypass.unwrap_or(default)
    }

    /// Convert to a [`Rule`], resolving an unset bypass flag to `bypass_default`
    pub fn to_rule(&self, bypass_default: bool) -> Rule {
        let rule = Rule::new(self.id, self.simple_action.clone(), self.discount_amount)
            .with_coupon_requirement(self.coupon_requirement)
            .with_bypass(self.bypass_or(bypass_default));

        match &self.name {
            Some(name) => rule.with_name(name.as_str()),
            None => rule,
        }
    }
}

/// A rule together with the coupon code it is applied with.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponRule {
    /// The rule
    pub rule: Rule,

    /// Coupon code, if the rule is applied with one
    pub coupon_code: Option<String>,
}

impl CouponRule {
    /// Build from a fixture, resolving an unset bypass flag to `bypass_default`.
    pub fn from_fixture(fixture: &RuleFixture, bypass_default: bool) -> Self {
        Self {
            rule: fixture.to_rule(bypass_default),
            coupon_code: fixture.coupon_code.clone(),
        }
    }
}
