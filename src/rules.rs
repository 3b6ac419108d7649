//! Cart Rules
//!
//! The subset of a cart price rule the exclusion engine needs to reason about.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors parsing rule enums from host codes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseRuleError {
    /// The action code was empty.
    #[error("empty simple action code")]
    EmptyAction,

    /// The coupon type was not one of the known codes or names.
    #[error("unknown coupon requirement: {0}")]
    UnknownCouponRequirement(String),
}

/// Rule identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub u64);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a rule computes its discount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SimpleAction {
    /// Percentage of the item price
    ByPercent,

    /// Fixed amount off each unit
    ByFixed,

    /// Fixed amount spread over the whole cart
    CartFixed,

    /// Buy X get Y
    BuyXGetY,

    /// Any other action code, e.g. third-party free-gift actions
    Custom(String),
}

impl SimpleAction {
    /// The host action code.
    pub fn code(&self) -> &str {
        match self {
            Self::ByPercent => "by_percent",
            Self::ByFixed => "by_fixed",
            Self::CartFixed => "cart_fixed",
            Self::BuyXGetY => "buy_x_get_y",
            Self::Custom(code) => code,
        }
    }

    /// Whether the action applies per unit, so that a per-unit cap is meaningful.
    pub fn is_per_unit(&self) -> bool {
        matches!(self, Self::ByPercent | Self::ByFixed)
    }
}

impl FromStr for SimpleAction {
    type Err = ParseRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();

        Ok(match code {
            "" => return Err(ParseRuleError::EmptyAction),
            "by_percent" => Self::ByPercent,
            "by_fixed" => Self::ByFixed,
            "cart_fixed" => Self::CartFixed,
            "buy_x_get_y" => Self::BuyXGetY,
            other => Self::Custom(other.to_string()),
        })
    }
}

impl TryFrom<String> for SimpleAction {
    type Error = ParseRuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SimpleAction> for String {
    fn from(action: SimpleAction) -> Self {
        action.code().to_string()
    }
}

impl fmt::Display for SimpleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Whether a rule needs a coupon to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CouponRequirement {
    /// Automatic rule, no coupon
    #[default]
    None,

    /// A specific coupon code
    Specific,

    /// Auto-generated coupon codes
    AutoGenerated,
}

impl CouponRequirement {
    /// The host's numeric coupon type.
    pub fn code(self) -> u8 {
        match self {
            Self::None => 1,
            Self::Specific => 2,
            Self::AutoGenerated => 3,
        }
    }
}

impl FromStr for CouponRequirement {
    type Err = ParseRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "none" | "no_coupon" => Ok(Self::None),
            "2" | "specific" | "specific_coupon" => Ok(Self::Specific),
            "3" | "auto" | "auto_generated" => Ok(Self::AutoGenerated),
            _ => Err(ParseRuleError::UnknownCouponRequirement(s.to_string())),
        }
    }
}

impl TryFrom<String> for CouponRequirement {
    type Error = ParseRuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CouponRequirement> for String {
    fn from(requirement: CouponRequirement) -> Self {
        match requirement {
            CouponRequirement::None => "none",
            CouponRequirement::Specific => "specific",
            CouponRequirement::AutoGenerated => "auto_generated",
        }
        .to_string()
    }
}

/// A cart price rule
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Rule id
    pub id: RuleId,

    /// Rule name
    pub name: String,

    /// Discount action
    pub simple_action: SimpleAction,

    /// Percentage (for `by_percent`) or amount (for fixed actions)
    pub discount_amount: Decimal,

    /// Coupon requirement
    pub coupon_requirement: CouponRequirement,

    /// Apply max(existing, rule) instead of blocking already-discounted items
    pub bypass_enabled: bool,
}

impl Rule {
    /// Create a coupon rule without bypass.
    pub fn new(id: u64, simple_action: SimpleAction, discount_amount: Decimal) -> Self {
        Self {
            id: RuleId(id),
            name: format!("Rule {id}"),
            simple_action,
            discount_amount,
            coupon_requirement: CouponRequirement::Specific,
            bypass_enabled: false,
        }
    }

    /// Set the rule name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the coupon requirement.
    #[must_use]
    pub fn with_coupon_requirement(mut self, requirement: CouponRequirement) -> Self {
        self.coupon_requirement = requirement;
        self
    }

    /// Enable or disable bypass mode.
    #[must_use]
    pub fn with_bypass(mut self, enabled: bool) -> Self {
        self.bypass_enabled = enabled;
        self
    }
}
