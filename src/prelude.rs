//! Discount Exclusion prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    bypass::{BypassKind, BypassResult, EPSILON, calculate, cap_discount},
    catalog::{
        CatalogLookupError, CatalogRule, CatalogRuleIndex, CatalogRuleLookup, Clock,
        CustomerGroupId, FixedClock, RuleRef, ShopperScope, SystemClock, WebsiteId,
    },
    collector::{BypassRecord, ExclusionRecord, MessageParams, ResultCollector},
    config::{Config, ConfigError, StoreId, StoreOverrides},
    cycle::{CycleSummary, EvaluationCycle},
    engine::{BypassVerdict, DecisionEngine, EvaluationContext, Outcome, SkipReason},
    guards::{
        ActionFamilyGuard, BypassFlagGuard, CouponRequiredGuard, EligibilityGuard, ZeroPriceGuard,
        default_guards,
    },
    items::CartLineItem,
    messages::{Message, MessageComposer, MessageKind, MoneyFormatter, PriceFormatter},
    products::{Product, ProductId},
    report::{DecisionReport, DecisionRow, ReportError},
    rules::{CouponRequirement, ParseRuleError, Rule, RuleId, SimpleAction},
    strategies::{CatalogRuleStrategy, ExclusionStrategy, SpecialPriceStrategy},
    sync::{RuleStore, RuleStoreError, SyncReport, YamlRuleStore, sync_bypass_default},
};
