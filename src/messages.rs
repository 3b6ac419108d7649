//! Messages
//!
//! Turns collected exclusion and bypass records into shopper-facing notices.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::{
    bypass::BypassKind,
    collector::{BypassRecord, MessageParams, ResultCollector},
    rules::SimpleAction,
};

/// Severity of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Coupon (partly) not applied
    Warning,

    /// Coupon applied with an adjustment
    Notice,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Notice => "notice",
        })
    }
}

/// A composed, human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message severity
    #[serde(rename = "type")]
    pub kind: MessageKind,

    /// Message text
    pub text: String,
}

impl Message {
    fn warning(text: String) -> Self {
        Self {
            kind: MessageKind::Warning,
            text,
        }
    }

    fn notice(text: String) -> Self {
        Self {
            kind: MessageKind::Notice,
            text,
        }
    }
}

/// Formats monetary amounts for display.
#[cfg_attr(test, mockall::automock)]
pub trait PriceFormatter {
    /// Render `amount` in the store currency.
    fn format(&self, amount: Decimal) -> String;
}

/// Formats amounts as `rusty_money` values in a fixed currency.
#[derive(Debug, Clone, Copy)]
pub struct MoneyFormatter {
    currency: &'static Currency,
}

impl MoneyFormatter {
    /// Create a formatter for the given currency.
    pub fn new(currency: &'static Currency) -> Self {
        Self { currency }
    }
}

impl PriceFormatter for MoneyFormatter {
    fn format(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp_with_strategy(
            u32::from(self.currency.exponent),
            RoundingStrategy::MidpointAwayFromZero,
        );

        Money::from_decimal(rounded, self.currency).to_string()
    }
}

/// Builds the messages for one coupon from a [`ResultCollector`].
#[derive(Debug, Clone)]
pub struct MessageComposer<F> {
    formatter: F,
    enabled: bool,
}

impl<F: PriceFormatter> MessageComposer<F> {
    /// Create an enabled composer.
    pub fn new(formatter: F) -> Self {
        Self {
            formatter,
            enabled: true,
        }
    }

    /// Enable or disable message output. Decisions are unaffected.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether messages will be produced.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Build the messages for `coupon_code`: exclusion warnings first, then
    /// one message per bypassed product. Stacking fallbacks are silent.
    pub fn build(&self, coupon_code: &str, collector: &ResultCollector) -> Vec<Message> {
        if !self.enabled {
            return Vec::new();
        }

        let mut messages = Vec::new();

        if collector.has_excluded(coupon_code) {
            messages.extend(exclusion_message(coupon_code, collector));
        }

        if collector.has_bypassed(coupon_code) {
            messages.extend(
                collector
                    .bypassed(coupon_code)
                    .iter()
                    .filter_map(|(_, record)| self.bypass_message(coupon_code, record)),
            );
        }

        messages
    }

    fn bypass_message(&self, coupon_code: &str, record: &BypassRecord) -> Option<Message> {
        let BypassRecord { name, kind, params } = record;

        match (kind, &params.simple_action) {
            (BypassKind::Adjusted, SimpleAction::ByPercent) => Some(Message::notice(format!(
                "Coupon \"{coupon_code}\" applied an additional {}% discount to \"{name}\", \
                 adjusted from {}% because it is already {}% discounted.",
                whole_percent(params.additional_discount_percent),
                whole_percent(params.rule_discount_percent),
                whole_percent(params.existing_discount_percent),
            ))),
            (BypassKind::Adjusted, SimpleAction::ByFixed) => Some(Message::notice(format!(
                "Coupon \"{coupon_code}\" applied an additional {} discount to \"{name}\", \
                 adjusted from {} because it is already discounted by {}.",
                self.formatter.format(params.additional_discount_amount),
                self.formatter.format(params.rule_discount_amount),
                self.formatter.format(params.existing_discount_amount),
            ))),
            (BypassKind::ExistingBetter, SimpleAction::ByPercent) => {
                Some(Message::warning(format!(
                    "Coupon \"{coupon_code}\" was not applied to \"{name}\" because the \
                     existing {}% discount already exceeds the coupon's {}% discount.",
                    whole_percent(params.existing_discount_percent),
                    whole_percent(params.rule_discount_percent),
                )))
            }
            (BypassKind::ExistingBetter, SimpleAction::ByFixed) => {
                Some(Message::warning(self.existing_better_fixed(coupon_code, name, params)))
            }
            _ => None,
        }
    }

    fn existing_better_fixed(&self, coupon_code: &str, name: &str, params: &MessageParams) -> String {
        format!(
            "Coupon \"{coupon_code}\" was not applied to \"{name}\" because the existing {} \
             discount already exceeds the coupon's {} discount.",
            self.formatter.format(params.existing_discount_amount),
            self.formatter.format(params.rule_discount_amount),
        )
    }
}

fn exclusion_message(coupon_code: &str, collector: &ResultCollector) -> Option<Message> {
    let names: Vec<&str> = collector
        .excluded(coupon_code)
        .iter()
        .map(|(_, record)| record.name.as_str())
        .collect();

    let text = match names.as_slice() {
        [] => return None,
        [name] => format!(
            "Coupon \"{coupon_code}\" was not applied to \"{name}\" because it is already discounted."
        ),
        names => format!(
            "Coupon \"{coupon_code}\" was not applied to the following products because they are \
             already discounted: {}",
            names.join(", ")
        ),
    };

    Some(Message::warning(text))
}

fn whole_percent(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}
