//! Decision Report
//!
//! Tabular rendering of the decisions made during an evaluation, followed by
//! each coupon's messages.

use std::io;

use rust_decimal::Decimal;
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cycle::CycleSummary,
    engine::{Outcome, SkipReason},
    messages::{MessageKind, PriceFormatter},
};

/// Errors that can occur when writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// IO error
    #[error("Failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// One item/rule decision.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRow {
    /// Item name
    pub item: String,

    /// Rule name
    pub rule: String,

    /// Coupon code the rule was applied with
    pub coupon_code: Option<String>,

    /// Regular unit price of the pricing subject
    pub regular_price: Decimal,

    /// Final unit price of the pricing subject
    pub final_price: Decimal,

    /// Row discount after the rule ran
    pub discount: Decimal,

    /// Decision taken
    pub outcome: Outcome,
}

/// Decisions and messages gathered over an evaluation run.
#[derive(Debug, Clone, Default)]
pub struct DecisionReport {
    rows: Vec<DecisionRow>,
    summaries: Vec<(String, CycleSummary)>,
}

impl DecisionReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a decision row.
    pub fn push(&mut self, row: DecisionRow) {
        self.rows.push(row);
    }

    /// Add a finished cycle's summary for a coupon.
    pub fn push_summary(&mut self, coupon_code: impl Into<String>, summary: CycleSummary) {
        self.summaries.push((coupon_code.into(), summary));
    }

    /// Decision rows, in evaluation order
    pub fn rows(&self) -> &[DecisionRow] {
        &self.rows
    }

    /// Coupon summaries, in evaluation order
    pub fn summaries(&self) -> &[(String, CycleSummary)] {
        &self.summaries
    }

    /// Write the decision table and messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_to(
        &self,
        mut out: impl io::Write,
        formatter: &impl PriceFormatter,
    ) -> Result<(), ReportError> {
        let mut builder = Builder::default();

        builder.push_record([
            "", "Item", "Rule", "Coupon", "Regular", "Final", "Discount", "Decision",
        ]);

        let mut color_ops: SmallVec<[(usize, usize, Color); 32]> = SmallVec::new();

        for (idx, row) in self.rows.iter().enumerate() {
            let table_row = idx + 1;

            builder.push_record([
                format!("#{:<3}", idx + 1),
                row.item.clone(),
                row.rule.clone(),
                row.coupon_code.clone().unwrap_or_default(),
                formatter.format(row.regular_price),
                formatter.format(row.final_price),
                formatter.format(row.discount),
                outcome_label(row.outcome),
            ]);

            color_ops.push((table_row, 4, color_dark_grey()));
            color_ops.push((table_row, 7, outcome_color(row.outcome)));
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(1, separator);

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(4..7), Alignment::right());

        for (row, col, color) in color_ops {
            table.modify((row, col), color);
        }

        writeln!(out, "\n{table}")?;

        for (coupon_code, summary) in &self.summaries {
            write_summary(&mut out, coupon_code, summary)?;
        }

        Ok(())
    }
}

fn write_summary(
    out: &mut impl io::Write,
    coupon_code: &str,
    summary: &CycleSummary,
) -> Result<(), ReportError> {
    if summary.messages.is_empty() && !summary.remove_coupon {
        return Ok(());
    }

    writeln!(out, " \x1b[1m{coupon_code}\x1b[0m")?;

    for message in &summary.messages {
        let (label, color) = match message.kind {
            MessageKind::Warning => ("warning", "\x1b[33m"),
            MessageKind::Notice => ("notice", "\x1b[36m"),
        };

        writeln!(out, "  {color}{label}\x1b[0m {}", message.text)?;
    }

    if summary.remove_coupon {
        writeln!(out, "  \x1b[90mcoupon removed: no discount applied\x1b[0m")?;
    }

    writeln!(out)?;

    Ok(())
}

fn outcome_label(outcome: Outcome) -> String {
    match outcome {
        Outcome::Skipped(SkipReason::ModuleDisabled) => "applied (module disabled)".to_string(),
        Outcome::Skipped(SkipReason::ChildItem) => "applied (child item)".to_string(),
        Outcome::Applied => "applied".to_string(),
        Outcome::Excluded => "excluded".to_string(),
        Outcome::ExistingBetter => "existing better".to_string(),
        Outcome::StackingFallback => "stacked".to_string(),
        Outcome::Adjusted { capped_to: Some(_) } => "adjusted (capped)".to_string(),
        Outcome::Adjusted { capped_to: None } => "adjusted".to_string(),
    }
}

fn outcome_color(outcome: Outcome) -> Color {
    match outcome {
        Outcome::Excluded | Outcome::ExistingBetter => Color::new("\x1b[31m", "\x1b[0m"),
        Outcome::Adjusted { .. } | Outcome::StackingFallback => {
            Color::new("\x1b[33m", "\x1b[0m")
        }
        Outcome::Applied | Outcome::Skipped(_) => Color::new("\x1b[32m", "\x1b[0m"),
    }
}

/// ANSI dark grey (regular price).
fn color_dark_grey() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}
