//! Assess command - classify, aggregate and compute liability for one year

use super::{format_lkr, format_pct, InputArgs};
use crate::core::{assess, ingest, AggregateSnapshot, CreditKind, Warning};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct AssessCommand {
    #[command(flatten)]
    input: InputArgs,

    /// Output as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

/// JSON output: the snapshot plus its fingerprint and input warnings
#[derive(Serialize)]
pub(crate) struct AssessmentOutput<'a> {
    pub fingerprint: String,
    #[serde(flatten)]
    pub snapshot: &'a AggregateSnapshot,
    pub input_warnings: &'a [Warning],
}

impl AssessCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let input = self.input.read_input()?;
        let table = self.input.rate_table()?;
        let year = self.input.tax_year(&table)?;

        let ingest = ingest(&input)?;
        let snapshot = assess(ingest.entries, year, &table)?;

        if self.json {
            let output = AssessmentOutput {
                fingerprint: snapshot.fingerprint()?,
                snapshot: &snapshot,
                input_warnings: &ingest.warnings,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_snapshot(&snapshot);
            print_warnings(ingest.warnings.iter().chain(&snapshot.warnings));
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "#")]
    id: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Type")]
    category_type: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Source")]
    source: String,
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "Item")]
    label: String,
    #[tabled(rename = "Rs.")]
    amount: String,
}

#[derive(Tabled)]
struct SliceRow {
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Tax")]
    tax: String,
}

fn line(label: &str, amount: Decimal) -> LineRow {
    LineRow {
        label: label.to_string(),
        amount: format!("{:.2}", amount),
    }
}

fn print_table<T: Tabled>(rows: &[T]) {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
}

/// Print a snapshot as tables: entries, income and relief, brackets, credits
pub(crate) fn print_snapshot(snapshot: &AggregateSnapshot) {
    println!();
    println!("TAX ASSESSMENT ({})", snapshot.tax_year);
    println!();

    let entries: Vec<EntryRow> = snapshot
        .summaries
        .visible()
        .flat_map(|s| s.entries.iter().chain(s.deductions.iter()))
        .map(|e| EntryRow {
            id: e.id.0.to_string(),
            category: e.category.label().to_string(),
            category_type: e.category_type.label().to_string(),
            description: e.description.clone(),
            amount: format!("{:.2}", e.amount),
            source: if e.provenance.is_extracted() {
                "Extracted".to_string()
            } else {
                "Manual".to_string()
            },
        })
        .collect();
    if entries.is_empty() {
        println!("No entries");
    } else {
        print_table(&entries);
    }
    println!();

    let mut lines: Vec<LineRow> = snapshot
        .summaries
        .visible()
        .filter(|s| !s.category.is_relief())
        .map(|s| line(s.category.label(), s.subtotal()))
        .collect();
    lines.push(line("Gross income", snapshot.gross_income));
    lines.push(line("Qualifying payments", snapshot.qualifying_payments));
    lines.push(line("Assessable income", snapshot.assessable_income));
    if let Some(amount) = snapshot.reliefs.personal_relief {
        lines.push(line("Personal relief", amount));
    }
    if let Some(amount) = snapshot.reliefs.rental_relief {
        lines.push(line("Rental relief", amount));
    }
    lines.push(line("Taxable income", snapshot.taxable_income));
    println!("INCOME AND RELIEF");
    print_table(&lines);
    println!();

    if !snapshot.bracket_breakdown.is_empty() {
        let slices: Vec<SliceRow> = snapshot
            .bracket_breakdown
            .iter()
            .map(|s| SliceRow {
                from: format!("{:.2}", s.from),
                to: format!("{:.2}", s.to),
                rate: format_pct(s.rate),
                tax: format!("{:.2}", s.tax),
            })
            .collect();
        println!("TAX BRACKETS");
        print_table(&slices);
        println!();
    }

    let credits: Vec<LineRow> = [
        CreditKind::Apit,
        CreditKind::Ait,
        CreditKind::PaidTax,
        CreditKind::Wht,
    ]
    .into_iter()
    .filter(|kind| !snapshot.tax_credits.get(*kind).is_zero())
    .map(|kind| line(kind.label(), snapshot.tax_credits.get(kind)))
    .collect();
    if !credits.is_empty() {
        println!("TAX CREDITS");
        print_table(&credits);
        println!();
    }

    println!(
        "TAX LIABILITY: {} (effective rate {})",
        format_lkr(snapshot.tax_liability),
        format_pct(snapshot.effective_rate)
    );
    println!("TAX CREDITS: {}", format_lkr(snapshot.total_tax_credits));
    println!("BALANCE PAYABLE: {}", format_lkr(snapshot.balance_payable));
    println!();
}

pub(crate) fn print_warnings<'a>(warnings: impl Iterator<Item = &'a Warning>) {
    for warning in warnings {
        println!("\u{26A0} [{}] {}", warning.name(), warning.message());
    }
}
