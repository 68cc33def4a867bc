//! Classify command - record-level view of how each input line was filed

use super::read_input;
use crate::core::{ingest, Ingest};
use clap::Args;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct ClassifyCommand {
    /// JSON or CSV input file ("-" reads JSON from stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Output as CSV instead of formatted table
    #[arg(long)]
    csv: bool,
}

/// Row for the classification table output
#[derive(Debug, Clone, Tabled, serde::Serialize)]
pub struct ClassifiedRow {
    #[tabled(rename = "#")]
    pub id: usize,

    #[tabled(rename = "Description")]
    pub description: String,

    #[tabled(rename = "Category")]
    pub category: String,

    #[tabled(rename = "Type")]
    pub category_type: String,

    #[tabled(rename = "Kind")]
    pub kind: String,

    #[tabled(rename = "Amount")]
    pub amount: String,

    #[tabled(rename = "Rule")]
    pub rule: String,
}

impl ClassifyCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let input = read_input(&self.input)?;
        let ingest = ingest(&input)?;
        let rows = build_rows(&ingest);

        if self.csv {
            self.write_csv(&rows)
        } else {
            self.print_table(&rows);
            Ok(())
        }
    }

    fn print_table(&self, rows: &[ClassifiedRow]) {
        if rows.is_empty() {
            println!("No records found");
            return;
        }

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
    }

    fn write_csv(&self, rows: &[ClassifiedRow]) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(io::stdout());
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn build_rows(ingest: &Ingest) -> Vec<ClassifiedRow> {
    ingest
        .entries
        .iter()
        .zip(&ingest.classified)
        .map(|(entry, classified)| ClassifiedRow {
            id: entry.id.0,
            description: entry.description.clone(),
            category: entry.category.label().to_string(),
            category_type: entry.category_type.label().to_string(),
            kind: format!("{:?}", entry.kind),
            amount: format!("{:.2}", entry.amount),
            rule: classified.matched.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RawRecord, TaxInput};
    use rust_decimal_macros::dec;

    #[test]
    fn rows_report_rule_and_input_order() {
        let input = TaxInput {
            records: vec![
                RawRecord::new("Capital gain on shares", dec!(50000))
                    .with_category("Business Income"),
                RawRecord::new("Bank interest", dec!(1200.5)),
            ],
            documents: Vec::new(),
        };
        let rows = build_rows(&ingest(&input).unwrap());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, "Investment Income");
        assert_eq!(rows[0].category_type, "Capital Gains");
        assert_eq!(rows[0].rule, "capital-gains override");
        assert_eq!(rows[1].rule, "keyword:investment.interest");
        assert_eq!(rows[1].amount, "1200.50");
    }
}
