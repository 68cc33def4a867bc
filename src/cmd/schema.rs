//! Schema command - print expected input formats

use super::edit::EditScript;
use crate::core::{RateTableInput, TaxInput};
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the input format
    JsonSchema,
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
    /// JSON Schema for a rate-table file (--rates)
    Rates,
    /// JSON Schema for an edit script (edit --script)
    EditScript,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => {
                println!("{}", serde_json::to_string_pretty(&schema_for!(TaxInput))?)
            }
            SchemaFormat::CsvHeader => println!("{}", CSV_COLUMNS.join(",")),
            SchemaFormat::CsvFields => print_csv_fields(),
            SchemaFormat::Rates => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&schema_for!(RateTableInput))?
                )
            }
            SchemaFormat::EditScript => {
                println!("{}", serde_json::to_string_pretty(&schema_for!(EditScript))?)
            }
        }
        Ok(())
    }
}

fn print_csv_fields() {
    println!("CSV Input Format");
    println!("================");
    println!();
    for (name, required, description) in CSV_FIELD_DESCRIPTIONS {
        let req = if *required { "required" } else { "optional" };
        println!("{:12} ({:8})  {}", name, req, description);
    }
    println!();
    println!("Amounts may be plain numbers or formatted, e.g. \"1,250,000.00\"");
}

const CSV_COLUMNS: &[&str] = &["description", "category", "type", "amount", "kind"];

const CSV_FIELD_DESCRIPTIONS: &[(&str, bool, &str)] = &[
    ("description", true, "Free-text description of the line item"),
    (
        "category",
        false,
        "Category hint, e.g. Employment Income, Business Income, Investment Income, \
         Other Income, Qualifying Payments & Relief, Terminal Benefits",
    ),
    (
        "type",
        false,
        "Type hint naming a leaf, e.g. Rental Income, APIT Deduction, Donations",
    ),
    ("amount", true, "Non-negative amount in rupees"),
    ("kind", false, "Income or Deduction (default Income)"),
];
