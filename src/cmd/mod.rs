pub mod assess;
pub mod classify;
pub mod edit;
pub mod schema;
pub mod validate;

use crate::core::{read_input_json, read_records_csv, RateTable, TaxInput, TaxYear};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Arguments shared by every command that assesses an input file
#[derive(Args, Debug)]
pub struct InputArgs {
    /// JSON or CSV input file ("-" reads JSON from stdin)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Year of assessment, e.g. 2024/2025 (defaults to the current year)
    #[arg(short, long)]
    pub year: Option<String>,

    /// JSON rate table to use instead of the built-in rates
    #[arg(long)]
    pub rates: Option<PathBuf>,
}

impl InputArgs {
    pub fn read_input(&self) -> anyhow::Result<TaxInput> {
        read_input(&self.input)
    }

    pub fn rate_table(&self) -> anyhow::Result<RateTable> {
        match &self.rates {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open rate table {}", path.display()))?;
                RateTable::read_json(BufReader::new(file))
                    .with_context(|| format!("failed to read rate table {}", path.display()))
            }
            None => Ok(RateTable::builtin()),
        }
    }

    /// The requested year, or the year of assessment today falls in. Either
    /// must have rates in `table`.
    pub fn tax_year(&self, table: &RateTable) -> anyhow::Result<TaxYear> {
        self.tax_year_on(table, chrono::Local::now().date_naive())
    }

    fn tax_year_on(&self, table: &RateTable, today: NaiveDate) -> anyhow::Result<TaxYear> {
        let year = match &self.year {
            Some(year) => year.parse::<TaxYear>()?,
            None => TaxYear::from_date(today),
        };
        table.rates(year)?;
        Ok(year)
    }
}

/// Read input records (JSON, CSV by extension, or JSON on stdin with "-")
pub fn read_input(path: &Path) -> anyhow::Result<TaxInput> {
    if path.as_os_str() == "-" {
        return read_from_stdin();
    }
    let file =
        File::open(path).with_context(|| format!("failed to open input {}", path.display()))?;
    let reader = BufReader::new(file);
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let input = if is_csv {
        read_records_csv(reader)
    } else {
        read_input_json(reader)
    };
    input.with_context(|| format!("failed to parse input {}", path.display()))
}

fn read_from_stdin() -> anyhow::Result<TaxInput> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }

    read_input_json(io::Cursor::new(buffer))
}

pub(crate) fn format_lkr(amount: Decimal) -> String {
    format!("Rs. {:.2}", amount)
}

pub(crate) fn format_pct(rate: Decimal) -> String {
    format!("{:.2}%", rate * dec!(100))
}
