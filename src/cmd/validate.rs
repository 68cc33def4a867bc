//! Validate command - surface data quality issues without a full report

use super::InputArgs;
use crate::core::{assess, ingest, TaxYear, Warning};
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    #[command(flatten)]
    input: InputArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// A validation issue for output
#[derive(Debug, Clone, Serialize)]
struct ValidationIssue {
    #[serde(rename = "type")]
    issue_type: String,
    message: String,
    detail: Warning,
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct ValidationOutput {
    tax_year: String,
    issue_count: usize,
    issues: Vec<ValidationIssue>,
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let input = self.input.read_input()?;
        let table = self.input.rate_table()?;
        let tax_year = self.input.tax_year(&table)?;

        let ingest = ingest(&input)?;
        let snapshot = assess(ingest.entries, tax_year, &table)?;

        let issues: Vec<ValidationIssue> = ingest
            .warnings
            .iter()
            .chain(&snapshot.warnings)
            .map(|w| ValidationIssue {
                issue_type: w.name().to_string(),
                message: w.message(),
                detail: w.clone(),
            })
            .collect();

        if self.json {
            self.print_json(&issues, tax_year)?;
        } else {
            self.print_text(&issues, tax_year);
        }

        // Exit with code 1 if issues found
        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }

    fn print_text(&self, issues: &[ValidationIssue], year: TaxYear) {
        println!();
        println!("VALIDATION RESULTS ({})", year);
        println!();

        if issues.is_empty() {
            println!("\u{2713} No issues found.");
        } else {
            println!("\u{26A0} {} issue(s) found:", issues.len());
            println!();

            for (i, issue) in issues.iter().enumerate() {
                println!("  {}. [{}] {}", i + 1, issue.issue_type, issue.message);
            }
            println!();
        }
    }

    fn print_json(&self, issues: &[ValidationIssue], year: TaxYear) -> anyhow::Result<()> {
        let output = ValidationOutput {
            tax_year: year.display(),
            issue_count: issues.len(),
            issues: issues.to_vec(),
        };

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
