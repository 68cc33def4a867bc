//! Edit command - replay an edit script through an undoable session

use super::assess::{print_snapshot, print_warnings};
use super::{format_lkr, InputArgs};
use crate::core::{
    ingest, parse_amount, AggregateSnapshot, Category, EditSession, EngineError, EntryId,
    EntryKind, RawRecord,
};
use anyhow::Context;
use clap::Args;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct EditCommand {
    #[command(flatten)]
    input: InputArgs,

    /// JSON edit script to apply in order
    #[arg(short, long)]
    script: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// Edit script file format
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EditScript {
    pub edits: Vec<EditIntent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditIntent {
    Add {
        category: String,
        #[serde(default)]
        kind: EntryKind,
        record: RawRecord,
    },
    UpdateAmount {
        id: EntryId,
        /// Number or numeric string; validated when applied
        amount: serde_json::Value,
    },
    Rename {
        id: EntryId,
        description: String,
    },
    Delete {
        id: EntryId,
    },
    Undo,
    Redo,
}

/// Outcome of one scripted edit
#[derive(Debug, Serialize)]
struct StepResult {
    step: usize,
    op: EditIntent,
    applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    balance_payable: String,
}

#[derive(Serialize)]
struct EditOutput<'a> {
    steps: Vec<StepResult>,
    history_depth: usize,
    cursor: usize,
    fingerprint: String,
    result: &'a AggregateSnapshot,
}

impl EditCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let input = self.input.read_input()?;
        let table = self.input.rate_table()?;
        let year = self.input.tax_year(&table)?;
        let script = read_script(&self.script)?;

        let ingest = ingest(&input)?;
        let mut session = EditSession::new(ingest.entries, year, &table)?;

        let mut steps = Vec::new();
        for (index, intent) in script.edits.into_iter().enumerate() {
            let outcome = apply(&mut session, &intent);
            if let Err(err) = &outcome {
                log::warn!("Edit {} rejected: {}", index + 1, err);
            }
            steps.push(StepResult {
                step: index + 1,
                op: intent,
                applied: matches!(outcome, Ok(true)),
                error: outcome.err().map(|e| e.to_string()),
                balance_payable: format!("{:.2}", session.current().balance_payable),
            });
        }

        if self.json {
            let output = EditOutput {
                steps,
                history_depth: session.history().depth(),
                cursor: session.history().cursor(),
                fingerprint: session.current().fingerprint()?,
                result: session.current(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_steps(&steps);
            print_snapshot(session.current());
            print_warnings(ingest.warnings.iter().chain(&session.current().warnings));
        }
        Ok(())
    }
}

fn read_script(path: &Path) -> anyhow::Result<EditScript> {
    let file =
        File::open(path).with_context(|| format!("failed to open script {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse script {}", path.display()))
}

/// Apply one intent. `Ok(false)` is an undo/redo with nowhere to go.
fn apply(session: &mut EditSession, intent: &EditIntent) -> anyhow::Result<bool> {
    match intent {
        EditIntent::Add {
            category,
            kind,
            record,
        } => {
            let category = Category::from_hint(category)
                .with_context(|| format!("unknown category '{}'", category))?;
            let (id, snapshot) = session.add_entry(category, *kind, record.clone())?;
            log::info!("Added {} (balance {})", id, format_lkr(snapshot.balance_payable));
        }
        EditIntent::UpdateAmount { id, amount } => {
            let amount = script_amount(amount)?;
            session.update_entry_amount(*id, amount)?;
        }
        EditIntent::Rename { id, description } => {
            session.rename_entry(*id, description)?;
        }
        EditIntent::Delete { id } => {
            session.delete_entry(*id)?;
        }
        EditIntent::Undo => return Ok(session.undo()),
        EditIntent::Redo => return Ok(session.redo()),
    }
    Ok(true)
}

fn script_amount(value: &serde_json::Value) -> Result<Decimal, EngineError> {
    match value {
        serde_json::Value::Number(n) => parse_amount(&n.to_string()),
        serde_json::Value::String(s) => parse_amount(s),
        other => Err(EngineError::InvalidAmount(other.to_string())),
    }
}

fn print_steps(steps: &[StepResult]) {
    println!();
    println!("EDITS");
    for step in steps {
        let op = op_name(&step.op);
        match (&step.error, step.applied) {
            (Some(err), _) => println!("  {}. {} \u{2717} {}", step.step, op, err),
            (None, true) => println!(
                "  {}. {} \u{2713} balance payable {}",
                step.step, op, step.balance_payable
            ),
            (None, false) => println!("  {}. {} (nothing to {})", step.step, op, op),
        }
    }
}

fn op_name(intent: &EditIntent) -> &'static str {
    match intent {
        EditIntent::Add { .. } => "add",
        EditIntent::UpdateAmount { .. } => "update_amount",
        EditIntent::Rename { .. } => "rename",
        EditIntent::Delete { .. } => "delete",
        EditIntent::Undo => "undo",
        EditIntent::Redo => "redo",
    }
}
