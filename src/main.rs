use clap::{Parser, Subcommand};
use taxlk::cmd::{
    assess::AssessCommand, classify::ClassifyCommand, edit::EditCommand, schema::SchemaCommand,
    validate::ValidateCommand,
};

#[derive(Parser, Debug)]
#[command(
    name = "taxlk",
    version,
    about = "Sri Lankan Personal Income Tax assessment"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute assessable income, reliefs, liability and balance payable
    Assess(AssessCommand),
    /// Show how each input record is classified
    Classify(ClassifyCommand),
    /// Replay an edit script with undo/redo and show the result
    Edit(EditCommand),
    /// Report data quality issues (exit status 1 if any)
    Validate(ValidateCommand),
    /// Print input formats
    Schema(SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Assess(cmd) => cmd.exec(),
        Command::Classify(cmd) => cmd.exec(),
        Command::Edit(cmd) => cmd.exec(),
        Command::Validate(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
