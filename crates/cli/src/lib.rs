pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::commands::quote::QuoteArgs;

#[derive(Debug, Parser)]
#[command(
    name = "atelier",
    about = "Bespoke garment configurator with AI-assisted appraisal",
    long_about = "Design a custom garment step by step, then request a price quote, labor estimate, and concept illustration.",
    after_help = "Examples:\n  atelier wizard\n  atelier quote --category dress --fabric-description \"silk charmeuse\"\n  atelier catalog --json\n  atelier doctor"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Walk through the five design steps interactively and submit for appraisal")]
    Wizard,
    #[command(about = "Submit a design non-interactively and print the appraisal")]
    Quote(QuoteArgs),
    #[command(about = "List garment categories, silhouettes, and which details each one takes")]
    Catalog {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and API key readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Wizard => commands::wizard::run(),
        Command::Quote(args) => commands::quote::run(args),
        Command::Catalog { json } => commands::catalog::run(json),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
