pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "tenderflow",
    about = "Tenderflow operator CLI",
    long_about = "Apply migrations, load reference data, and inspect the runtime configuration of a tenderflow deployment.",
    after_help = "Examples:\n  tenderflow migrate\n  tenderflow seed\n  tenderflow doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations")]
    Migrate,
    #[command(about = "Load the demo organizations and employees, then verify them")]
    Seed,
    #[command(about = "Show effective configuration values with source attribution")]
    Config,
    #[command(about = "Check configuration, database connectivity, and schema state")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
