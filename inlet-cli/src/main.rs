//! Inlet CLI - bank statement import in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{detect, import, preview, profiles};

/// Inlet - parse and reconcile bank statements
#[derive(Parser)]
#[command(name = "inlet", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect a file: type, encoding, validation, claiming parser
    Detect {
        /// Path to the statement file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a statement and show the extracted transactions
    Preview {
        /// Path to the statement file
        file: PathBuf,
        /// Bank profile key (e.g. tatra)
        #[arg(long)]
        bank: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the full import workflow: upload, preview, confirm
    Import {
        /// Path to the statement file
        file: PathBuf,
        /// Bank profile key (e.g. tatra)
        #[arg(long)]
        bank: Option<String>,
        /// Duplicate policy: skip, flag or keep
        #[arg(long, default_value = "skip")]
        policy: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage bank profiles
    Profiles {
        #[command(subcommand)]
        command: profiles::ProfileCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Detect { file, json } => detect::run(&file, json),
        Commands::Preview { file, bank, json } => preview::run(&file, bank.as_deref(), json),
        Commands::Import {
            file,
            bank,
            policy,
            json,
        } => import::run(&file, bank.as_deref(), &policy, json),
        Commands::Profiles { command } => profiles::run(command),
    }
}
