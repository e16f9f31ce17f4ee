//! Profiles command - list, inspect and bootstrap bank profiles

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use crate::commands::get_context;
use crate::output;

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List known bank profile keys
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one profile document
    Show {
        /// Bank profile key (e.g. tatra)
        key: String,
    },

    /// Suggest a column mapping for a CSV header row
    Suggest {
        /// Path to the CSV file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: ProfileCommands) -> Result<()> {
    let ctx = get_context(None)?;

    match command {
        ProfileCommands::List { json } => {
            let keys = ctx.profile_store.list_profiles()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&keys)?);
            } else if keys.is_empty() {
                println!("No profiles found.");
            } else {
                println!("Known bank profiles:");
                for key in keys {
                    println!("  {}", key.green());
                }
            }
        }

        ProfileCommands::Show { key } => match ctx.profile_store.load_profile(&key)? {
            Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
            None => anyhow::bail!("no profile saved under '{key}'"),
        },

        ProfileCommands::Suggest { file, json } => {
            let content = std::fs::read_to_string(&file)?;
            let header_line = content
                .lines()
                .find(|l| !l.trim().is_empty())
                .unwrap_or_default();
            let columns: Vec<String> = header_line
                .split([',', ';', '\t'])
                .map(|c| c.trim().trim_matches('"').to_string())
                .collect();

            let mapping = ctx.profile_store.suggest_field_mapping(&columns);
            if json {
                println!("{}", serde_json::to_string_pretty(&mapping)?);
            } else if mapping.is_empty() {
                output::warning("No columns recognized.");
            } else {
                output::info("Suggested field mapping:");
                let mut fields: Vec<_> = mapping.iter().collect();
                fields.sort();
                for (field, column) in fields {
                    println!("  {field:12} -> {column}");
                }
            }
        }
    }
    Ok(())
}
