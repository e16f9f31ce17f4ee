//! Preview command - parse a statement and show what would be imported

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::commands::{cli_user, get_context};
use crate::output;

pub fn run(file: &Path, bank: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context(None)?;
    let user = cli_user();

    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {file:?}"))?;
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("statement");

    let record = ctx.import_service.upload(user, &bytes, filename, bank)?;
    if !record.validation_errors.is_empty() {
        for error in &record.validation_errors {
            eprintln!("{}", error.red());
        }
        anyhow::bail!("upload validation failed");
    }

    let result = ctx.import_service.preview(user, record.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", "PREVIEW - no changes applied".yellow());
    if let Some(bank_name) = result.metadata.get("bank").and_then(|b| b.as_str()) {
        output::info(&format!("Detected bank: {bank_name}"));
    }
    println!();
    output::print_parse_result(&result, 20);
    println!();
    println!("  Transactions: {}", result.transactions.len());
    println!("  Warnings:     {}", result.warnings.len());

    Ok(())
}
