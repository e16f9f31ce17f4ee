//! Import command - run the full upload/preview/confirm workflow

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use inlet_core::ImportPolicy;

use crate::commands::{cli_user, get_context, BarNotifier};
use crate::output;

pub fn run(file: &Path, bank: Option<&str>, policy: &str, json: bool) -> Result<()> {
    let policy: ImportPolicy = policy
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let notifier = Arc::new(BarNotifier::new());
    let ctx = get_context(if json {
        None
    } else {
        Some(notifier.clone())
    })?;
    let user = cli_user();

    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {file:?}"))?;
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("statement");

    let record = ctx.import_service.upload(user, &bytes, filename, bank)?;
    if !record.validation_errors.is_empty() {
        notifier.finish();
        for error in &record.validation_errors {
            eprintln!("{}", error.red());
        }
        anyhow::bail!("upload validation failed");
    }

    let preview = ctx.import_service.preview(user, record.id)?;
    let result = ctx
        .import_service
        .confirm(user, record.id, policy, None)?;
    notifier.finish();

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.success {
        output::success("Import complete");
    } else {
        output::warning("Import failed");
        for error in &result.errors {
            eprintln!("{}", error.red());
        }
    }

    println!();
    println!("  Imported:   {}", result.imported_count);
    println!("  Skipped:    {}", result.skipped_count);
    println!("  Duplicates: {}", result.duplicate_count);
    for warn in &preview.warnings {
        output::warning(&format!("  warning: {warn}"));
    }
    println!();
    println!("  Import id:      {}", result.import_id);
    println!("  Rollback token: {}", result.rollback_token);

    Ok(())
}
