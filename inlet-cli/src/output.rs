//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use inlet_core::ParseResult;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Render extracted transactions plus any per-line warnings
pub fn print_parse_result(result: &ParseResult, limit: usize) {
    let mut table = create_table();
    table.set_header(vec!["Date", "Amount", "Description", "Merchant", "Category"]);

    for tx in result.transactions.iter().take(limit) {
        table.add_row(vec![
            tx.date.to_string(),
            tx.amount.to_string(),
            tx.description.clone(),
            tx.merchant.clone().unwrap_or_else(|| "-".to_string()),
            tx.category.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");

    if result.transactions.len() > limit {
        println!("... and {} more", result.transactions.len() - limit);
    }

    for warn in &result.warnings {
        warning(&format!("warning: {warn}"));
    }
    for error in &result.errors {
        eprintln!("{}", format!("error: {error}").red());
    }
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
