//! CLI command implementations

pub mod detect;
pub mod import;
pub mod preview;
pub mod profiles;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use uuid::Uuid;

use inlet_core::adapters::MemoryRepository;
use inlet_core::ports::{ProgressEvent, ProgressNotifier};
use inlet_core::InletContext;

/// Get the inlet data directory from environment or default
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("INLET_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".inlet")
    }
}

/// Build a context over the in-memory repository.
///
/// The CLI demonstrates the workflow in one process; a deployment wires a
/// database-backed repository into the same context.
pub fn get_context(notifier: Option<Arc<dyn ProgressNotifier>>) -> Result<InletContext> {
    let data_dir = get_data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create inlet directory: {data_dir:?}"))?;

    let repository = Arc::new(MemoryRepository::new());
    match notifier {
        Some(notifier) => InletContext::with_notifier(&data_dir, repository, notifier),
        None => InletContext::new(&data_dir, repository),
    }
    .context("Failed to initialize inlet context")
}

/// The single operator identity for CLI runs
pub fn cli_user() -> Uuid {
    Uuid::new_v4()
}

/// Progress bar bridge for the workflow's notification port
pub struct BarNotifier {
    bar: ProgressBar,
}

impl BarNotifier {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:30.cyan/blue} {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressNotifier for BarNotifier {
    fn notify(&self, _upload_id: Uuid, event: &ProgressEvent) {
        self.bar.set_position(event.percentage as u64);
        let msg = match &event.details {
            Some(details) => format!("{} ({details})", event.status),
            None => event.status.clone(),
        };
        self.bar.set_message(msg);
    }
}
