//! Inlet Core - statement parsing and import reconciliation
//!
//! This crate turns heterogeneous bank export files (CSV, PDF, OFX, QIF,
//! Excel) into a normalized transaction stream and reconciles it against
//! previously recorded activity, following hexagonal architecture:
//!
//! - **domain**: Core entities (ParsedTransaction, BankProfile, ...)
//! - **ports**: Trait definitions for external dependencies (repository,
//!   parsers, progress notification)
//! - **services**: Business logic orchestration (detection, registry,
//!   duplicate scoring, the import workflow)
//! - **adapters**: Concrete implementations (format parsers, in-memory
//!   repository)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use adapters::{CsvParser, ExcelParser, OfxParser, PdfStatementParser, QifParser};
use config::Config;
use ports::{ImportRepository, NullNotifier, ProgressNotifier};
use services::{
    BankProfileStore, DuplicateDetectionService, FileDetector, ParserRegistry,
    StatementImportService,
};

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{
    BankProfile, DuplicateMatch, ImportPolicy, ImportResult, ParseResult, ParsedTransaction,
    UploadRecord, UploadStatus,
};

/// Main context for Inlet operations
///
/// The primary entry point for callers. It wires the built-in parsers into
/// an explicit registry and hands everything to the import workflow; the
/// repository implementation is injected by the caller.
pub struct InletContext {
    pub config: Config,
    pub repository: Arc<dyn ImportRepository>,
    pub registry: Arc<ParserRegistry>,
    pub profile_store: Arc<BankProfileStore>,
    pub import_service: StatementImportService,
}

impl InletContext {
    /// Create a context with the default (silent) progress notifier
    pub fn new(data_dir: &Path, repository: Arc<dyn ImportRepository>) -> Result<Self> {
        Self::with_notifier(data_dir, repository, Arc::new(NullNotifier))
    }

    /// Create a context with a caller-supplied progress channel
    pub fn with_notifier(
        data_dir: &Path,
        repository: Arc<dyn ImportRepository>,
        notifier: Arc<dyn ProgressNotifier>,
    ) -> Result<Self> {
        let config = Config::load(data_dir)?;

        let registry = Arc::new(builtin_registry());
        let profile_store = Arc::new(BankProfileStore::new(data_dir));

        let import_service = StatementImportService::new(
            Arc::clone(&repository),
            Arc::clone(&registry),
            Arc::clone(&profile_store),
            notifier,
            data_dir,
            FileDetector::new(config.max_file_size),
            DuplicateDetectionService::new(config.duplicates.clone()),
        );

        Ok(Self {
            config,
            repository,
            registry,
            profile_store,
            import_service,
        })
    }
}

/// Registry with the built-in parsers in priority order: the profile-driven
/// PDF parser and the tag-structured formats go before the generic
/// CSV fallback
pub fn builtin_registry() -> ParserRegistry {
    let mut registry = ParserRegistry::new();
    registry.register(Arc::new(PdfStatementParser::new()));
    registry.register(Arc::new(OfxParser::new()));
    registry.register(Arc::new(QifParser::new()));
    registry.register(Arc::new(ExcelParser::new()));
    registry.register(Arc::new(CsvParser::new()));
    registry
}
