//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one stage of the import pipeline.

pub mod detect;
pub mod duplicates;
pub mod import;
pub mod profiles;
pub mod registry;
pub mod resolver;

pub use detect::{FileDetector, FileInfo, DEFAULT_MAX_FILE_SIZE};
pub use duplicates::{DuplicateConfig, DuplicateDetectionService};
pub use import::StatementImportService;
pub use profiles::{builtin_profile, BankProfileStore};
pub use registry::ParserRegistry;
pub use resolver::{ImportConflictResolver, Resolution};
