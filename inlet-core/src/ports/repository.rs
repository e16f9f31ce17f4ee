//! Repository port - persistence abstraction
//!
//! The engine never talks to a database directly; everything it needs from
//! its environment is behind this trait. Implementations (adapters) provide
//! the actual storage.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{ParsedTransaction, UploadRecord};

/// A previously recorded transaction, as the duplicate scorer sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    /// Import batch this record came from, if any
    pub import_id: Option<Uuid>,
}

/// Persistence abstraction required by the import workflow
pub trait ImportRepository: Send + Sync {
    // === Transactions ===

    /// Persist a batch under `import_id`, atomically: either every
    /// transaction is recorded or none are. Returns the created ids.
    fn create_records(
        &self,
        user_id: Uuid,
        import_id: Uuid,
        batch: &[ParsedTransaction],
    ) -> Result<Vec<Uuid>>;

    /// Delete every record created under `import_id`; returns how many
    fn delete_records_by_import_id(&self, import_id: Uuid) -> Result<usize>;

    /// Existing records in a date window, for duplicate scoring
    fn find_candidates(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StoredTransaction>>;

    // === Upload records ===

    fn insert_upload(&self, record: &UploadRecord) -> Result<()>;

    fn get_upload(&self, id: Uuid) -> Result<Option<UploadRecord>>;

    fn update_upload(&self, record: &UploadRecord) -> Result<()>;

    /// Remove an upload record; returns false when it did not exist
    fn delete_upload(&self, id: Uuid) -> Result<bool>;

    /// Find a user's upload with the given content hash, if any
    fn find_upload_by_hash(&self, user_id: Uuid, file_hash: &str) -> Result<Option<UploadRecord>>;

    // === Rollback tokens ===

    /// Remember that `token` authorizes deleting the records of `import_id`
    fn register_rollback_token(&self, token: &str, import_id: Uuid) -> Result<()>;

    /// Redeem a token, removing it atomically so a second redemption of the
    /// same token returns None
    fn take_rollback_token(&self, token: &str) -> Result<Option<Uuid>>;
}
