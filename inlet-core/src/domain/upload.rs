//! Upload record - the state machine instance tracking one file through
//! upload -> preview -> confirm

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workflow state of one uploaded statement file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploaded,
    Validated,
    Parsed,
    Confirmed,
    Failed,
    Cancelled,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Uploaded => "uploaded",
            UploadStatus::Validated => "validated",
            UploadStatus::Parsed => "parsed",
            UploadStatus::Confirmed => "confirmed",
            UploadStatus::Failed => "failed",
            UploadStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadStatus::Confirmed | UploadStatus::Failed | UploadStatus::Cancelled
        )
    }

    /// Allowed state-machine transitions
    pub fn can_transition_to(&self, next: UploadStatus) -> bool {
        use UploadStatus::*;
        match (self, next) {
            (Uploaded, Validated) | (Uploaded, Failed) | (Uploaded, Cancelled) => true,
            (Validated, Parsed) | (Validated, Failed) | (Validated, Cancelled) => true,
            (Parsed, Parsed) => true, // re-preview
            (Parsed, Confirmed) | (Parsed, Failed) | (Parsed, Cancelled) => true,
            _ => false,
        }
    }
}

/// Persistent record for one upload, exclusively owned by the import
/// workflow that created it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    /// SHA-256 of the file content, guards against re-importing an
    /// identical file
    pub file_hash: String,
    pub status: UploadStatus,
    pub validation_errors: Vec<String>,
    pub detected_parser: Option<String>,
    pub bank_hint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UploadRecord {
    pub fn new(user_id: Uuid, filename: impl Into<String>, file_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            filename: filename.into(),
            file_hash: file_hash.into(),
            status: UploadStatus::Uploaded,
            validation_errors: Vec::new(),
            detected_parser: None,
            bank_hint: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, updating the timestamp. Returns false (and leaves the
    /// record untouched) when the transition is not allowed.
    pub fn transition_to(&mut self, next: UploadStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = Utc::now();
        true
    }
}
