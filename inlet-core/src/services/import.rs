//! Statement import workflow - upload, preview, confirm, rollback
//!
//! Owns the upload-record state machine (uploaded -> validated ->
//! parsed -> confirmed | failed | cancelled) and the rollback token. Every
//! operation is keyed on the upload or import id plus the owning user;
//! there is no ambient global state, so concurrent uploads never contend.
//! Committing the clean batch is the only transactional boundary and is
//! delegated to the repository port's atomic `create_records`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Duration;
use log::{debug, warn};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    ImportPolicy, ImportResult, ParseResult, ParsedTransaction, UploadRecord, UploadStatus,
};
use crate::ports::{ImportRepository, ProgressEvent, ProgressNotifier};
use crate::services::detect::FileDetector;
use crate::services::duplicates::DuplicateDetectionService;
use crate::services::profiles::BankProfileStore;
use crate::services::registry::ParserRegistry;
use crate::services::resolver::ImportConflictResolver;

/// End-to-end import workflow orchestrator
pub struct StatementImportService {
    repository: Arc<dyn ImportRepository>,
    registry: Arc<ParserRegistry>,
    profiles: Arc<BankProfileStore>,
    detector: FileDetector,
    duplicates: DuplicateDetectionService,
    resolver: ImportConflictResolver,
    notifier: Arc<dyn ProgressNotifier>,
    uploads_dir: PathBuf,
    /// Preview results keyed by upload id; confirm re-parses on a miss
    previews: Mutex<HashMap<Uuid, ParseResult>>,
}

impl StatementImportService {
    pub fn new(
        repository: Arc<dyn ImportRepository>,
        registry: Arc<ParserRegistry>,
        profiles: Arc<BankProfileStore>,
        notifier: Arc<dyn ProgressNotifier>,
        data_dir: &Path,
        detector: FileDetector,
        duplicates: DuplicateDetectionService,
    ) -> Self {
        Self {
            repository,
            registry,
            profiles,
            detector,
            duplicates,
            resolver: ImportConflictResolver::new(),
            notifier,
            uploads_dir: data_dir.join("uploads"),
            previews: Mutex::new(HashMap::new()),
        }
    }

    /// Accept raw file bytes, validate them and create the upload record.
    /// Validation failures land the record directly in `failed` with the
    /// errors attached; no parser runs.
    pub fn upload(
        &self,
        user_id: Uuid,
        file_bytes: &[u8],
        filename: &str,
        bank_hint: Option<&str>,
    ) -> Result<UploadRecord> {
        let file_hash = content_hash(file_bytes);
        let mut record = UploadRecord::new(user_id, sanitize_filename(filename), file_hash.clone());
        record.bank_hint = bank_hint.map(|h| h.to_string());
        self.notify(record.id, 5, "uploading");

        // Identical-content guard: a live upload with the same hash blocks
        // a re-import; failed or cancelled attempts do not
        if let Some(existing) = self.repository.find_upload_by_hash(user_id, &file_hash)? {
            if !matches!(existing.status, UploadStatus::Failed | UploadStatus::Cancelled) {
                record
                    .validation_errors
                    .push(format!("identical file already uploaded ({})", existing.id));
            }
        }

        std::fs::create_dir_all(&self.uploads_dir)?;
        let stored = self.stored_path(&record);
        std::fs::write(&stored, file_bytes)?;

        if record.validation_errors.is_empty() {
            let (ok, errors) = self.detector.validate_file(&stored)?;
            if !ok {
                record.validation_errors.extend(errors);
            }
        }

        if record.validation_errors.is_empty() {
            let info = self.detector.get_file_info(&stored)?;
            match self
                .registry
                .find_parser(&record.filename, info.mime.as_deref())
            {
                Some(parser) => record.detected_parser = Some(parser.name().to_string()),
                None => record
                    .validation_errors
                    .push(format!("no parser accepts '{}'", record.filename)),
            }
        }

        if record.validation_errors.is_empty() {
            record.transition_to(UploadStatus::Validated);
            self.notify(record.id, 25, "validated");
        } else {
            record.transition_to(UploadStatus::Failed);
            let _ = std::fs::remove_file(&stored);
            self.notify_details(record.id, 100, "failed", record.validation_errors.join("; "));
        }

        self.repository.insert_upload(&record)?;
        debug!(
            "upload {} ({}) -> {}",
            record.id,
            record.filename,
            record.status.as_str()
        );
        Ok(record)
    }

    /// Parse the uploaded file and move the record to `parsed`, caching the
    /// result for the confirm step
    pub fn preview(&self, user_id: Uuid, upload_id: Uuid) -> Result<ParseResult> {
        let mut record = self.owned_upload(user_id, upload_id)?;
        if !matches!(record.status, UploadStatus::Validated | UploadStatus::Parsed) {
            return Err(Error::validation(format!(
                "cannot preview an upload in state '{}'",
                record.status.as_str()
            )));
        }

        self.notify(upload_id, 40, "parsing");
        let result = self.run_parser(&record)?;

        record.transition_to(UploadStatus::Parsed);
        self.repository.update_upload(&record)?;
        self.previews
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(upload_id, result.clone());

        self.notify_details(
            upload_id,
            60,
            "parsed",
            format!(
                "{} transactions, {} warnings",
                result.transactions.len(),
                result.warnings.len()
            ),
        );
        Ok(result)
    }

    /// Resolve duplicates under `policy` and commit the clean set
    /// atomically. A rollback token is issued with every outcome, including
    /// a failed persistence step.
    pub fn confirm(
        &self,
        user_id: Uuid,
        upload_id: Uuid,
        policy: ImportPolicy,
        selected_indices: Option<&[usize]>,
    ) -> Result<ImportResult> {
        let mut record = self.owned_upload(user_id, upload_id)?;
        if !matches!(record.status, UploadStatus::Validated | UploadStatus::Parsed) {
            return Err(Error::validation(format!(
                "cannot confirm an upload in state '{}'",
                record.status.as_str()
            )));
        }

        let cached = self
            .previews
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&upload_id)
            .cloned();
        let parse_result = match cached {
            Some(result) => result,
            None => self.run_parser(&record)?,
        };
        if record.status == UploadStatus::Validated {
            record.transition_to(UploadStatus::Parsed);
        }

        // A failed parse is only committable through an explicit selection
        if !parse_result.success && selected_indices.is_none() {
            return Err(Error::validation(
                "parse was not successful; confirm requires an explicit transaction selection",
            ));
        }

        let transactions = select_transactions(parse_result.transactions.clone(), selected_indices)?;
        let considered = transactions.len();

        self.notify(upload_id, 70, "checking duplicates");
        let dates = transactions.iter().map(|t| t.date);
        let candidates = match (dates.clone().min(), dates.max()) {
            (Some(first), Some(last)) => {
                let window = Duration::days(self.duplicates.config().date_window_days);
                self.repository
                    .find_candidates(user_id, first - window, last + window)?
            }
            _ => Vec::new(),
        };
        let matches = self.duplicates.check_batch(&transactions, &candidates);
        let resolution = self.resolver.resolve(transactions, &matches, policy);

        let import_id = Uuid::new_v4();
        let rollback_token = generate_rollback_token(import_id);
        self.repository
            .register_rollback_token(&rollback_token, import_id)?;

        self.notify(upload_id, 85, "persisting");
        let outcome = self
            .repository
            .create_records(user_id, import_id, &resolution.clean);

        match outcome {
            Ok(ids) => {
                record.transition_to(UploadStatus::Confirmed);
                self.repository.update_upload(&record)?;
                self.previews
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&upload_id);
                self.notify_details(upload_id, 100, "confirmed", format!("{} imported", ids.len()));
                Ok(ImportResult {
                    import_id,
                    success: true,
                    imported_count: ids.len(),
                    skipped_count: considered - resolution.clean.len(),
                    duplicate_count: resolution.duplicate_count,
                    errors: Vec::new(),
                    rollback_token,
                    conflicts: resolution.report,
                })
            }
            Err(e) => {
                warn!("import {import_id} failed during persistence: {e}");
                record.transition_to(UploadStatus::Failed);
                self.repository.update_upload(&record)?;
                self.notify_details(upload_id, 100, "failed", e.to_string());
                // The token stays registered: it covers whatever partial
                // side effects the repository may have left behind
                Ok(ImportResult {
                    import_id,
                    success: false,
                    imported_count: 0,
                    skipped_count: considered,
                    duplicate_count: resolution.duplicate_count,
                    errors: vec![e.to_string()],
                    rollback_token,
                    conflicts: resolution.report,
                })
            }
        }
    }

    /// Redeem a rollback token, deleting every record created under its
    /// import id. Returns false for an unknown or already-redeemed token.
    pub fn rollback(&self, rollback_token: &str) -> Result<bool> {
        match self.repository.take_rollback_token(rollback_token)? {
            Some(import_id) => {
                let deleted = self.repository.delete_records_by_import_id(import_id)?;
                debug!("rollback of import {import_id} deleted {deleted} records");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Cancel an upload that has not been confirmed, freeing its stored
    /// file. Returns false when the upload does not exist.
    pub fn delete_upload(&self, user_id: Uuid, upload_id: Uuid) -> Result<bool> {
        let record = match self.repository.get_upload(upload_id)? {
            Some(record) if record.user_id == user_id => record,
            _ => return Ok(false),
        };
        if record.status == UploadStatus::Confirmed {
            return Err(Error::validation(
                "a confirmed import must be rolled back, not deleted",
            ));
        }

        let mut record = record;
        record.transition_to(UploadStatus::Cancelled);
        let _ = std::fs::remove_file(self.stored_path(&record));
        self.previews
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&upload_id);
        self.repository.delete_upload(upload_id)
    }

    /// Upload record owned by `user_id`; wrong owner reads as not found
    fn owned_upload(&self, user_id: Uuid, upload_id: Uuid) -> Result<UploadRecord> {
        match self.repository.get_upload(upload_id)? {
            Some(record) if record.user_id == user_id => Ok(record),
            _ => Err(Error::not_found(format!("upload {upload_id}"))),
        }
    }

    fn run_parser(&self, record: &UploadRecord) -> Result<ParseResult> {
        let parser = record
            .detected_parser
            .as_deref()
            .and_then(|name| self.registry.get(name))
            .or_else(|| self.registry.find_parser(&record.filename, None))
            .ok_or_else(|| Error::validation(format!("no parser accepts '{}'", record.filename)))?;

        let profile = match &record.bank_hint {
            Some(key) => self.profiles.load_profile(key)?,
            None => None,
        };

        let stored = self.stored_path(record);
        parser.parse(&stored, profile.as_ref())
    }

    fn stored_path(&self, record: &UploadRecord) -> PathBuf {
        self.uploads_dir
            .join(format!("{}-{}", record.id, record.filename))
    }

    fn notify(&self, upload_id: Uuid, percentage: u8, status: &str) {
        self.notifier
            .notify(upload_id, &ProgressEvent::new(percentage, status));
    }

    fn notify_details(&self, upload_id: Uuid, percentage: u8, status: &str, details: String) {
        self.notifier.notify(
            upload_id,
            &ProgressEvent::new(percentage, status).with_details(details),
        );
    }
}

/// Keep only the file-name component of a client-supplied name
fn sanitize_filename(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string()
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Single-use credential tied to one import id; unguessable thanks to the
/// fresh nonce
fn generate_rollback_token(import_id: Uuid) -> String {
    let mut hasher = Sha256::new();
    hasher.update(import_id.as_bytes());
    hasher.update(Uuid::new_v4().as_bytes());
    hex::encode(hasher.finalize())
}

fn select_transactions(
    transactions: Vec<ParsedTransaction>,
    selected_indices: Option<&[usize]>,
) -> Result<Vec<ParsedTransaction>> {
    let Some(indices) = selected_indices else {
        return Ok(transactions);
    };
    let mut picked = Vec::with_capacity(indices.len());
    for &index in indices {
        let tx = transactions.get(index).ok_or_else(|| {
            Error::validation(format!(
                "selected index {index} is out of range ({} transactions)",
                transactions.len()
            ))
        })?;
        picked.push(tx.clone());
    }
    Ok(picked)
}
