//! Integration tests for the inlet-core import pipeline
//!
//! These exercise the full workflow (upload -> preview -> confirm ->
//! rollback) through the public context with a real filesystem data
//! directory; only persistence runs against the in-memory adapter.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

use inlet_core::adapters::MemoryRepository;
use inlet_core::ports::StoredTransaction;
use inlet_core::{ImportPolicy, InletContext, UploadStatus};

// ============================================================================
// Test Helpers
// ============================================================================

const CSV_STATEMENT: &str = "Date,Description,Amount\n\
                             2025-01-15,Coffee Shop,-4.50\n\
                             2025-01-16,Salary,2500.00\n\
                             2025-01-17,Grocery Store,-85.30\n";

const QIF_STATEMENT: &str = "!Type:Bank\n\
                             D01/15/2025\n\
                             T-42.50\n\
                             PCOFFEE ROASTERS\n\
                             ^\n\
                             D01/20/2025\n\
                             T1,500.00\n\
                             PEMPLOYER INC\n\
                             ^\n";

fn create_context(temp_dir: &TempDir) -> (InletContext, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::new());
    let ctx = InletContext::new(temp_dir.path(), repo.clone()).expect("context");
    (ctx, repo)
}

fn seed_existing(repo: &MemoryRepository, user: Uuid, date: (i32, u32, u32), amount: i64, desc: &str) {
    repo.seed_transaction(StoredTransaction {
        id: Uuid::new_v4(),
        user_id: user,
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        description: desc.to_string(),
        amount: Decimal::new(amount, 2),
        import_id: None,
    });
}

// ============================================================================
// End-to-end CSV workflow
// ============================================================================

#[test]
fn test_csv_upload_preview_confirm() {
    let temp_dir = TempDir::new().unwrap();
    let (ctx, repo) = create_context(&temp_dir);
    let user = Uuid::new_v4();

    let record = ctx
        .import_service
        .upload(user, CSV_STATEMENT.as_bytes(), "statement.csv", None)
        .unwrap();
    assert_eq!(record.status, UploadStatus::Validated);
    assert_eq!(record.detected_parser.as_deref(), Some("csv"));

    let preview = ctx.import_service.preview(user, record.id).unwrap();
    assert!(preview.success);
    assert!(preview.errors.is_empty());
    assert_eq!(preview.transactions.len(), 3);
    assert_eq!(
        preview.transactions[0].date,
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    );
    assert_eq!(preview.transactions[0].description, "Coffee Shop");
    assert_eq!(preview.transactions[0].amount, Decimal::new(-450, 2));
    assert_eq!(preview.transactions[1].amount, Decimal::new(250000, 2));
    assert_eq!(preview.transactions[2].amount, Decimal::new(-8530, 2));

    let result = ctx
        .import_service
        .confirm(user, record.id, ImportPolicy::AutoSkipDuplicates, None)
        .unwrap();
    assert!(result.success);
    assert_eq!(result.imported_count, 3);
    assert_eq!(result.duplicate_count, 0);
    assert_eq!(repo.transactions().len(), 3);
}

#[test]
fn test_preview_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let (ctx, _repo) = create_context(&temp_dir);
    let user = Uuid::new_v4();

    let record = ctx
        .import_service
        .upload(user, CSV_STATEMENT.as_bytes(), "statement.csv", None)
        .unwrap();
    let first = ctx.import_service.preview(user, record.id).unwrap();
    let second = ctx.import_service.preview(user, record.id).unwrap();
    assert_eq!(first.transactions, second.transactions);
}

// ============================================================================
// Duplicate reconciliation
// ============================================================================

#[test]
fn test_duplicates_against_recorded_history_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let (ctx, repo) = create_context(&temp_dir);
    let user = Uuid::new_v4();

    // The coffee purchase is already on record
    seed_existing(&repo, user, (2025, 1, 15), -450, "Coffee Shop");

    let record = ctx
        .import_service
        .upload(user, CSV_STATEMENT.as_bytes(), "statement.csv", None)
        .unwrap();
    ctx.import_service.preview(user, record.id).unwrap();
    let result = ctx
        .import_service
        .confirm(user, record.id, ImportPolicy::AutoSkipDuplicates, None)
        .unwrap();

    assert_eq!(result.duplicate_count, 1);
    assert_eq!(result.imported_count, 2);
    assert_eq!(result.skipped_count, 1);
    // 1 seeded + 2 imported
    assert_eq!(repo.transactions().len(), 3);
    assert_eq!(result.conflicts.len(), 1);
    assert!(!result.conflicts[0].duplicates.is_empty());
}

#[test]
fn test_flag_policy_keeps_duplicates_with_note() {
    let temp_dir = TempDir::new().unwrap();
    let (ctx, repo) = create_context(&temp_dir);
    let user = Uuid::new_v4();

    seed_existing(&repo, user, (2025, 1, 15), -450, "Coffee Shop");

    let record = ctx
        .import_service
        .upload(user, CSV_STATEMENT.as_bytes(), "statement.csv", None)
        .unwrap();
    ctx.import_service.preview(user, record.id).unwrap();
    let result = ctx
        .import_service
        .confirm(user, record.id, ImportPolicy::FlagDuplicates, None)
        .unwrap();

    assert_eq!(result.duplicate_count, 1);
    assert_eq!(result.imported_count, 3);
    assert_eq!(result.skipped_count, 0);
}

#[test]
fn test_other_users_history_is_invisible() {
    let temp_dir = TempDir::new().unwrap();
    let (ctx, repo) = create_context(&temp_dir);
    let user = Uuid::new_v4();
    let other_user = Uuid::new_v4();

    seed_existing(&repo, other_user, (2025, 1, 15), -450, "Coffee Shop");

    let record = ctx
        .import_service
        .upload(user, CSV_STATEMENT.as_bytes(), "statement.csv", None)
        .unwrap();
    ctx.import_service.preview(user, record.id).unwrap();
    let result = ctx
        .import_service
        .confirm(user, record.id, ImportPolicy::AutoSkipDuplicates, None)
        .unwrap();

    assert_eq!(result.duplicate_count, 0);
    assert_eq!(result.imported_count, 3);
}

// ============================================================================
// Rollback
// ============================================================================

#[test]
fn test_rollback_removes_all_records_once() {
    let temp_dir = TempDir::new().unwrap();
    let (ctx, repo) = create_context(&temp_dir);
    let user = Uuid::new_v4();

    // Unrelated history must survive the rollback
    seed_existing(&repo, user, (2024, 6, 1), -999, "Old Purchase");

    let record = ctx
        .import_service
        .upload(user, CSV_STATEMENT.as_bytes(), "statement.csv", None)
        .unwrap();
    ctx.import_service.preview(user, record.id).unwrap();
    let result = ctx
        .import_service
        .confirm(user, record.id, ImportPolicy::AutoSkipDuplicates, None)
        .unwrap();
    assert_eq!(repo.transactions().len(), 4);

    assert!(ctx.import_service.rollback(&result.rollback_token).unwrap());
    let remaining = repo.transactions();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].description, "Old Purchase");
    assert!(remaining
        .iter()
        .all(|t| t.import_id != Some(result.import_id)));

    // The token is single-use
    assert!(!ctx.import_service.rollback(&result.rollback_token).unwrap());
}

// ============================================================================
// Validation and failure paths
// ============================================================================

#[test]
fn test_unsupported_and_mismatched_files_fail_upload() {
    let temp_dir = TempDir::new().unwrap();
    let (ctx, _repo) = create_context(&temp_dir);
    let user = Uuid::new_v4();

    let unknown = ctx
        .import_service
        .upload(user, b"some bytes", "notes.docx", None)
        .unwrap();
    assert_eq!(unknown.status, UploadStatus::Failed);

    // ZIP content behind a .csv extension
    let disguised = ctx
        .import_service
        .upload(user, b"PK\x03\x04zipzipzip", "sneaky.csv", None)
        .unwrap();
    assert_eq!(disguised.status, UploadStatus::Failed);
    assert!(disguised
        .validation_errors
        .iter()
        .any(|e| e.contains("ZIP")));
}

#[test]
fn test_identical_file_cannot_be_imported_twice() {
    let temp_dir = TempDir::new().unwrap();
    let (ctx, _repo) = create_context(&temp_dir);
    let user = Uuid::new_v4();

    let first = ctx
        .import_service
        .upload(user, CSV_STATEMENT.as_bytes(), "statement.csv", None)
        .unwrap();
    assert_eq!(first.status, UploadStatus::Validated);

    let again = ctx
        .import_service
        .upload(user, CSV_STATEMENT.as_bytes(), "renamed.csv", None)
        .unwrap();
    assert_eq!(again.status, UploadStatus::Failed);
}

#[test]
fn test_cancelling_an_upload_frees_the_hash() {
    let temp_dir = TempDir::new().unwrap();
    let (ctx, _repo) = create_context(&temp_dir);
    let user = Uuid::new_v4();

    let first = ctx
        .import_service
        .upload(user, CSV_STATEMENT.as_bytes(), "statement.csv", None)
        .unwrap();
    assert!(ctx.import_service.delete_upload(user, first.id).unwrap());

    let again = ctx
        .import_service
        .upload(user, CSV_STATEMENT.as_bytes(), "statement.csv", None)
        .unwrap();
    assert_eq!(again.status, UploadStatus::Validated);
}

// ============================================================================
// Other formats through the registry
// ============================================================================

#[test]
fn test_qif_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let (ctx, _repo) = create_context(&temp_dir);
    let user = Uuid::new_v4();

    let record = ctx
        .import_service
        .upload(user, QIF_STATEMENT.as_bytes(), "export.qif", None)
        .unwrap();
    assert_eq!(record.detected_parser.as_deref(), Some("qif"));

    let preview = ctx.import_service.preview(user, record.id).unwrap();
    assert_eq!(preview.transactions.len(), 2);
    assert_eq!(preview.transactions[0].description, "COFFEE ROASTERS");
    assert_eq!(preview.transactions[1].amount, Decimal::new(150000, 2));
}

#[test]
fn test_ofx_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let (ctx, _repo) = create_context(&temp_dir);
    let user = Uuid::new_v4();

    let ofx = "<OFX>\n<BANKTRANLIST>\n<DTSTART>20250101\n<DTEND>20250131\n\
               <STMTTRN>\n<DTPOSTED>20250115\n<TRNAMT>-4.50\n<FITID>T1\n<NAME>Coffee Shop\n</STMTTRN>\n\
               </BANKTRANLIST>\n</OFX>\n";
    let record = ctx
        .import_service
        .upload(user, ofx.as_bytes(), "export.ofx", None)
        .unwrap();
    assert_eq!(record.detected_parser.as_deref(), Some("ofx"));

    let preview = ctx.import_service.preview(user, record.id).unwrap();
    assert_eq!(preview.transactions.len(), 1);
    assert_eq!(preview.transactions[0].amount, Decimal::new(-450, 2));
    assert_eq!(
        preview.metadata.get("statement_start").unwrap(),
        "2025-01-01"
    );
}

// ============================================================================
// Bank profiles
// ============================================================================

#[test]
fn test_bank_hint_applies_profile_date_format() {
    let temp_dir = TempDir::new().unwrap();
    let (ctx, _repo) = create_context(&temp_dir);
    let user = Uuid::new_v4();

    // The built-in reference profile maps Datum/Popis/Suma with d.m.Y dates
    let csv = "Datum,Popis,Suma\n15.01.2025,Potraviny,-12.30\n";
    let record = ctx
        .import_service
        .upload(user, csv.as_bytes(), "tatra.csv", Some("tatra"))
        .unwrap();
    let preview = ctx.import_service.preview(user, record.id).unwrap();

    assert_eq!(preview.transactions.len(), 1, "{:?}", preview.warnings);
    assert_eq!(
        preview.transactions[0].date,
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    );
}

#[test]
fn test_unknown_bank_hint_falls_back_to_heuristics() {
    let temp_dir = TempDir::new().unwrap();
    let (ctx, _repo) = create_context(&temp_dir);
    let user = Uuid::new_v4();

    let record = ctx
        .import_service
        .upload(
            user,
            CSV_STATEMENT.as_bytes(),
            "statement.csv",
            Some("no-such-bank"),
        )
        .unwrap();
    let preview = ctx.import_service.preview(user, record.id).unwrap();
    assert_eq!(preview.transactions.len(), 3);
}
