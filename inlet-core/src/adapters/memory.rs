//! In-memory repository adapter
//!
//! Backs the repository port with plain maps behind a mutex. Used by the
//! CLI demo flow and by tests; the real deployment wires a database-backed
//! implementation of the same port.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{ParsedTransaction, UploadRecord};
use crate::ports::{ImportRepository, StoredTransaction};

#[derive(Default)]
struct Inner {
    transactions: Vec<StoredTransaction>,
    uploads: HashMap<Uuid, UploadRecord>,
    rollback_tokens: HashMap<String, Uuid>,
}

/// Mutex-guarded in-memory store
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<Inner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing record; test and demo helper
    pub fn seed_transaction(&self, tx: StoredTransaction) {
        self.lock().transactions.push(tx);
    }

    /// All records currently stored, in insertion order
    pub fn transactions(&self) -> Vec<StoredTransaction> {
        self.lock().transactions.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panicked test thread; propagating the
        // inner state is still sound for plain data
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ImportRepository for MemoryRepository {
    fn create_records(
        &self,
        user_id: Uuid,
        import_id: Uuid,
        batch: &[ParsedTransaction],
    ) -> Result<Vec<Uuid>> {
        let mut inner = self.lock();
        // Build the whole batch before touching the store so the insert is
        // all-or-nothing
        let records: Vec<StoredTransaction> = batch
            .iter()
            .map(|tx| StoredTransaction {
                id: Uuid::new_v4(),
                user_id,
                date: tx.date,
                description: tx.description.clone(),
                amount: tx.amount,
                import_id: Some(import_id),
            })
            .collect();
        let ids = records.iter().map(|r| r.id).collect();
        inner.transactions.extend(records);
        Ok(ids)
    }

    fn delete_records_by_import_id(&self, import_id: Uuid) -> Result<usize> {
        let mut inner = self.lock();
        let before = inner.transactions.len();
        inner
            .transactions
            .retain(|r| r.import_id != Some(import_id));
        Ok(before - inner.transactions.len())
    }

    fn find_candidates(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StoredTransaction>> {
        Ok(self
            .lock()
            .transactions
            .iter()
            .filter(|r| r.user_id == user_id && r.date >= start && r.date <= end)
            .cloned()
            .collect())
    }

    fn insert_upload(&self, record: &UploadRecord) -> Result<()> {
        let mut inner = self.lock();
        if inner.uploads.contains_key(&record.id) {
            return Err(Error::repository(format!(
                "upload {} already exists",
                record.id
            )));
        }
        inner.uploads.insert(record.id, record.clone());
        Ok(())
    }

    fn get_upload(&self, id: Uuid) -> Result<Option<UploadRecord>> {
        Ok(self.lock().uploads.get(&id).cloned())
    }

    fn update_upload(&self, record: &UploadRecord) -> Result<()> {
        let mut inner = self.lock();
        match inner.uploads.get_mut(&record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(())
            }
            None => Err(Error::not_found(format!("upload {}", record.id))),
        }
    }

    fn delete_upload(&self, id: Uuid) -> Result<bool> {
        Ok(self.lock().uploads.remove(&id).is_some())
    }

    fn find_upload_by_hash(&self, user_id: Uuid, file_hash: &str) -> Result<Option<UploadRecord>> {
        Ok(self
            .lock()
            .uploads
            .values()
            .find(|u| u.user_id == user_id && u.file_hash == file_hash)
            .cloned())
    }

    fn register_rollback_token(&self, token: &str, import_id: Uuid) -> Result<()> {
        self.lock()
            .rollback_tokens
            .insert(token.to_string(), import_id);
        Ok(())
    }

    fn take_rollback_token(&self, token: &str) -> Result<Option<Uuid>> {
        Ok(self.lock().rollback_tokens.remove(token))
    }
}
