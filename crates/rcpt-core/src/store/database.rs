//! SQLite-backed implementation of the record stores.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::Connection;
use tracing::{debug, info};

use super::{DocumentStore, LifecycleStore, ReceiptStore, documents, operation_for, receipts};
use crate::error::{RcptError, Result, StorageError};
use crate::models::document::{Document, DocumentId, DocumentState, NewDocument};
use crate::models::receipt::{Receipt, ReceiptFields, ReceiptId, ReceiptPage};

const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_initial.sql"))];

/// Document and receipt repositories over a single SQLite connection.
///
/// The connection sits behind a mutex, so every statement and transaction
/// runs without interleaving with other writers.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file at `path` and run migrations.
    pub fn open(path: &Path) -> std::result::Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        info!("Opened database at {}", path.display());
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> std::result::Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> std::result::Result<Self, StorageError> {
        conn.execute_batch(
            "PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Flush and close the connection.
    pub fn close(self) -> std::result::Result<(), StorageError> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| StorageError::LockPoisoned)?;
        conn.close().map_err(|(_, e)| StorageError::Database(e))?;
        info!("Database closed");
        Ok(())
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

/// Apply every migration newer than the recorded schema version.
fn run_migrations(conn: &Connection) -> std::result::Result<(), StorageError> {
    let current = current_version(conn);

    for (version, sql) in MIGRATIONS {
        if *version > current {
            info!("Running migration v{}", version);
            conn.execute_batch(sql)
                .map_err(|e| StorageError::Migration {
                    version: *version,
                    reason: e.to_string(),
                })?;
        }
    }
    Ok(())
}

/// Schema version, 0 when the database is empty.
fn current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .ok()
    .flatten()
    .unwrap_or(0)
}

impl DocumentStore for Database {
    fn create_document(&self, new: NewDocument) -> Result<Document> {
        let conn = self.lock()?;
        let id = documents::insert_document(&conn, &new, Utc::now())?;
        debug!("Created document {} ({})", id, new.name);
        documents::get_document(&conn, id)?.ok_or_else(|| RcptError::document_not_found(id))
    }

    fn get_document(&self, id: DocumentId) -> Result<Document> {
        let conn = self.lock()?;
        documents::get_document(&conn, id)?.ok_or_else(|| RcptError::document_not_found(id))
    }

    fn transition(
        &self,
        id: DocumentId,
        from: DocumentState,
        to: DocumentState,
        invalid_reason: Option<&str>,
    ) -> Result<Document> {
        let operation = operation_for(to);
        if !from.can_transition_to(to) {
            return Err(RcptError::Precondition {
                id,
                state: from,
                operation,
            });
        }

        let reason = match to {
            DocumentState::Rejected => Some(invalid_reason.unwrap_or("rejected")),
            _ => None,
        };

        let conn = self.lock()?;
        let written = documents::swap_state(&conn, id, from, to, reason, Utc::now())?;
        if written == 0 {
            return Err(documents::swap_failure(&conn, id, operation)?);
        }

        debug!("Document {} moved {} -> {}", id, from, to);
        documents::get_document(&conn, id)?.ok_or_else(|| RcptError::document_not_found(id))
    }

    fn list_documents(&self) -> Result<Vec<Document>> {
        let conn = self.lock()?;
        Ok(documents::list_documents(&conn)?)
    }
}

impl ReceiptStore for Database {
    fn get_receipt(&self, id: ReceiptId) -> Result<Receipt> {
        let conn = self.lock()?;
        receipts::get_receipt(&conn, id)?.ok_or_else(|| RcptError::receipt_not_found(id))
    }

    fn list_receipts(&self, skip: u64, limit: u64) -> Result<ReceiptPage> {
        let conn = self.lock()?;
        let total = receipts::count_receipts(&conn)?;
        let receipts = receipts::list_receipts(&conn, skip, limit)?;
        Ok(ReceiptPage { receipts, total })
    }
}

impl LifecycleStore for Database {
    fn commit_processed(
        &self,
        document_id: DocumentId,
        fields: &ReceiptFields,
    ) -> Result<Receipt> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StorageError::from)?;
        let now = Utc::now();

        let written = documents::swap_state(
            &tx,
            document_id,
            DocumentState::Validated,
            DocumentState::Processed,
            None,
            now,
        )?;
        if written == 0 {
            // Dropping the transaction rolls it back.
            return Err(documents::swap_failure(&tx, document_id, "process")?);
        }

        let receipt_id = receipts::insert_receipt(&tx, document_id, fields, now)?;
        let receipt = receipts::get_receipt(&tx, receipt_id)?
            .ok_or_else(|| RcptError::receipt_not_found(receipt_id))?;

        tx.commit().map_err(StorageError::from)?;
        debug!("Committed receipt {} for document {}", receipt_id, document_id);
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use crate::models::receipt::ReceiptItem;

    fn new_doc(name: &str) -> NewDocument {
        NewDocument {
            name: name.to_string(),
            location_ref: format!("uploads/{name}"),
        }
    }

    fn fields(merchant: &str) -> ReceiptFields {
        ReceiptFields {
            merchant_name: Some(merchant.to_string()),
            total_amount: Some(Decimal::from_str("25.99").unwrap()),
            items: vec![ReceiptItem {
                name: "Sample Item".to_string(),
                price: Decimal::from_str("25.99").unwrap(),
            }],
            ..Default::default()
        }
    }

    fn validated(db: &Database, name: &str) -> Document {
        let doc = db.create_document(new_doc(name)).unwrap();
        db.transition(doc.id, DocumentState::Uploaded, DocumentState::Validated, None)
            .unwrap()
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(current_version(&conn), 1);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_create_is_immediately_readable() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_document(new_doc("r.pdf")).unwrap();

        assert_eq!(created.state, DocumentState::Uploaded);
        assert_eq!(created.invalid_reason, None);
        assert_eq!(db.get_document(created.id).unwrap(), created);
        assert_eq!(db.list_documents().unwrap(), vec![created]);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_document(new_doc("a.pdf")).unwrap();
        let b = db.create_document(new_doc("b.pdf")).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn test_get_unknown_document_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_document(42),
            Err(RcptError::NotFound { entity: "document", id: 42 })
        ));
    }

    #[test]
    fn test_transition_updates_state_and_timestamp() {
        let db = Database::open_in_memory().unwrap();
        let doc = db.create_document(new_doc("r.pdf")).unwrap();

        let rejected = db
            .transition(doc.id, DocumentState::Uploaded, DocumentState::Rejected, Some("not found"))
            .unwrap();

        assert_eq!(rejected.state, DocumentState::Rejected);
        assert_eq!(rejected.invalid_reason.as_deref(), Some("not found"));
        assert!(rejected.updated_at >= doc.updated_at);
        assert_eq!(rejected.created_at, doc.created_at);
    }

    #[test]
    fn test_reason_dropped_outside_rejected() {
        let db = Database::open_in_memory().unwrap();
        let doc = db.create_document(new_doc("r.pdf")).unwrap();

        let validated = db
            .transition(doc.id, DocumentState::Uploaded, DocumentState::Validated, Some("ignored"))
            .unwrap();
        assert_eq!(validated.invalid_reason, None);
    }

    #[test]
    fn test_stale_transition_is_precondition() {
        let db = Database::open_in_memory().unwrap();
        let doc = validated(&db, "r.pdf");

        let err = db
            .transition(doc.id, DocumentState::Uploaded, DocumentState::Rejected, Some("late"))
            .unwrap_err();

        assert!(matches!(
            err,
            RcptError::Precondition { state: DocumentState::Validated, operation: "validate", .. }
        ));
        assert_eq!(db.get_document(doc.id).unwrap().state, DocumentState::Validated);
    }

    #[test]
    fn test_transition_unknown_id_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .transition(9, DocumentState::Uploaded, DocumentState::Validated, None)
            .unwrap_err();
        assert!(matches!(err, RcptError::NotFound { id: 9, .. }));
    }

    #[test]
    fn test_illegal_edge_is_refused() {
        let db = Database::open_in_memory().unwrap();
        let doc = db.create_document(new_doc("r.pdf")).unwrap();

        let err = db
            .transition(doc.id, DocumentState::Uploaded, DocumentState::Processed, None)
            .unwrap_err();
        assert!(matches!(err, RcptError::Precondition { .. }));
        assert_eq!(db.get_document(doc.id).unwrap().state, DocumentState::Uploaded);
    }

    #[test]
    fn test_commit_processed_applies_both_effects() {
        let db = Database::open_in_memory().unwrap();
        let doc = validated(&db, "r.pdf");

        let receipt = db.commit_processed(doc.id, &fields("Sample Store")).unwrap();

        assert_eq!(receipt.document_id, doc.id);
        assert_eq!(receipt.fields, fields("Sample Store"));
        assert_eq!(db.get_receipt(receipt.id).unwrap(), receipt);
        assert_eq!(db.get_document(doc.id).unwrap().state, DocumentState::Processed);
    }

    #[test]
    fn test_commit_processed_twice_creates_one_receipt() {
        let db = Database::open_in_memory().unwrap();
        let doc = validated(&db, "r.pdf");

        db.commit_processed(doc.id, &fields("First")).unwrap();
        let err = db.commit_processed(doc.id, &fields("Second")).unwrap_err();

        assert!(matches!(
            err,
            RcptError::Precondition { state: DocumentState::Processed, .. }
        ));
        let page = db.list_receipts(0, 100).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.receipts[0].fields.merchant_name.as_deref(), Some("First"));
    }

    #[test]
    fn test_commit_processed_requires_validated() {
        let db = Database::open_in_memory().unwrap();
        let doc = db.create_document(new_doc("r.pdf")).unwrap();

        let err = db.commit_processed(doc.id, &fields("Store")).unwrap_err();
        assert!(matches!(
            err,
            RcptError::Precondition { state: DocumentState::Uploaded, .. }
        ));
        assert_eq!(db.list_receipts(0, 10).unwrap().total, 0);
    }

    #[test]
    fn test_failed_insert_rolls_back_state() {
        let db = Database::open_in_memory().unwrap();
        let doc = validated(&db, "r.pdf");
        {
            // Force the receipt insert to fail after the state swap.
            let conn = db.lock().unwrap();
            conn.execute_batch(
                "CREATE TRIGGER fail_insert BEFORE INSERT ON receipts
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();
        }

        let err = db.commit_processed(doc.id, &fields("Store")).unwrap_err();

        assert!(matches!(err, RcptError::Storage(_)));
        assert_eq!(db.get_document(doc.id).unwrap().state, DocumentState::Validated);
        assert_eq!(db.list_receipts(0, 10).unwrap().total, 0);
    }

    #[test]
    fn test_list_receipts_pagination() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..5 {
            let doc = validated(&db, &format!("r{i}.pdf"));
            db.commit_processed(doc.id, &fields(&format!("Store {i}"))).unwrap();
        }

        let page = db.list_receipts(0, 100).unwrap();
        assert_eq!(page.total, 5);
        let merchants: Vec<_> = page
            .receipts
            .iter()
            .map(|r| r.fields.merchant_name.clone().unwrap())
            .collect();
        assert_eq!(merchants, vec!["Store 4", "Store 3", "Store 2", "Store 1", "Store 0"]);

        let window = db.list_receipts(1, 2).unwrap();
        assert_eq!(window.total, 5);
        assert_eq!(window.receipts.len(), 2);
        assert_eq!(window.receipts[0].fields.merchant_name.as_deref(), Some("Store 3"));

        let beyond = db.list_receipts(50, 10).unwrap();
        assert!(beyond.receipts.is_empty());
        assert_eq!(beyond.total, 5);
    }

    #[test]
    fn test_corrupt_amount_is_reported() {
        let db = Database::open_in_memory().unwrap();
        let doc = validated(&db, "r.pdf");
        let receipt = db.commit_processed(doc.id, &fields("Store")).unwrap();
        {
            let conn = db.lock().unwrap();
            conn.execute(
                "UPDATE receipts SET total_amount = 'lots' WHERE id = ?1",
                [receipt.id],
            )
            .unwrap();
        }

        let err = db.get_receipt(receipt.id).unwrap_err();
        assert!(matches!(
            err,
            RcptError::Storage(StorageError::Corrupt { field: "total_amount", .. })
        ));
    }

    #[test]
    fn test_reopen_file_database_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("receipts.db");

        let db = Database::open(&path).unwrap();
        let doc = db.create_document(new_doc("r.pdf")).unwrap();
        db.close().unwrap();

        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_document(doc.id).unwrap().name, "r.pdf");
    }
}
