//! Document table access.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{RcptError, StorageError};
use crate::models::document::{Document, DocumentId, DocumentState, NewDocument};

const COLUMNS: &str = "id, name, location_ref, state, invalid_reason, created_at, updated_at";

pub(super) fn insert_document(
    conn: &Connection,
    new: &NewDocument,
    now: DateTime<Utc>,
) -> Result<DocumentId, StorageError> {
    conn.execute(
        "INSERT INTO documents (name, location_ref, state, invalid_reason, created_at, updated_at)
         VALUES (?1, ?2, ?3, NULL, ?4, ?4)",
        params![
            new.name,
            new.location_ref,
            DocumentState::Uploaded.as_str(),
            now
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(super) fn get_document(
    conn: &Connection,
    id: DocumentId,
) -> Result<Option<Document>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM documents WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id], DocumentRow::from_row)
        .optional()?;
    row.map(DocumentRow::into_document).transpose()
}

pub(super) fn current_state(
    conn: &Connection,
    id: DocumentId,
) -> Result<Option<DocumentState>, StorageError> {
    let state: Option<String> = conn
        .query_row(
            "SELECT state FROM documents WHERE id = ?1",
            params![id],
            |row| row.get("state"),
        )
        .optional()?;
    state.map(|s| s.parse()).transpose()
}

/// Conditionally move a document from `from` to `to`. Returns the number of
/// rows written (0 or 1).
pub(super) fn swap_state(
    conn: &Connection,
    id: DocumentId,
    from: DocumentState,
    to: DocumentState,
    invalid_reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<usize, StorageError> {
    let rows = conn.execute(
        "UPDATE documents SET state = ?3, invalid_reason = ?4, updated_at = ?5
         WHERE id = ?1 AND state = ?2",
        params![id, from.as_str(), to.as_str(), invalid_reason, now],
    )?;
    Ok(rows)
}

/// Explain why a compare-and-swap on `id` wrote nothing.
pub(super) fn swap_failure(
    conn: &Connection,
    id: DocumentId,
    operation: &'static str,
) -> Result<RcptError, StorageError> {
    Ok(match current_state(conn, id)? {
        Some(state) => RcptError::Precondition {
            id,
            state,
            operation,
        },
        None => RcptError::document_not_found(id),
    })
}

pub(super) fn list_documents(conn: &Connection) -> Result<Vec<Document>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM documents ORDER BY created_at DESC, id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], DocumentRow::from_row)?;

    let mut documents = Vec::new();
    for row in rows {
        documents.push(row?.into_document()?);
    }
    Ok(documents)
}

/// Raw column values before enum decoding.
struct DocumentRow {
    id: DocumentId,
    name: String,
    location_ref: String,
    state: String,
    invalid_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            location_ref: row.get("location_ref")?,
            state: row.get("state")?,
            invalid_reason: row.get("invalid_reason")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_document(self) -> Result<Document, StorageError> {
        Ok(Document {
            id: self.id,
            name: self.name,
            location_ref: self.location_ref,
            state: self.state.parse()?,
            invalid_reason: self.invalid_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
