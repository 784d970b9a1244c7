//! Uploaded document records and their lifecycle states.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Surrogate key of a document row.
pub type DocumentId = i64;

/// A submitted file and where it stands in the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Monotonic id assigned at creation.
    pub id: DocumentId,

    /// Original file name as submitted.
    pub name: String,

    /// Opaque reference to the stored bytes.
    pub location_ref: String,

    /// Current lifecycle state.
    pub state: DocumentState,

    /// Why validation failed. Present only for rejected documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Advances on every state change.
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the upload path when a document is created.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub location_ref: String,
}

/// Lifecycle state of a document.
///
/// Legal paths are `Uploaded -> Validated -> Processed` and
/// `Uploaded -> Rejected`. `Rejected` and `Processed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    Uploaded,
    Validated,
    Rejected,
    Processed,
}

impl DocumentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Validated => "validated",
            Self::Rejected => "rejected",
            Self::Processed => "processed",
        }
    }

    /// Whether no further transition can leave this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Processed)
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    pub fn can_transition_to(&self, next: DocumentState) -> bool {
        matches!(
            (self, next),
            (Self::Uploaded, Self::Validated)
                | (Self::Uploaded, Self::Rejected)
                | (Self::Validated, Self::Processed)
        )
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentState {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(Self::Uploaded),
            "validated" => Ok(Self::Validated),
            "rejected" => Ok(Self::Rejected),
            "processed" => Ok(Self::Processed),
            _ => Err(StorageError::Corrupt {
                field: "state",
                value: s.to_string(),
            }),
        }
    }
}
