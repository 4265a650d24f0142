//! Error types for the Linekit core library.

use thiserror::Error;

/// Message carried by every [`LinekitError::MalformedChangeSet`].
pub const MALFORMED_DATA_MESSAGE: &str = "Data for processing line items is malformed.";

/// Message carried by every [`LinekitError::RowMatchFailed`].
pub const LINE_ITEM_MATCH_MESSAGE: &str = "Unable to find matching line item with the given field.";

/// All errors that can occur within the Linekit core library.
#[derive(Debug, Error)]
pub enum LinekitError {
    /// A sublist request was structurally invalid (no `index` and no `match`,
    /// a `match` without its comparison value, or position `0`).
    #[error("Data for processing line items is malformed: {0}")]
    MalformedChangeSet(String),

    /// A field-match scan exhausted the sublist without finding an equal value.
    #[error("Unable to find matching line item with the given field: {field} on sublist {sublist}")]
    RowMatchFailed { sublist: String, field: String },

    /// A generic failure reported by the host platform.
    #[error("Host error: {0}")]
    Host(String),

    /// A record id was requested that the host does not know.
    #[error("Record not found: {record_type} {id}")]
    RecordNotFound { record_type: String, id: String },

    /// A line-item position outside the sublist's valid range.
    #[error("Invalid line item position {position} on sublist {sublist} ({count} rows)")]
    InvalidPosition {
        sublist: String,
        position: usize,
        count: usize,
    },

    /// A mandatory field was empty when submitting a record.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// A saved search id that has not been stored.
    #[error("Saved search not found: {0}")]
    SavedSearchNotFound(String),

    /// A search shape the host cannot evaluate.
    #[error("Unsupported search: {0}")]
    UnsupportedSearch(String),

    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored record data could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`LinekitError`].
///
/// Callers should branch on the kind rather than on individual variants: every
/// error raised by a host facade is opaque to the reconciler and reported as
/// [`ErrorKind::HostAccessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedChangeSet,
    RowMatchFailed,
    HostAccessor,
}

/// Convenience alias that pins the error type to [`LinekitError`].
pub type Result<T> = std::result::Result<T, LinekitError>;

impl LinekitError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedChangeSet(_) => ErrorKind::MalformedChangeSet,
            Self::RowMatchFailed { .. } => ErrorKind::RowMatchFailed,
            _ => ErrorKind::HostAccessor,
        }
    }

    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MalformedChangeSet(_) => MALFORMED_DATA_MESSAGE.to_string(),
            Self::RowMatchFailed { .. } => LINE_ITEM_MATCH_MESSAGE.to_string(),
            Self::Host(msg) => msg.clone(),
            Self::RecordNotFound { .. } => "Record no longer exists".to_string(),
            Self::InvalidPosition { position, .. } => {
                format!("No line item at position {position}")
            }
            Self::ValidationFailed(msg) => msg.clone(),
            Self::SavedSearchNotFound(id) => format!("Unknown saved search: {id}"),
            Self::UnsupportedSearch(msg) => msg.clone(),
            Self::Database(e) => format!("Failed to save: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
            Self::Io(e) => format!("File error: {e}"),
        }
    }
}
