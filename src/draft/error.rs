//! Command error types.

use thiserror::Error;

use crate::storage::{InvalidIdError, RevisionId, StorageError};

/// Result type for draft commands.
pub type DraftResult<T> = Result<T, DraftError>;

/// Errors raised by versioning commands.
///
/// Every variant except `Storage` is a user-facing bad request: a
/// precondition the caller violated. None of them are retryable.
#[derive(Debug, Error)]
pub enum DraftError {
    /// A mutating command targeted a revision that is not a draft.
    #[error("The revision is not a draft")]
    NotADraft { revision: RevisionId },

    /// A revision, branch, table or row does not exist where it was expected.
    #[error("{0}")]
    NotFound(String),

    /// An id already exists, or the request repeats itself.
    #[error("{0}")]
    Conflict(String),

    /// An id violates the naming grammar.
    #[error("Invalid id \"{id}\": {reason}")]
    MalformedId { id: String, reason: InvalidIdError },

    /// Commit/revert without changes, or without a resolvable head/draft/parent.
    #[error("{0}")]
    Precondition(String),

    /// Persistence fault, passed through untouched.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DraftError {
    pub(crate) fn revision_not_found(revision: &RevisionId) -> Self {
        Self::NotFound(format!("Revision {} not found", revision))
    }

    pub(crate) fn table_not_found(table_id: &str, revision: &RevisionId) -> Self {
        Self::NotFound(format!(
            "Table \"{}\" not found in revision {}",
            table_id, revision
        ))
    }

    pub(crate) fn row_not_found(row_id: &str, table_id: &str) -> Self {
        Self::NotFound(format!("Row \"{}\" not found in table \"{}\"", row_id, table_id))
    }

    pub(crate) fn malformed(id: &str, reason: InvalidIdError) -> Self {
        Self::MalformedId {
            id: id.to_string(),
            reason,
        }
    }

    /// check if this is a user-facing validation failure
    pub fn is_bad_request(&self) -> bool {
        !matches!(self, DraftError::Storage(_))
    }

    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, DraftError::NotFound(_))
    }

    /// check if this error is a conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, DraftError::Conflict(_))
    }
}
