//! Storage layer error types
//!
//! These are persistence faults, not user mistakes. Validation failures live
//! in `draft::DraftError`; anything here is fatal to the command that hit it.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::types::{BranchId, RevisionId, VersionId};

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// a record with this primary key already exists
    #[error("duplicate {kind} record: {id}")]
    Duplicate { kind: &'static str, id: String },

    /// an update or link referenced a record that does not exist
    #[error("{kind} record not found: {id}")]
    MissingRecord { kind: &'static str, id: String },

    /// a version was deleted while something still links it
    #[error("{kind} version {version} is still referenced by {references} parent(s)")]
    StillReferenced {
        kind: &'static str,
        version: VersionId,
        references: usize,
    },

    /// the branch already exists
    #[error("branch already exists: {0}")]
    BranchAlreadyExists(BranchId),

    /// a revision points at a branch the store does not know
    #[error("revision {revision} references unknown branch {branch}")]
    UnknownBranch {
        revision: RevisionId,
        branch: BranchId,
    },

    /// JSON serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// snapshot file failed an integrity check on load
    #[error("corrupted snapshot at {path}: {reason}")]
    CorruptedSnapshot { path: PathBuf, reason: String },

    /// I/O error (filesystem level)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// writing the snapshot into place failed
    #[error("failed to persist snapshot to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// internal error that shouldn't happen
    #[error("internal error: {0}")]
    Internal(String),
}

impl StorageError {
    pub(crate) fn duplicate(kind: &'static str, id: impl ToString) -> Self {
        Self::Duplicate {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn missing(kind: &'static str, id: impl ToString) -> Self {
        Self::MissingRecord {
            kind,
            id: id.to_string(),
        }
    }

    /// check if this error is an integrity violation of the version graph
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Duplicate { .. }
                | StorageError::MissingRecord { .. }
                | StorageError::StillReferenced { .. }
                | StorageError::UnknownBranch { .. }
        )
    }

    /// check if this error came from the filesystem
    pub fn is_io(&self) -> bool {
        matches!(self, StorageError::Io(_) | StorageError::Persist { .. })
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = StorageError::StillReferenced {
            kind: "table",
            version: VersionId::from("v1"),
            references: 2,
        };
        assert!(err.is_integrity_violation());
        assert!(!err.is_io());
        assert_eq!(
            err.to_string(),
            "table version v1 is still referenced by 2 parent(s)"
        );

        let io = StorageError::Io(std::io::Error::other("disk"));
        assert!(io.is_io());
        assert!(!io.is_integrity_violation());
    }
}
