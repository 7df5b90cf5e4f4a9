//! Snapshot persistence for the in-memory store.
//!
//! The whole store is written as one JSON document:
//! ```text
//! {
//!   "format": 1,
//!   "saved_at": "xxxx-xx-xxT00:00:00Z",
//!   "state": { "branches": {..}, "revisions": {..}, "tables": {..}, ... }
//! }
//! ```
//! Writes go to a temp file in the same directory which is then renamed over
//! the target, so a crash mid-write never leaves a torn snapshot behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::memory::StoreState;

/// current snapshot format version
const FORMAT: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format: u32,
    saved_at: DateTime<Utc>,
    state: &'a StoreState,
}

#[derive(Deserialize)]
struct SnapshotFile {
    format: u32,
    #[allow(dead_code)]
    saved_at: DateTime<Utc>,
    state: StoreState,
}

/// write the state to `path` atomically
pub fn write(path: &Path, state: &StoreState) -> StorageResult<()> {
    let snapshot = SnapshotRef {
        format: FORMAT,
        saved_at: Utc::now(),
        state,
    };
    let bytes = serde_json::to_vec_pretty(&snapshot)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| {
        warn!(path = %path.display(), error = %e.error, "snapshot rename failed");
        StorageError::Persist {
            path: path.to_path_buf(),
            source: e.error,
        }
    })?;

    debug!(path = %path.display(), bytes = bytes.len(), "snapshot written");
    Ok(())
}

/// read and validate the state stored at `path`
pub fn read(path: &Path) -> StorageResult<StoreState> {
    let bytes = std::fs::read(path)?;
    let snapshot: SnapshotFile = serde_json::from_slice(&bytes)?;

    if snapshot.format != FORMAT {
        return Err(StorageError::CorruptedSnapshot {
            path: path.to_path_buf(),
            reason: format!(
                "unsupported format {} (expected {})",
                snapshot.format, FORMAT
            ),
        });
    }

    let mut state = snapshot.state;
    state.rebuild_indexes();
    state
        .check_integrity()
        .map_err(|reason| StorageError::CorruptedSnapshot {
            path: path.to_path_buf(),
            reason,
        })?;

    debug!(path = %path.display(), "snapshot loaded");
    Ok(state)
}
