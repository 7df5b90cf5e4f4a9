//! Database API - high-level interface for revdb.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::draft::{
    self, diff_revisions, CreateRowsInput, CreateRowsResult, CreateTableInput,
    CreateTableResult, DraftError, DraftResult, RemoveRowsInput, RemoveRowsResult,
    RemoveTableInput, RemoveTableResult, RenameRowsInput, RenameRowsResult, RenameTableInput,
    RenameTableResult, RevisionDiff, UpdateRowsInput, UpdateRowsResult,
};
use crate::revision::{
    self, CommitInput, CommitResult, CreateBranchInput, CreateBranchResult, GarbageReport,
    RevertInput, RevertResult,
};
use crate::storage::{
    BranchId, BranchRecord, GatewayRead, MemoryStore, RevisionId, RevisionRecord, RevisionRole,
    RowRecord, StorageError, StoreTx, TableRecord,
};

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("database not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DatabaseError {
    /// check if the caller sent a request that can never succeed as is
    pub fn is_bad_request(&self) -> bool {
        matches!(self, DatabaseError::Draft(e) if e.is_bad_request())
    }

    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        match self {
            DatabaseError::Draft(e) => e.is_not_found(),
            DatabaseError::NotFound(_) => true,
            _ => false,
        }
    }

    /// check if this error is a conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, DatabaseError::Draft(e) if e.is_conflict())
    }
}

/// Database configuration options.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Snapshot file. `None` keeps everything in memory.
    pub path: Option<PathBuf>,
    /// Create if doesn't exist.
    pub create_if_missing: bool,
    /// Branch created on first open.
    pub default_branch: String,
    /// Write the snapshot after every committed transaction.
    pub persist_on_commit: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            create_if_missing: true,
            default_branch: BranchId::MAIN.to_string(),
            persist_on_commit: true,
        }
    }
}

impl DatabaseConfig {
    /// Create a new configuration backed by the given snapshot file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Set create_if_missing flag.
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Set the default branch name.
    pub fn default_branch(mut self, name: impl Into<String>) -> Self {
        self.default_branch = name.into();
        self
    }

    /// Set persist_on_commit flag.
    pub fn persist_on_commit(mut self, value: bool) -> Self {
        self.persist_on_commit = value;
        self
    }
}

/// The main database handle.
///
/// Every command runs in its own store transaction: it either commits whole
/// or leaves no trace. Commands on one handle (or clones of its store)
/// serialize on the store's write lock.
pub struct Database {
    config: DatabaseConfig,
    default_branch: BranchId,
    store: MemoryStore,
}

impl Database {
    /// Open or create a database backed by the given snapshot file.
    pub fn open(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        Self::open_with_config(DatabaseConfig::new(path.as_ref()))
    }

    /// Open or create a database with custom configuration.
    pub fn open_with_config(config: DatabaseConfig) -> DatabaseResult<Self> {
        let default_branch = BranchId::new(config.default_branch.as_str()).map_err(|e| {
            DatabaseError::InvalidConfig(format!(
                "default branch \"{}\": {}",
                config.default_branch, e
            ))
        })?;

        let store = match &config.path {
            Some(path) if !path.exists() && !config.create_if_missing => {
                return Err(DatabaseError::NotFound(path.clone()));
            }
            Some(path) => MemoryStore::open(path, config.persist_on_commit)?,
            None => MemoryStore::new(),
        };

        let db = Self {
            config,
            default_branch,
            store,
        };

        let missing = db.store.read(|state| state.branch(&db.default_branch).is_none());
        if missing {
            let created = db.create_branch(CreateBranchInput {
                branch_id: db.default_branch.as_str().to_string(),
                from_revision_id: None,
            })?;
            info!(branch = %created.branch_id, "initialized default branch");
        }

        Ok(db)
    }

    /// Create a new in-memory database.
    pub fn in_memory() -> DatabaseResult<Self> {
        Self::open_with_config(DatabaseConfig::default())
    }

    /// Run `f` inside one store transaction.
    ///
    /// The transaction commits when `f` succeeds and rolls back otherwise.
    pub fn transaction<F, T>(&self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&mut StoreTx<'_>) -> DraftResult<T>,
    {
        let mut tx = self.store.begin();
        match f(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                debug!(error = %e, operations = tx.pending_operations(), "rolling back command");
                tx.rollback();
                Err(e.into())
            }
        }
    }

    // ---- branches and revisions ----

    pub fn create_branch(&self, input: CreateBranchInput) -> DatabaseResult<CreateBranchResult> {
        self.transaction(|tx| revision::create_branch(tx, input))
    }

    /// Promote the branch's draft to head.
    pub fn commit(&self, branch: &str, comment: Option<String>) -> DatabaseResult<CommitResult> {
        let branch_id = parse_branch(branch)?;
        self.transaction(|tx| revision::commit(tx, CommitInput { branch_id, comment }))
    }

    /// Reset the branch's draft to its head.
    pub fn revert(&self, branch: &str) -> DatabaseResult<RevertResult> {
        let branch_id = parse_branch(branch)?;
        self.transaction(|tx| revision::revert(tx, RevertInput { branch_id }))
    }

    /// Delete every version no longer reachable from a revision.
    pub fn collect_garbage(&self) -> DatabaseResult<GarbageReport> {
        self.transaction(|tx| revision::collect_garbage(tx))
    }

    // ---- table commands ----

    pub fn create_table(&self, input: CreateTableInput) -> DatabaseResult<CreateTableResult> {
        self.transaction(|tx| draft::create_table(tx, input))
    }

    pub fn rename_table(&self, input: RenameTableInput) -> DatabaseResult<RenameTableResult> {
        self.transaction(|tx| draft::rename_table(tx, input))
    }

    pub fn remove_table(&self, input: RemoveTableInput) -> DatabaseResult<RemoveTableResult> {
        self.transaction(|tx| draft::remove_table(tx, input))
    }

    // ---- row commands ----

    pub fn create_rows(&self, input: CreateRowsInput) -> DatabaseResult<CreateRowsResult> {
        self.transaction(|tx| draft::create_rows(tx, input))
    }

    pub fn update_rows(&self, input: UpdateRowsInput) -> DatabaseResult<UpdateRowsResult> {
        self.transaction(|tx| draft::update_rows(tx, input))
    }

    pub fn remove_rows(&self, input: RemoveRowsInput) -> DatabaseResult<RemoveRowsResult> {
        self.transaction(|tx| draft::remove_rows(tx, input))
    }

    pub fn rename_rows(&self, input: RenameRowsInput) -> DatabaseResult<RenameRowsResult> {
        self.transaction(|tx| draft::rename_rows(tx, input))
    }

    // ---- queries ----

    pub fn branches(&self) -> Vec<BranchRecord> {
        self.store.read(|state| state.branches())
    }

    /// The branch's current head revision.
    pub fn head(&self, branch: &str) -> DatabaseResult<RevisionRecord> {
        self.find_revision(branch, RevisionRole::Head)
    }

    /// The branch's current draft revision.
    pub fn draft(&self, branch: &str) -> DatabaseResult<RevisionRecord> {
        self.find_revision(branch, RevisionRole::Draft)
    }

    fn find_revision(&self, branch: &str, role: RevisionRole) -> DatabaseResult<RevisionRecord> {
        let branch_id = parse_branch(branch)?;
        self.store
            .read(|state| state.find_revision(&branch_id, role))
            .ok_or_else(|| {
                DraftError::NotFound(format!("No {} revision on branch \"{}\"", role, branch_id))
                    .into()
            })
    }

    pub fn revision(&self, id: &RevisionId) -> DatabaseResult<RevisionRecord> {
        self.store
            .read(|state| state.revision(id))
            .ok_or_else(|| DraftError::revision_not_found(id).into())
    }

    /// Table versions linked to a revision.
    pub fn tables(&self, revision: &RevisionId) -> DatabaseResult<Vec<TableRecord>> {
        self.store.read(|state| -> DatabaseResult<Vec<TableRecord>> {
            state
                .revision(revision)
                .ok_or_else(|| DraftError::revision_not_found(revision))?;
            Ok(state.revision_tables(revision))
        })
    }

    pub fn table(&self, revision: &RevisionId, table_id: &str) -> DatabaseResult<TableRecord> {
        self.store
            .read(|state| state.find_table(revision, table_id))
            .ok_or_else(|| DraftError::table_not_found(table_id, revision).into())
    }

    /// Row versions of a table as seen from a revision.
    pub fn rows(&self, revision: &RevisionId, table_id: &str) -> DatabaseResult<Vec<RowRecord>> {
        self.store.read(|state| -> DatabaseResult<Vec<RowRecord>> {
            let table = state
                .find_table(revision, table_id)
                .ok_or_else(|| DraftError::table_not_found(table_id, revision))?;
            Ok(state.table_rows(&table.version_id))
        })
    }

    pub fn row(
        &self,
        revision: &RevisionId,
        table_id: &str,
        row_id: &str,
    ) -> DatabaseResult<RowRecord> {
        self.store.read(|state| -> DatabaseResult<RowRecord> {
            let table = state
                .find_table(revision, table_id)
                .ok_or_else(|| DraftError::table_not_found(table_id, revision))?;
            state
                .find_row(&table.version_id, row_id)
                .ok_or_else(|| DraftError::row_not_found(row_id, table.id.as_str()).into())
        })
    }

    /// Committed revisions of a branch, newest first.
    pub fn history(&self, branch: &str, limit: Option<usize>) -> DatabaseResult<Vec<RevisionRecord>> {
        let branch_id = parse_branch(branch)?;
        Ok(self
            .store
            .read(|state| revision::history(state, &branch_id, limit))?)
    }

    /// Structural difference between two revisions.
    pub fn diff(&self, from: &RevisionId, to: &RevisionId) -> DatabaseResult<RevisionDiff> {
        self.store.read(|state| -> DatabaseResult<RevisionDiff> {
            for id in [from, to] {
                state
                    .revision(id)
                    .ok_or_else(|| DraftError::revision_not_found(id))?;
            }
            Ok(diff_revisions(state, from, to))
        })
    }

    /// Get database statistics.
    pub fn stats(&self) -> DatabaseStats {
        self.store.read(|state| {
            let branches = state.branches();
            DatabaseStats {
                revisions: branches
                    .iter()
                    .map(|branch| state.branch_revisions(&branch.id).len())
                    .sum(),
                branches: branches.len(),
                table_versions: state.table_versions().len(),
                row_versions: state.row_versions().len(),
            }
        })
    }

    // ---- handle ----

    /// Write the snapshot now.
    pub fn save(&self) -> DatabaseResult<()> {
        Ok(self.store.save()?)
    }

    /// Get the snapshot path, if file backed.
    pub fn path(&self) -> Option<&Path> {
        self.config.path.as_deref()
    }

    /// Get the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn default_branch(&self) -> &BranchId {
        &self.default_branch
    }

    /// The underlying store, for direct gateway access.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

fn parse_branch(branch: &str) -> DraftResult<BranchId> {
    BranchId::new(branch).map_err(|e| DraftError::malformed(branch, e))
}

/// Database statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseStats {
    pub branches: usize,
    pub revisions: usize,
    /// Physical table versions, shared or not.
    pub table_versions: usize,
    pub row_versions: usize,
}
