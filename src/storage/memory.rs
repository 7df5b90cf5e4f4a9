//! In-memory transactional store.
//!
//! `MemoryStore` keeps the whole version graph in ordered maps behind a
//! `parking_lot::RwLock`. A `StoreTx` holds the write guard for its entire
//! lifetime, which serializes writers: the read-flag-then-copy sequence of the
//! copy-on-write primitives can never interleave with another command.
//!
//! Every mutation made through a `StoreTx` pushes its inverse onto a journal.
//! `commit` discards the journal (and writes a snapshot when the store is file
//! backed); dropping an uncommitted transaction replays the journal backwards,
//! so a failed command leaves no trace.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::gateway::{Gateway, GatewayRead};
use crate::storage::records::{BranchRecord, RevisionRecord, RowRecord, TableRecord};
use crate::storage::snapshot;
use crate::storage::types::{BranchId, RevisionId, VersionId};

/// The raw contents of the store.
///
/// Forward link maps are persisted; the reverse maps are derived and rebuilt
/// on load.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    branches: BTreeMap<BranchId, BranchRecord>,
    revisions: BTreeMap<RevisionId, RevisionRecord>,
    tables: BTreeMap<VersionId, TableRecord>,
    rows: BTreeMap<VersionId, RowRecord>,
    revision_tables: BTreeMap<RevisionId, BTreeSet<VersionId>>,
    table_rows: BTreeMap<VersionId, BTreeSet<VersionId>>,
    #[serde(skip)]
    table_revisions: BTreeMap<VersionId, BTreeSet<RevisionId>>,
    #[serde(skip)]
    row_tables: BTreeMap<VersionId, BTreeSet<VersionId>>,
}

impl StoreState {
    /// true when the store holds no branches at all
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub(crate) fn rebuild_indexes(&mut self) {
        self.table_revisions.clear();
        for (revision, tables) in &self.revision_tables {
            for table in tables {
                self.table_revisions
                    .entry(table.clone())
                    .or_default()
                    .insert(revision.clone());
            }
        }

        self.row_tables.clear();
        for (table, rows) in &self.table_rows {
            for row in rows {
                self.row_tables
                    .entry(row.clone())
                    .or_default()
                    .insert(table.clone());
            }
        }
    }

    /// check that every link and every revision points at a live record
    pub(crate) fn check_integrity(&self) -> Result<(), String> {
        for revision in self.revisions.values() {
            if !self.branches.contains_key(&revision.branch_id) {
                return Err(format!(
                    "revision {} references unknown branch {}",
                    revision.id, revision.branch_id
                ));
            }
        }
        for (revision, tables) in &self.revision_tables {
            if !self.revisions.contains_key(revision) {
                return Err(format!("link from unknown revision {}", revision));
            }
            if let Some(table) = tables.iter().find(|t| !self.tables.contains_key(*t)) {
                return Err(format!("revision {} links unknown table {}", revision, table));
            }
        }
        for (table, rows) in &self.table_rows {
            if !self.tables.contains_key(table) {
                return Err(format!("link from unknown table {}", table));
            }
            if let Some(row) = rows.iter().find(|r| !self.rows.contains_key(*r)) {
                return Err(format!("table {} links unknown row {}", table, row));
            }
        }
        Ok(())
    }

    // ==================== Raw Mutations ====================
    //
    // These return the previous state so the transaction can journal it.

    fn put_branch(&mut self, record: BranchRecord) -> Option<BranchRecord> {
        self.branches.insert(record.id.clone(), record)
    }

    fn remove_branch(&mut self, id: &BranchId) -> Option<BranchRecord> {
        self.branches.remove(id)
    }

    fn put_revision(&mut self, record: RevisionRecord) -> Option<RevisionRecord> {
        self.revisions.insert(record.id.clone(), record)
    }

    fn remove_revision(&mut self, id: &RevisionId) -> Option<RevisionRecord> {
        self.revisions.remove(id)
    }

    fn put_table(&mut self, record: TableRecord) -> Option<TableRecord> {
        self.tables.insert(record.version_id.clone(), record)
    }

    fn remove_table(&mut self, version: &VersionId) -> Option<TableRecord> {
        self.tables.remove(version)
    }

    fn put_row(&mut self, record: RowRecord) -> Option<RowRecord> {
        self.rows.insert(record.version_id.clone(), record)
    }

    fn remove_row(&mut self, version: &VersionId) -> Option<RowRecord> {
        self.rows.remove(version)
    }

    fn set_revision_table(&mut self, revision: &RevisionId, table: &VersionId, linked: bool) -> bool {
        let was_linked = set_link(&mut self.revision_tables, revision, table, linked);
        set_link(&mut self.table_revisions, table, revision, linked);
        was_linked
    }

    fn set_table_row(&mut self, table: &VersionId, row: &VersionId, linked: bool) -> bool {
        let was_linked = set_link(&mut self.table_rows, table, row, linked);
        set_link(&mut self.row_tables, row, table, linked);
        was_linked
    }
}

/// Add or remove `to` from the link set of `from`, dropping empty sets so the
/// map stays canonical. Returns whether the link existed before.
fn set_link<K, V>(map: &mut BTreeMap<K, BTreeSet<V>>, from: &K, to: &V, linked: bool) -> bool
where
    K: Ord + Clone,
    V: Ord + Clone,
{
    if linked {
        !map.entry(from.clone()).or_default().insert(to.clone())
    } else {
        let Some(set) = map.get_mut(from) else {
            return false;
        };
        let existed = set.remove(to);
        if set.is_empty() {
            map.remove(from);
        }
        existed
    }
}

impl GatewayRead for StoreState {
    fn branch(&self, id: &BranchId) -> Option<BranchRecord> {
        self.branches.get(id).cloned()
    }

    fn branches(&self) -> Vec<BranchRecord> {
        self.branches.values().cloned().collect()
    }

    fn revision(&self, id: &RevisionId) -> Option<RevisionRecord> {
        self.revisions.get(id).cloned()
    }

    fn branch_revisions(&self, branch: &BranchId) -> Vec<RevisionRecord> {
        let mut revisions: Vec<RevisionRecord> = self
            .revisions
            .values()
            .filter(|r| &r.branch_id == branch)
            .cloned()
            .collect();
        revisions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        revisions
    }

    fn table(&self, version: &VersionId) -> Option<TableRecord> {
        self.tables.get(version).cloned()
    }

    fn revision_tables(&self, revision: &RevisionId) -> Vec<TableRecord> {
        self.revision_tables
            .get(revision)
            .map(|versions| {
                versions
                    .iter()
                    .filter_map(|v| self.tables.get(v).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn table_revisions(&self, version: &VersionId) -> Vec<RevisionId> {
        self.table_revisions
            .get(version)
            .map(|revisions| revisions.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn row(&self, version: &VersionId) -> Option<RowRecord> {
        self.rows.get(version).cloned()
    }

    fn table_rows(&self, table: &VersionId) -> Vec<RowRecord> {
        self.table_rows
            .get(table)
            .map(|versions| {
                versions
                    .iter()
                    .filter_map(|v| self.rows.get(v).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn row_tables(&self, version: &VersionId) -> Vec<VersionId> {
        self.row_tables
            .get(version)
            .map(|tables| tables.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn table_versions(&self) -> Vec<VersionId> {
        self.tables.keys().cloned().collect()
    }

    fn row_versions(&self) -> Vec<VersionId> {
        self.rows.keys().cloned().collect()
    }
}

/// The in-memory store.
///
/// Clone this to share across threads - it uses Arc internally.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

struct MemoryStoreInner {
    state: RwLock<StoreState>,
    snapshot_path: Option<PathBuf>,
    persist_on_commit: bool,
}

impl MemoryStore {
    /// Create an empty store that never touches the filesystem.
    pub fn new() -> Self {
        Self::from_state(StoreState::default(), None, false)
    }

    /// Open a file-backed store, loading the snapshot if one exists.
    pub fn open(path: impl AsRef<Path>, persist_on_commit: bool) -> StorageResult<Self> {
        let path = path.as_ref();
        let state = if path.exists() {
            snapshot::read(path)?
        } else {
            StoreState::default()
        };
        Ok(Self::from_state(state, Some(path.to_path_buf()), persist_on_commit))
    }

    fn from_state(state: StoreState, snapshot_path: Option<PathBuf>, persist_on_commit: bool) -> Self {
        Self {
            inner: Arc::new(MemoryStoreInner {
                state: RwLock::new(state),
                snapshot_path,
                persist_on_commit,
            }),
        }
    }

    /// The snapshot file, if the store is file backed.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.inner.snapshot_path.as_deref()
    }

    /// Execute a function with read access to the committed state.
    pub fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&StoreState) -> T,
    {
        let state = self.inner.state.read();
        f(&state)
    }

    /// Begin a transaction. Blocks until no other transaction is open.
    pub fn begin(&self) -> StoreTx<'_> {
        let persist_to = if self.inner.persist_on_commit {
            self.inner.snapshot_path.as_deref()
        } else {
            None
        };
        StoreTx {
            state: self.inner.state.write(),
            journal: Vec::new(),
            persist_to,
            finished: false,
        }
    }

    /// Write the snapshot now, regardless of `persist_on_commit`.
    pub fn save(&self) -> StorageResult<()> {
        let path = self
            .inner
            .snapshot_path
            .as_deref()
            .ok_or_else(|| StorageError::Internal("store has no snapshot path".to_string()))?;
        let state = self.inner.state.read();
        snapshot::write(path, &state)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("snapshot_path", &self.inner.snapshot_path)
            .field("persist_on_commit", &self.inner.persist_on_commit)
            .finish()
    }
}

/// One inverse operation in the transaction journal.
#[derive(Debug)]
enum Undo {
    Branch(BranchId, Option<BranchRecord>),
    Revision(RevisionId, Option<RevisionRecord>),
    Table(VersionId, Option<TableRecord>),
    Row(VersionId, Option<RowRecord>),
    RevisionTable {
        revision: RevisionId,
        table: VersionId,
        was_linked: bool,
    },
    TableRow {
        table: VersionId,
        row: VersionId,
        was_linked: bool,
    },
}

impl Undo {
    fn apply(self, state: &mut StoreState) {
        match self {
            Undo::Branch(id, previous) => match previous {
                Some(record) => {
                    state.put_branch(record);
                }
                None => {
                    state.remove_branch(&id);
                }
            },
            Undo::Revision(id, previous) => match previous {
                Some(record) => {
                    state.put_revision(record);
                }
                None => {
                    state.remove_revision(&id);
                }
            },
            Undo::Table(version, previous) => match previous {
                Some(record) => {
                    state.put_table(record);
                }
                None => {
                    state.remove_table(&version);
                }
            },
            Undo::Row(version, previous) => match previous {
                Some(record) => {
                    state.put_row(record);
                }
                None => {
                    state.remove_row(&version);
                }
            },
            Undo::RevisionTable {
                revision,
                table,
                was_linked,
            } => {
                state.set_revision_table(&revision, &table, was_linked);
            }
            Undo::TableRow {
                table,
                row,
                was_linked,
            } => {
                state.set_table_row(&table, &row, was_linked);
            }
        }
    }
}

/// An open transaction against a `MemoryStore`.
///
/// Dropping it without calling [`StoreTx::commit`] rolls back every change.
pub struct StoreTx<'a> {
    state: RwLockWriteGuard<'a, StoreState>,
    journal: Vec<Undo>,
    persist_to: Option<&'a Path>,
    finished: bool,
}

impl<'a> StoreTx<'a> {
    /// Make the transaction's changes permanent.
    ///
    /// If the snapshot cannot be written the transaction is rolled back and
    /// the error returned.
    pub fn commit(mut self) -> StorageResult<()> {
        if let Some(path) = self.persist_to {
            if !self.journal.is_empty() {
                snapshot::write(path, &self.state)?;
            }
        }
        debug!(operations = self.journal.len(), "store transaction committed");
        self.journal.clear();
        self.finished = true;
        Ok(())
    }

    /// Discard every change made in this transaction.
    pub fn rollback(mut self) {
        self.undo_all();
        self.finished = true;
    }

    /// Number of journaled mutations so far.
    pub fn pending_operations(&self) -> usize {
        self.journal.len()
    }

    fn undo_all(&mut self) {
        while let Some(entry) = self.journal.pop() {
            entry.apply(&mut self.state);
        }
    }

    fn require_revision(&self, id: &RevisionId) -> StorageResult<()> {
        if self.state.revisions.contains_key(id) {
            Ok(())
        } else {
            Err(StorageError::missing("revision", id))
        }
    }

    fn require_table(&self, version: &VersionId) -> StorageResult<()> {
        if self.state.tables.contains_key(version) {
            Ok(())
        } else {
            Err(StorageError::missing("table", version))
        }
    }

    fn require_row(&self, version: &VersionId) -> StorageResult<()> {
        if self.state.rows.contains_key(version) {
            Ok(())
        } else {
            Err(StorageError::missing("row", version))
        }
    }

    fn link_revision_table(&mut self, revision: &RevisionId, table: &VersionId, linked: bool) -> bool {
        let was_linked = self.state.set_revision_table(revision, table, linked);
        if was_linked != linked {
            self.journal.push(Undo::RevisionTable {
                revision: revision.clone(),
                table: table.clone(),
                was_linked,
            });
        }
        was_linked
    }

    fn link_table_row(&mut self, table: &VersionId, row: &VersionId, linked: bool) -> bool {
        let was_linked = self.state.set_table_row(table, row, linked);
        if was_linked != linked {
            self.journal.push(Undo::TableRow {
                table: table.clone(),
                row: row.clone(),
                was_linked,
            });
        }
        was_linked
    }
}

impl Drop for StoreTx<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.journal.is_empty() {
            warn!(
                operations = self.journal.len(),
                "store transaction dropped without commit, rolling back"
            );
            self.undo_all();
        }
    }
}

impl GatewayRead for StoreTx<'_> {
    fn branch(&self, id: &BranchId) -> Option<BranchRecord> {
        self.state.branch(id)
    }

    fn branches(&self) -> Vec<BranchRecord> {
        self.state.branches()
    }

    fn revision(&self, id: &RevisionId) -> Option<RevisionRecord> {
        self.state.revision(id)
    }

    fn branch_revisions(&self, branch: &BranchId) -> Vec<RevisionRecord> {
        self.state.branch_revisions(branch)
    }

    fn table(&self, version: &VersionId) -> Option<TableRecord> {
        self.state.table(version)
    }

    fn revision_tables(&self, revision: &RevisionId) -> Vec<TableRecord> {
        self.state.revision_tables(revision)
    }

    fn table_revisions(&self, version: &VersionId) -> Vec<RevisionId> {
        self.state.table_revisions(version)
    }

    fn row(&self, version: &VersionId) -> Option<RowRecord> {
        self.state.row(version)
    }

    fn table_rows(&self, table: &VersionId) -> Vec<RowRecord> {
        self.state.table_rows(table)
    }

    fn row_tables(&self, version: &VersionId) -> Vec<VersionId> {
        self.state.row_tables(version)
    }

    fn table_versions(&self) -> Vec<VersionId> {
        self.state.table_versions()
    }

    fn row_versions(&self) -> Vec<VersionId> {
        self.state.row_versions()
    }
}

impl Gateway for StoreTx<'_> {
    fn create_branch(&mut self, record: BranchRecord) -> StorageResult<()> {
        if self.state.branches.contains_key(&record.id) {
            return Err(StorageError::BranchAlreadyExists(record.id));
        }
        let id = record.id.clone();
        self.state.put_branch(record);
        self.journal.push(Undo::Branch(id, None));
        Ok(())
    }

    fn create_revision(&mut self, record: RevisionRecord) -> StorageResult<()> {
        if self.state.revisions.contains_key(&record.id) {
            return Err(StorageError::duplicate("revision", &record.id));
        }
        if !self.state.branches.contains_key(&record.branch_id) {
            return Err(StorageError::UnknownBranch {
                revision: record.id,
                branch: record.branch_id,
            });
        }
        let id = record.id.clone();
        self.state.put_revision(record);
        self.journal.push(Undo::Revision(id, None));
        Ok(())
    }

    fn update_revision(&mut self, record: RevisionRecord) -> StorageResult<()> {
        self.require_revision(&record.id)?;
        let id = record.id.clone();
        let previous = self.state.put_revision(record);
        self.journal.push(Undo::Revision(id, previous));
        Ok(())
    }

    fn create_table(&mut self, record: TableRecord) -> StorageResult<()> {
        if self.state.tables.contains_key(&record.version_id) {
            return Err(StorageError::duplicate("table", &record.version_id));
        }
        let version = record.version_id.clone();
        self.state.put_table(record);
        self.journal.push(Undo::Table(version, None));
        Ok(())
    }

    fn update_table(&mut self, record: TableRecord) -> StorageResult<()> {
        self.require_table(&record.version_id)?;
        let version = record.version_id.clone();
        let previous = self.state.put_table(record);
        self.journal.push(Undo::Table(version, previous));
        Ok(())
    }

    fn delete_table(&mut self, version: &VersionId) -> StorageResult<TableRecord> {
        self.require_table(version)?;
        let references = self.state.table_revisions(version).len();
        if references > 0 {
            return Err(StorageError::StillReferenced {
                kind: "table",
                version: version.clone(),
                references,
            });
        }

        let rows: Vec<VersionId> = self
            .state
            .table_rows
            .get(version)
            .map(|rows| rows.iter().cloned().collect())
            .unwrap_or_default();
        for row in &rows {
            self.link_table_row(version, row, false);
        }

        let record = self
            .state
            .remove_table(version)
            .ok_or_else(|| StorageError::missing("table", version))?;
        self.journal.push(Undo::Table(version.clone(), Some(record.clone())));
        Ok(record)
    }

    fn create_row(&mut self, record: RowRecord) -> StorageResult<()> {
        if self.state.rows.contains_key(&record.version_id) {
            return Err(StorageError::duplicate("row", &record.version_id));
        }
        let version = record.version_id.clone();
        self.state.put_row(record);
        self.journal.push(Undo::Row(version, None));
        Ok(())
    }

    fn update_row(&mut self, record: RowRecord) -> StorageResult<()> {
        self.require_row(&record.version_id)?;
        let version = record.version_id.clone();
        let previous = self.state.put_row(record);
        self.journal.push(Undo::Row(version, previous));
        Ok(())
    }

    fn delete_row(&mut self, version: &VersionId) -> StorageResult<RowRecord> {
        self.require_row(version)?;
        let references = self.state.row_tables(version).len();
        if references > 0 {
            return Err(StorageError::StillReferenced {
                kind: "row",
                version: version.clone(),
                references,
            });
        }

        let record = self
            .state
            .remove_row(version)
            .ok_or_else(|| StorageError::missing("row", version))?;
        self.journal.push(Undo::Row(version.clone(), Some(record.clone())));
        Ok(record)
    }

    fn connect_table(&mut self, revision: &RevisionId, table: &VersionId) -> StorageResult<()> {
        self.require_revision(revision)?;
        self.require_table(table)?;
        self.link_revision_table(revision, table, true);
        Ok(())
    }

    fn disconnect_table(&mut self, revision: &RevisionId, table: &VersionId) -> StorageResult<bool> {
        Ok(self.link_revision_table(revision, table, false))
    }

    fn connect_row(&mut self, table: &VersionId, row: &VersionId) -> StorageResult<()> {
        self.require_table(table)?;
        self.require_row(row)?;
        self.link_table_row(table, row, true);
        Ok(())
    }

    fn disconnect_row(&mut self, table: &VersionId, row: &VersionId) -> StorageResult<bool> {
        Ok(self.link_table_row(table, row, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::{RowId, TableId};
    use serde_json::json;

    fn seed(tx: &mut StoreTx<'_>) -> (RevisionId, VersionId, VersionId) {
        tx.create_branch(BranchRecord::new(BranchId::main())).unwrap();
        let revision = RevisionRecord::start(BranchId::main(), None);
        let revision_id = revision.id.clone();
        tx.create_revision(revision).unwrap();

        let table = TableRecord::new(TableId::new("users").unwrap(), false);
        let table_id = table.version_id.clone();
        tx.create_table(table).unwrap();
        tx.connect_table(&revision_id, &table_id).unwrap();

        let row = RowRecord::new(RowId::new("alice").unwrap(), json!({"age": 30}));
        let row_id = row.version_id.clone();
        tx.create_row(row).unwrap();
        tx.connect_row(&table_id, &row_id).unwrap();

        (revision_id, table_id, row_id)
    }

    #[test]
    fn test_commit_keeps_changes() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (revision, table, row) = seed(&mut tx);
        tx.commit().unwrap();

        store.read(|state| {
            assert_eq!(state.revision_tables(&revision).len(), 1);
            assert_eq!(state.table_rows(&table)[0].version_id, row);
            assert_eq!(state.row_tables(&row), vec![table.clone()]);
            assert_eq!(state.table_revisions(&table), vec![revision.clone()]);
        });
    }

    #[test]
    fn test_drop_rolls_back() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin();
            seed(&mut tx);
            assert!(tx.pending_operations() > 0);
        }
        store.read(|state| assert_eq!(state, &StoreState::default()));
    }

    #[test]
    fn test_rollback_restores_updates_and_links() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (revision, table, row) = seed(&mut tx);
        tx.commit().unwrap();
        let before = store.read(|state| state.clone());

        let mut tx = store.begin();
        let mut record = tx.row(&row).unwrap();
        record.set_data(json!({"age": 31}));
        tx.update_row(record).unwrap();
        tx.disconnect_row(&table, &row).unwrap();
        tx.delete_row(&row).unwrap();
        tx.disconnect_table(&revision, &table).unwrap();
        tx.delete_table(&table).unwrap();
        tx.rollback();

        store.read(|state| assert_eq!(state, &before));
    }

    #[test]
    fn test_delete_referenced_version_fails() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (_, table, row) = seed(&mut tx);

        assert!(matches!(
            tx.delete_table(&table),
            Err(StorageError::StillReferenced { kind: "table", .. })
        ));
        assert!(matches!(
            tx.delete_row(&row),
            Err(StorageError::StillReferenced { kind: "row", .. })
        ));
    }

    #[test]
    fn test_delete_table_drops_row_links() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (revision, table, row) = seed(&mut tx);

        tx.disconnect_table(&revision, &table).unwrap();
        tx.delete_table(&table).unwrap();
        assert!(tx.row_tables(&row).is_empty());
        assert!(tx.row(&row).is_some());
    }

    #[test]
    fn test_connect_requires_both_ends() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (revision, _, _) = seed(&mut tx);

        let result = tx.connect_table(&revision, &VersionId::from("missing"));
        assert!(matches!(result, Err(StorageError::MissingRecord { kind: "table", .. })));
    }

    #[test]
    fn test_revision_requires_branch() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let revision = RevisionRecord::start(BranchId::new("ghost").unwrap(), None);
        assert!(matches!(
            tx.create_revision(revision),
            Err(StorageError::UnknownBranch { .. })
        ));
    }
}
