//! The persistence gateway.
//!
//! Every command in the engine talks to storage through these two traits.
//! `GatewayRead` is implemented by the committed store state and by an open
//! transaction; `Gateway` only by an open transaction, so a mutation can never
//! happen outside a transaction boundary.
//!
//! The shape is that of a relational store: records are fetched and written
//! whole, and the two many-to-many relations (revision ↔ table version,
//! table version ↔ row version) are mutated with explicit connect/disconnect
//! calls.

use crate::storage::error::StorageResult;
use crate::storage::records::{BranchRecord, RevisionRecord, RowRecord, TableRecord};
use crate::storage::types::{BranchId, RevisionId, RevisionRole, VersionId};

/// Read access to branches, revisions, versions and their links.
pub trait GatewayRead {
    fn branch(&self, id: &BranchId) -> Option<BranchRecord>;

    fn branches(&self) -> Vec<BranchRecord>;

    fn revision(&self, id: &RevisionId) -> Option<RevisionRecord>;

    /// all revisions of a branch, oldest first
    fn branch_revisions(&self, branch: &BranchId) -> Vec<RevisionRecord>;

    fn table(&self, version: &VersionId) -> Option<TableRecord>;

    /// table versions linked to a revision
    fn revision_tables(&self, revision: &RevisionId) -> Vec<TableRecord>;

    /// revisions linking a table version
    fn table_revisions(&self, version: &VersionId) -> Vec<RevisionId>;

    fn row(&self, version: &VersionId) -> Option<RowRecord>;

    /// row versions linked to a table version
    fn table_rows(&self, table: &VersionId) -> Vec<RowRecord>;

    /// table versions linking a row version
    fn row_tables(&self, version: &VersionId) -> Vec<VersionId>;

    /// every table version in the store
    fn table_versions(&self) -> Vec<VersionId>;

    /// every row version in the store
    fn row_versions(&self) -> Vec<VersionId>;

    /// the revision of a branch currently playing `role`
    fn find_revision(&self, branch: &BranchId, role: RevisionRole) -> Option<RevisionRecord> {
        self.branch_revisions(branch)
            .into_iter()
            .rev()
            .find(|revision| match role {
                RevisionRole::Start => revision.is_start,
                RevisionRole::Head => revision.is_head,
                RevisionRole::Draft => revision.is_draft,
            })
    }

    /// the version of `table_id` linked to a revision (case-insensitive)
    fn find_table(&self, revision: &RevisionId, table_id: &str) -> Option<TableRecord> {
        self.revision_tables(revision)
            .into_iter()
            .find(|table| table.id.matches(table_id))
    }

    /// the version of `row_id` linked to a table version
    fn find_row(&self, table: &VersionId, row_id: &str) -> Option<RowRecord> {
        self.table_rows(table)
            .into_iter()
            .find(|row| row.id.as_str() == row_id)
    }
}

/// Write access. Only available inside a transaction.
pub trait Gateway: GatewayRead {
    fn create_branch(&mut self, record: BranchRecord) -> StorageResult<()>;

    fn create_revision(&mut self, record: RevisionRecord) -> StorageResult<()>;

    fn update_revision(&mut self, record: RevisionRecord) -> StorageResult<()>;

    fn create_table(&mut self, record: TableRecord) -> StorageResult<()>;

    fn update_table(&mut self, record: TableRecord) -> StorageResult<()>;

    /// hard-delete a table version
    ///
    /// Fails while any revision still links it. Its row links are dropped
    /// with it; the rows themselves are left alone.
    fn delete_table(&mut self, version: &VersionId) -> StorageResult<TableRecord>;

    fn create_row(&mut self, record: RowRecord) -> StorageResult<()>;

    fn update_row(&mut self, record: RowRecord) -> StorageResult<()>;

    /// hard-delete a row version; fails while any table version still links it
    fn delete_row(&mut self, version: &VersionId) -> StorageResult<RowRecord>;

    fn connect_table(&mut self, revision: &RevisionId, table: &VersionId) -> StorageResult<()>;

    /// returns whether the link existed
    fn disconnect_table(&mut self, revision: &RevisionId, table: &VersionId) -> StorageResult<bool>;

    fn connect_row(&mut self, table: &VersionId, row: &VersionId) -> StorageResult<()>;

    /// returns whether the link existed
    fn disconnect_row(&mut self, table: &VersionId, row: &VersionId) -> StorageResult<bool>;
}
