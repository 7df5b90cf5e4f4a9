//! Draft commands.
//!
//! Every mutation of versioned data goes through this module. Commands are
//! plain functions over a [`Gateway`], so they run inside whatever transaction
//! the caller opened; on error the caller drops the transaction and nothing a
//! command did is observable.
//!
//! ```text
//! command ──► require_draft ──► get_or_create_draft_{table,row} ──► mutate ──► hasChanges
//! ```

mod changes;
mod cow;
mod error;
mod rows;
mod tables;

pub use changes::{
    diff_revisions, diff_tables, snapshot_revision, ChangeKind, RevisionDiff, RowChange,
    RowSnapshot, TableChange, TableSnapshot,
};
pub use cow::{get_or_create_draft_row, get_or_create_draft_table, DraftRow, DraftTable};
pub use error::{DraftError, DraftResult};
pub use rows::{
    create_rows, remove_rows, rename_rows, update_rows, CreateRowsInput, CreateRowsResult,
    CreatedRow, RemoveRowsInput, RemoveRowsResult, RemovedRow, RenameRowsInput,
    RenameRowsResult, RenamedRow, RowInput, RowRename, UpdateRowsInput, UpdateRowsResult,
    UpdatedRow,
};
pub use tables::{
    create_table, remove_table, rename_table, CreateTableInput, CreateTableResult,
    RemoveTableInput, RemoveTableResult, RenameTableInput, RenameTableResult,
};

use crate::storage::{Gateway, GatewayRead, RevisionId, RevisionRecord};

/// Load a revision and make sure it is a draft.
pub(crate) fn require_draft<G: GatewayRead + ?Sized>(
    gateway: &G,
    revision: &RevisionId,
) -> DraftResult<RevisionRecord> {
    let record = gateway
        .revision(revision)
        .ok_or_else(|| DraftError::revision_not_found(revision))?;
    if !record.is_draft {
        return Err(DraftError::NotADraft {
            revision: revision.clone(),
        });
    }
    Ok(record)
}

/// Flag a draft as changed after an additive mutation.
pub(crate) fn mark_changed<G: Gateway + ?Sized>(
    gateway: &mut G,
    mut revision: RevisionRecord,
) -> DraftResult<()> {
    if !revision.has_changes {
        revision.has_changes = true;
        gateway.update_revision(revision)?;
    }
    Ok(())
}

/// Recompute `has_changes` by diffing the draft against its parent.
///
/// Removals can bring a draft back to its parent's exact state, so they
/// use this instead of [`mark_changed`].
pub(crate) fn refresh_has_changes<G: Gateway + ?Sized>(
    gateway: &mut G,
    revision: &RevisionId,
) -> DraftResult<bool> {
    let mut record = gateway
        .revision(revision)
        .ok_or_else(|| DraftError::revision_not_found(revision))?;

    let current = snapshot_revision(gateway, revision);
    let baseline = match &record.parent_id {
        Some(parent) => snapshot_revision(gateway, parent),
        None => Vec::new(),
    };
    let has_changes = !diff_tables(&baseline, &current).is_empty();

    if record.has_changes != has_changes {
        record.has_changes = has_changes;
        gateway.update_revision(record)?;
    }
    Ok(has_changes)
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::Value;

    use crate::storage::{
        BranchId, BranchRecord, Gateway, RevisionId, RevisionRecord, RowId, RowRecord, StoreTx,
        TableId, TableRecord, VersionId,
    };

    /// `main` with a start/head revision and an unchanged draft on top
    pub(crate) fn branch_with_draft(tx: &mut StoreTx<'_>) -> (RevisionId, RevisionId) {
        tx.create_branch(BranchRecord::new(BranchId::main())).unwrap();
        let head = RevisionRecord::start(BranchId::main(), None);
        let draft = RevisionRecord::draft(BranchId::main(), head.id.clone());
        let ids = (head.id.clone(), draft.id.clone());
        tx.create_revision(head).unwrap();
        tx.create_revision(draft).unwrap();
        ids
    }

    /// a readonly table with readonly rows, linked to both revisions
    pub(crate) fn publish_table(
        tx: &mut StoreTx<'_>,
        head: &RevisionId,
        draft: &RevisionId,
        table_id: &str,
        rows: &[(&str, Value)],
    ) -> VersionId {
        let mut table = TableRecord::new(TableId::new(table_id).unwrap(), false);
        table.readonly = true;
        let version = table.version_id.clone();
        tx.create_table(table).unwrap();

        for (row_id, data) in rows {
            let mut row = RowRecord::new(RowId::new(*row_id).unwrap(), data.clone());
            row.readonly = true;
            let row_version = row.version_id.clone();
            tx.create_row(row).unwrap();
            tx.connect_row(&version, &row_version).unwrap();
        }

        tx.connect_table(head, &version).unwrap();
        tx.connect_table(draft, &version).unwrap();
        version
    }
}
