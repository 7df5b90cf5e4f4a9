//! Copy-on-write primitives.
//!
//! These are the only way a command obtains a mutable table or row version.
//! A mutable version is handed back as is; a readonly one is copied into a
//! fresh version that takes its place in the calling scope, while the original
//! stays linked everywhere else.

use tracing::debug;

use crate::draft::error::{DraftError, DraftResult};
use crate::storage::{Gateway, RevisionId, RowRecord, TableRecord, VersionId};

/// A mutable table version linked to a draft revision.
#[derive(Debug, Clone)]
pub struct DraftTable {
    /// the mutable version, as currently stored
    pub table: TableRecord,
    /// the version that was linked before; equals `table.version_id` when reused
    pub previous_version_id: VersionId,
    pub was_created: bool,
}

impl DraftTable {
    pub fn version_id(&self) -> &VersionId {
        &self.table.version_id
    }
}

/// A mutable row version linked to a mutable table version.
#[derive(Debug, Clone)]
pub struct DraftRow {
    pub row: RowRecord,
    pub previous_version_id: VersionId,
    pub was_created: bool,
}

impl DraftRow {
    pub fn version_id(&self) -> &VersionId {
        &self.row.version_id
    }
}

/// Get a mutable version of `table_id` within `revision`, copying it if readonly.
///
/// A copied table version is linked to the same row versions as the original,
/// then swapped for it in `revision` only.
pub fn get_or_create_draft_table<G: Gateway + ?Sized>(
    gateway: &mut G,
    revision: &RevisionId,
    table_id: &str,
) -> DraftResult<DraftTable> {
    let table = gateway
        .find_table(revision, table_id)
        .ok_or_else(|| DraftError::table_not_found(table_id, revision))?;

    if !table.readonly {
        return Ok(DraftTable {
            previous_version_id: table.version_id.clone(),
            table,
            was_created: false,
        });
    }

    let copy = table.draft_copy();
    gateway.create_table(copy.clone())?;
    for row in gateway.table_rows(&table.version_id) {
        gateway.connect_row(&copy.version_id, &row.version_id)?;
    }
    gateway.disconnect_table(revision, &table.version_id)?;
    gateway.connect_table(revision, &copy.version_id)?;

    debug!(
        revision = %revision,
        table = %copy.id,
        from = %table.version_id,
        to = %copy.version_id,
        "copied readonly table version"
    );

    Ok(DraftTable {
        table: copy,
        previous_version_id: table.version_id,
        was_created: true,
    })
}

/// Get a mutable version of `row_id` within a mutable table version.
///
/// The table must already be mutable (obtained through
/// [`get_or_create_draft_table`]); relinking rows under a readonly table would
/// change published state.
pub fn get_or_create_draft_row<G: Gateway + ?Sized>(
    gateway: &mut G,
    table: &TableRecord,
    row_id: &str,
) -> DraftResult<DraftRow> {
    if table.readonly {
        return Err(DraftError::Precondition(format!(
            "Table \"{}\" version {} is read-only",
            table.id, table.version_id
        )));
    }

    let row = gateway
        .find_row(&table.version_id, row_id)
        .ok_or_else(|| DraftError::row_not_found(row_id, table.id.as_str()))?;

    if !row.readonly {
        return Ok(DraftRow {
            previous_version_id: row.version_id.clone(),
            row,
            was_created: false,
        });
    }

    let copy = row.draft_copy();
    gateway.create_row(copy.clone())?;
    gateway.disconnect_row(&table.version_id, &row.version_id)?;
    gateway.connect_row(&table.version_id, &copy.version_id)?;

    debug!(
        table = %table.id,
        row = %copy.id,
        from = %row.version_id,
        to = %copy.version_id,
        "copied readonly row version"
    );

    Ok(DraftRow {
        row: copy,
        previous_version_id: row.version_id,
        was_created: true,
    })
}
