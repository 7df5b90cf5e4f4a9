//! Table commands: create, rename, remove.

use tracing::debug;

use crate::draft::cow::get_or_create_draft_table;
use crate::draft::error::{DraftError, DraftResult};
use crate::draft::{mark_changed, refresh_has_changes, require_draft};
use crate::storage::{CreatedId, Gateway, RevisionId, TableId, TableRecord, VersionId};

#[derive(Debug, Clone)]
pub struct CreateTableInput {
    pub revision_id: RevisionId,
    pub table_id: String,
    pub system: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableResult {
    pub table_version_id: VersionId,
    pub table_created_id: CreatedId,
}

#[derive(Debug, Clone)]
pub struct RenameTableInput {
    pub revision_id: RevisionId,
    pub table_id: String,
    pub next_table_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameTableResult {
    pub table_version_id: VersionId,
    pub previous_table_version_id: VersionId,
    pub table_created_id: CreatedId,
}

#[derive(Debug, Clone)]
pub struct RemoveTableInput {
    pub revision_id: RevisionId,
    pub table_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoveTableResult {
    pub table_version_id: VersionId,
    pub table_created_id: CreatedId,
    /// whether the version was hard-deleted rather than just unlinked
    pub deleted: bool,
    pub deleted_row_version_ids: Vec<VersionId>,
    /// the draft's `has_changes` after the removal
    pub has_changes: bool,
}

pub fn create_table<G: Gateway + ?Sized>(
    gateway: &mut G,
    input: CreateTableInput,
) -> DraftResult<CreateTableResult> {
    let revision = require_draft(gateway, &input.revision_id)?;
    let table_id = TableId::new(input.table_id.as_str())
        .map_err(|e| DraftError::malformed(&input.table_id, e))?;

    if gateway.find_table(&revision.id, table_id.as_str()).is_some() {
        return Err(DraftError::Conflict(format!(
            "A table with ID \"{}\" already exists in the revision",
            table_id
        )));
    }

    let table = TableRecord::new(table_id, input.system);
    let result = CreateTableResult {
        table_version_id: table.version_id.clone(),
        table_created_id: table.created_id.clone(),
    };
    debug!(revision = %revision.id, table = %table.id, version = %table.version_id, "creating table");

    gateway.create_table(table)?;
    gateway.connect_table(&revision.id, &result.table_version_id)?;
    mark_changed(gateway, revision)?;

    Ok(result)
}

/// Rename a table. Only the id changes; identity and row links are kept.
///
/// Changing only the case of a table's own id is allowed.
pub fn rename_table<G: Gateway + ?Sized>(
    gateway: &mut G,
    input: RenameTableInput,
) -> DraftResult<RenameTableResult> {
    let revision = require_draft(gateway, &input.revision_id)?;
    let next_id = TableId::new(input.next_table_id.as_str())
        .map_err(|e| DraftError::malformed(&input.next_table_id, e))?;

    let current = gateway
        .find_table(&revision.id, &input.table_id)
        .ok_or_else(|| DraftError::table_not_found(&input.table_id, &revision.id))?;
    if current.id.as_str() == next_id.as_str() {
        return Err(DraftError::Conflict(format!(
            "Table \"{}\" is already named \"{}\"",
            current.id, next_id
        )));
    }
    if let Some(existing) = gateway.find_table(&revision.id, next_id.as_str()) {
        if existing.created_id != current.created_id {
            return Err(DraftError::Conflict(format!(
                "A table with ID \"{}\" already exists in the revision",
                next_id
            )));
        }
    }

    let draft = get_or_create_draft_table(gateway, &revision.id, &input.table_id)?;
    let mut table = draft.table;
    table.id = next_id;
    table.updated_at = chrono::Utc::now();

    let result = RenameTableResult {
        table_version_id: table.version_id.clone(),
        previous_table_version_id: draft.previous_version_id,
        table_created_id: table.created_id.clone(),
    };
    gateway.update_table(table)?;
    mark_changed(gateway, revision)?;

    Ok(result)
}

/// Remove a table from a draft.
///
/// A mutable version exists only in this draft and is hard-deleted along with
/// the rows no other table version links. A readonly version is shared, so it
/// is only unlinked from the draft.
pub fn remove_table<G: Gateway + ?Sized>(
    gateway: &mut G,
    input: RemoveTableInput,
) -> DraftResult<RemoveTableResult> {
    let revision = require_draft(gateway, &input.revision_id)?;
    let table = gateway
        .find_table(&revision.id, &input.table_id)
        .ok_or_else(|| DraftError::table_not_found(&input.table_id, &revision.id))?;

    let has_parent = revision
        .parent_id
        .as_ref()
        .and_then(|parent| gateway.revision(parent))
        .is_some();
    if !has_parent {
        return Err(DraftError::Precondition(
            "Parent revision not found".to_string(),
        ));
    }

    gateway.disconnect_table(&revision.id, &table.version_id)?;

    let deleted = !table.readonly && gateway.table_revisions(&table.version_id).is_empty();
    let mut deleted_row_version_ids = Vec::new();
    if deleted {
        let rows = gateway.table_rows(&table.version_id);
        gateway.delete_table(&table.version_id)?;
        for row in rows {
            if gateway.row_tables(&row.version_id).is_empty() {
                gateway.delete_row(&row.version_id)?;
                deleted_row_version_ids.push(row.version_id);
            }
        }
        debug!(
            revision = %revision.id,
            table = %table.id,
            version = %table.version_id,
            rows = deleted_row_version_ids.len(),
            "hard-deleted table version"
        );
    }

    let has_changes = refresh_has_changes(gateway, &revision.id)?;

    Ok(RemoveTableResult {
        table_version_id: table.version_id,
        table_created_id: table.created_id,
        deleted,
        deleted_row_version_ids,
        has_changes,
    })
}
