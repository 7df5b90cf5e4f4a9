//! Row commands: batch create, update, remove and rename.
//!
//! All four obtain the draft's mutable table version first. Rows are then
//! copied one by one, only when readonly, so a batch touching ten published
//! rows creates ten new row versions and leaves every other row shared.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::draft::cow::{get_or_create_draft_row, get_or_create_draft_table};
use crate::draft::error::{DraftError, DraftResult};
use crate::draft::{mark_changed, refresh_has_changes, require_draft};
use crate::storage::{CreatedId, Gateway, RevisionId, RowId, RowRecord, VersionId};

/// One row of a create or update batch.
#[derive(Debug, Clone)]
pub struct RowInput {
    pub row_id: String,
    pub data: Value,
    pub schema_hash: Option<String>,
    pub meta: Option<Value>,
    pub published_at: Option<DateTime<Utc>>,
}

impl RowInput {
    pub fn new(row_id: impl Into<String>, data: Value) -> Self {
        Self {
            row_id: row_id.into(),
            data,
            schema_hash: None,
            meta: None,
            published_at: None,
        }
    }

    pub fn with_schema_hash(mut self, schema_hash: impl Into<String>) -> Self {
        self.schema_hash = Some(schema_hash.into());
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

#[derive(Debug, Clone)]
pub struct CreateRowsInput {
    pub revision_id: RevisionId,
    pub table_id: String,
    pub rows: Vec<RowInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedRow {
    pub row_id: RowId,
    pub row_version_id: VersionId,
    pub row_created_id: CreatedId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRowsResult {
    pub table_version_id: VersionId,
    pub previous_table_version_id: VersionId,
    pub rows: Vec<CreatedRow>,
}

#[derive(Debug, Clone)]
pub struct UpdateRowsInput {
    pub revision_id: RevisionId,
    pub table_id: String,
    pub rows: Vec<RowInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedRow {
    pub row_id: RowId,
    pub row_version_id: VersionId,
    pub previous_row_version_id: VersionId,
    pub row_created_id: CreatedId,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRowsResult {
    pub table_version_id: VersionId,
    pub previous_table_version_id: VersionId,
    pub rows: Vec<UpdatedRow>,
}

#[derive(Debug, Clone)]
pub struct RemoveRowsInput {
    pub revision_id: RevisionId,
    pub table_id: String,
    pub row_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemovedRow {
    pub row_id: RowId,
    pub row_version_id: VersionId,
    /// hard-deleted, as opposed to only unlinked from this table version
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoveRowsResult {
    pub table_version_id: VersionId,
    pub previous_table_version_id: VersionId,
    pub rows: Vec<RemovedRow>,
    pub has_changes: bool,
}

#[derive(Debug, Clone)]
pub struct RowRename {
    pub row_id: String,
    pub next_row_id: String,
}

impl RowRename {
    pub fn new(row_id: impl Into<String>, next_row_id: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            next_row_id: next_row_id.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenameRowsInput {
    pub revision_id: RevisionId,
    pub table_id: String,
    pub renames: Vec<RowRename>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenamedRow {
    pub previous_row_id: RowId,
    pub row_id: RowId,
    pub row_version_id: VersionId,
    pub previous_row_version_id: VersionId,
    pub row_created_id: CreatedId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameRowsResult {
    pub table_version_id: VersionId,
    pub previous_table_version_id: VersionId,
    pub rows: Vec<RenamedRow>,
}

/// Add new rows to a table.
pub fn create_rows<G: Gateway + ?Sized>(
    gateway: &mut G,
    input: CreateRowsInput,
) -> DraftResult<CreateRowsResult> {
    let revision = require_draft(gateway, &input.revision_id)?;
    let table = get_or_create_draft_table(gateway, &revision.id, &input.table_id)?;

    let mut row_ids = Vec::with_capacity(input.rows.len());
    let mut seen = HashSet::new();
    for row in &input.rows {
        let row_id =
            RowId::new(row.row_id.as_str()).map_err(|e| DraftError::malformed(&row.row_id, e))?;
        if !seen.insert(row.row_id.as_str()) {
            return Err(DraftError::Conflict("Duplicate row IDs in request".to_string()));
        }
        row_ids.push(row_id);
    }

    let existing: HashSet<RowId> = gateway
        .table_rows(table.version_id())
        .into_iter()
        .map(|row| row.id)
        .collect();
    let collisions: Vec<&str> = row_ids
        .iter()
        .filter(|id| existing.contains(*id))
        .map(|id| id.as_str())
        .collect();
    if !collisions.is_empty() {
        return Err(DraftError::Conflict(format!(
            "Rows already exist: {}",
            collisions.join(", ")
        )));
    }

    let mut created = Vec::with_capacity(row_ids.len());
    for (row_id, row) in row_ids.into_iter().zip(input.rows) {
        let mut record = RowRecord::new(row_id, row.data);
        record.schema_hash = row.schema_hash;
        record.meta = row.meta;
        record.published_at = row.published_at;

        created.push(CreatedRow {
            row_id: record.id.clone(),
            row_version_id: record.version_id.clone(),
            row_created_id: record.created_id.clone(),
        });
        let version = record.version_id.clone();
        gateway.create_row(record)?;
        gateway.connect_row(table.version_id(), &version)?;
    }

    debug!(
        revision = %revision.id,
        table = %table.table.id,
        rows = created.len(),
        "created rows"
    );
    if !created.is_empty() {
        mark_changed(gateway, revision)?;
    }

    Ok(CreateRowsResult {
        table_version_id: table.table.version_id,
        previous_table_version_id: table.previous_version_id,
        rows: created,
    })
}

/// Replace the data of existing rows.
///
/// `schema_hash`, `meta` and `published_at` are only overwritten when given.
pub fn update_rows<G: Gateway + ?Sized>(
    gateway: &mut G,
    input: UpdateRowsInput,
) -> DraftResult<UpdateRowsResult> {
    let revision = require_draft(gateway, &input.revision_id)?;
    let table = get_or_create_draft_table(gateway, &revision.id, &input.table_id)?;

    let mut seen = HashSet::new();
    for row in &input.rows {
        if !seen.insert(row.row_id.as_str()) {
            return Err(DraftError::Conflict("Duplicate row IDs in request".to_string()));
        }
    }

    let mut updated = Vec::with_capacity(input.rows.len());
    for row in input.rows {
        let draft = get_or_create_draft_row(gateway, &table.table, &row.row_id)?;
        let mut record = draft.row;
        record.set_data(row.data);
        if let Some(schema_hash) = row.schema_hash {
            record.schema_hash = Some(schema_hash);
        }
        if let Some(meta) = row.meta {
            record.meta = Some(meta);
        }
        if let Some(published_at) = row.published_at {
            record.published_at = Some(published_at);
        }

        updated.push(UpdatedRow {
            row_id: record.id.clone(),
            row_version_id: record.version_id.clone(),
            previous_row_version_id: draft.previous_version_id,
            row_created_id: record.created_id.clone(),
            hash: record.hash.clone(),
        });
        gateway.update_row(record)?;
    }

    if !updated.is_empty() {
        mark_changed(gateway, revision)?;
    }

    Ok(UpdateRowsResult {
        table_version_id: table.table.version_id,
        previous_table_version_id: table.previous_version_id,
        rows: updated,
    })
}

/// Remove rows from a table.
///
/// A row version no other table version links is hard-deleted; a shared one
/// is only unlinked from this table.
pub fn remove_rows<G: Gateway + ?Sized>(
    gateway: &mut G,
    input: RemoveRowsInput,
) -> DraftResult<RemoveRowsResult> {
    let revision = require_draft(gateway, &input.revision_id)?;

    let mut seen = HashSet::new();
    let row_ids: Vec<String> = input
        .row_ids
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let table = get_or_create_draft_table(gateway, &revision.id, &input.table_id)?;

    let mut targets = Vec::with_capacity(row_ids.len());
    for row_id in &row_ids {
        let row = gateway
            .find_row(table.version_id(), row_id)
            .ok_or_else(|| DraftError::row_not_found(row_id, table.table.id.as_str()))?;
        targets.push(row);
    }

    let mut removed = Vec::with_capacity(targets.len());
    for row in targets {
        gateway.disconnect_row(table.version_id(), &row.version_id)?;
        let deleted = gateway.row_tables(&row.version_id).is_empty();
        if deleted {
            gateway.delete_row(&row.version_id)?;
            debug!(table = %table.table.id, row = %row.id, version = %row.version_id, "hard-deleted row version");
        }
        removed.push(RemovedRow {
            row_id: row.id,
            row_version_id: row.version_id,
            deleted,
        });
    }

    let has_changes = refresh_has_changes(gateway, &revision.id)?;

    Ok(RemoveRowsResult {
        table_version_id: table.table.version_id,
        previous_table_version_id: table.previous_version_id,
        rows: removed,
        has_changes,
    })
}

/// Rename rows in one batch.
///
/// A target may reuse another entry's source id, so swaps are legal. It may
/// not collide with any row outside the batch.
pub fn rename_rows<G: Gateway + ?Sized>(
    gateway: &mut G,
    input: RenameRowsInput,
) -> DraftResult<RenameRowsResult> {
    let revision = require_draft(gateway, &input.revision_id)?;

    let mut sources = BTreeSet::new();
    let mut targets = BTreeSet::new();
    let mut next_ids = Vec::with_capacity(input.renames.len());
    for rename in &input.renames {
        let next_id = RowId::new(rename.next_row_id.as_str())
            .map_err(|e| DraftError::malformed(&rename.next_row_id, e))?;
        if rename.row_id == rename.next_row_id {
            return Err(DraftError::Conflict(format!(
                "Row \"{}\" is already named \"{}\"",
                rename.row_id, rename.next_row_id
            )));
        }
        if !sources.insert(rename.row_id.as_str()) {
            return Err(DraftError::Conflict("Duplicate row IDs in request".to_string()));
        }
        if !targets.insert(rename.next_row_id.as_str()) {
            return Err(DraftError::Conflict(
                "Duplicate target row IDs in request".to_string(),
            ));
        }
        next_ids.push(next_id);
    }

    let current = gateway
        .find_table(&revision.id, &input.table_id)
        .ok_or_else(|| DraftError::table_not_found(&input.table_id, &revision.id))?;
    let existing: HashSet<String> = gateway
        .table_rows(&current.version_id)
        .into_iter()
        .map(|row| row.id.into_string())
        .collect();

    for source in &sources {
        if !existing.contains(*source) {
            return Err(DraftError::row_not_found(source, current.id.as_str()));
        }
    }
    let collisions: Vec<&str> = targets
        .iter()
        .filter(|target| existing.contains(**target) && !sources.contains(**target))
        .copied()
        .collect();
    if !collisions.is_empty() {
        return Err(DraftError::Conflict(format!(
            "Rows already exist: {}",
            collisions.join(", ")
        )));
    }

    let table = get_or_create_draft_table(gateway, &revision.id, &input.table_id)?;

    // resolve every source before renaming so swaps see the original ids
    let mut drafts = Vec::with_capacity(input.renames.len());
    for rename in &input.renames {
        drafts.push(get_or_create_draft_row(gateway, &table.table, &rename.row_id)?);
    }

    let mut renamed = Vec::with_capacity(drafts.len());
    for (draft, next_id) in drafts.into_iter().zip(next_ids) {
        let mut record = draft.row;
        let previous_row_id = std::mem::replace(&mut record.id, next_id);
        record.touch();

        renamed.push(RenamedRow {
            previous_row_id,
            row_id: record.id.clone(),
            row_version_id: record.version_id.clone(),
            previous_row_version_id: draft.previous_version_id,
            row_created_id: record.created_id.clone(),
        });
        gateway.update_row(record)?;
    }

    if !renamed.is_empty() {
        mark_changed(gateway, revision)?;
    }

    Ok(RenameRowsResult {
        table_version_id: table.table.version_id,
        previous_table_version_id: table.previous_version_id,
        rows: renamed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::tables::{create_table, CreateTableInput};
    use crate::draft::test_support::{branch_with_draft, publish_table};
    use crate::storage::{hash_value, GatewayRead, MemoryStore, StoreTx};
    use serde_json::json;

    fn table_in_draft(tx: &mut StoreTx<'_>, draft: &RevisionId, table_id: &str) -> VersionId {
        create_table(
            tx,
            CreateTableInput {
                revision_id: draft.clone(),
                table_id: table_id.to_string(),
                system: false,
            },
        )
        .unwrap()
        .table_version_id
    }

    fn insert(tx: &mut StoreTx<'_>, draft: &RevisionId, rows: Vec<RowInput>) -> CreateRowsResult {
        create_rows(
            tx,
            CreateRowsInput {
                revision_id: draft.clone(),
                table_id: "t1".to_string(),
                rows,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_create_rows_on_mutable_table() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (_, draft) = branch_with_draft(&mut tx);
        let table = table_in_draft(&mut tx, &draft, "t1");

        let result = insert(
            &mut tx,
            &draft,
            vec![RowInput::new("r1", json!({"x": 1})).with_schema_hash("s1")],
        );

        assert_eq!(result.table_version_id, table);
        assert_eq!(result.previous_table_version_id, table);
        assert_eq!(result.rows.len(), 1);

        let row = tx.row(&result.rows[0].row_version_id).unwrap();
        assert_eq!(row.hash, hash_value(&json!({"x": 1})));
        assert_eq!(row.schema_hash.as_deref(), Some("s1"));
        assert!(row.published_at.is_none());
        assert!(!row.readonly);
    }

    #[test]
    fn test_create_rows_copies_readonly_table() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (head, draft) = branch_with_draft(&mut tx);
        let published = publish_table(&mut tx, &head, &draft, "t1", &[("a", json!(1))]);

        let result = insert(&mut tx, &draft, vec![RowInput::new("b", json!(2))]);
        assert_eq!(result.previous_table_version_id, published);
        assert_ne!(result.table_version_id, published);
        assert_eq!(tx.table_rows(&result.table_version_id).len(), 2);
        assert_eq!(tx.table_rows(&published).len(), 1);
        assert!(tx.revision(&draft).unwrap().has_changes);
    }

    #[test]
    fn test_create_rows_rejects_duplicates_and_collisions() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (_, draft) = branch_with_draft(&mut tx);
        table_in_draft(&mut tx, &draft, "t1");
        insert(&mut tx, &draft, vec![RowInput::new("a", json!(1)), RowInput::new("b", json!(2))]);

        let input = |ids: &[&str]| CreateRowsInput {
            revision_id: draft.clone(),
            table_id: "t1".to_string(),
            rows: ids.iter().map(|id| RowInput::new(*id, json!(null))).collect(),
        };

        let err = create_rows(&mut tx, input(&["c", "c"])).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate row IDs in request");

        let err = create_rows(&mut tx, input(&["a", "c", "b"])).unwrap_err();
        assert_eq!(err.to_string(), "Rows already exist: a, b");

        let err = create_rows(&mut tx, input(&["ok", "bad id"])).unwrap_err();
        assert!(matches!(err, DraftError::MalformedId { .. }));
    }

    #[test]
    fn test_update_readonly_row_copies_it() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (_, draft) = branch_with_draft(&mut tx);
        table_in_draft(&mut tx, &draft, "t1");
        let created = insert(&mut tx, &draft, vec![RowInput::new("r1", json!({"x": 1}))]);
        let original = created.rows[0].row_version_id.clone();

        let mut locked = tx.row(&original).unwrap();
        locked.readonly = true;
        tx.update_row(locked).unwrap();

        let result = update_rows(
            &mut tx,
            UpdateRowsInput {
                revision_id: draft.clone(),
                table_id: "t1".to_string(),
                rows: vec![RowInput::new("r1", json!({"x": 2}))],
            },
        )
        .unwrap();

        let updated = &result.rows[0];
        assert_ne!(updated.row_version_id, original);
        assert_eq!(updated.previous_row_version_id, original);
        assert_eq!(updated.row_created_id, created.rows[0].row_created_id);
        assert_eq!(updated.hash, hash_value(&json!({"x": 2})));
        // the table itself was mutable and is reused
        assert_eq!(result.table_version_id, result.previous_table_version_id);
    }

    #[test]
    fn test_update_keeps_optional_fields_unless_given() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (_, draft) = branch_with_draft(&mut tx);
        table_in_draft(&mut tx, &draft, "t1");
        insert(
            &mut tx,
            &draft,
            vec![RowInput::new("r1", json!(1))
                .with_schema_hash("s1")
                .with_meta(json!({"by": "a"}))],
        );

        let result = update_rows(
            &mut tx,
            UpdateRowsInput {
                revision_id: draft.clone(),
                table_id: "t1".to_string(),
                rows: vec![RowInput::new("r1", json!(2)).with_meta(json!({"by": "b"}))],
            },
        )
        .unwrap();

        let row = tx.row(&result.rows[0].row_version_id).unwrap();
        assert_eq!(row.data, json!(2));
        assert_eq!(row.schema_hash.as_deref(), Some("s1"));
        assert_eq!(row.meta, Some(json!({"by": "b"})));
    }

    #[test]
    fn test_update_missing_row() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (_, draft) = branch_with_draft(&mut tx);
        table_in_draft(&mut tx, &draft, "t1");

        let err = update_rows(
            &mut tx,
            UpdateRowsInput {
                revision_id: draft,
                table_id: "t1".to_string(),
                rows: vec![RowInput::new("ghost", json!(1))],
            },
        )
        .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_remove_rows_deletes_or_unlinks() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (head, draft) = branch_with_draft(&mut tx);
        let published = publish_table(&mut tx, &head, &draft, "t1", &[("shared", json!(1))]);
        let fresh = insert(&mut tx, &draft, vec![RowInput::new("fresh", json!(2))]);

        let result = remove_rows(
            &mut tx,
            RemoveRowsInput {
                revision_id: draft.clone(),
                table_id: "t1".to_string(),
                row_ids: vec!["shared".into(), "fresh".into(), "shared".into()],
            },
        )
        .unwrap();

        assert_eq!(result.rows.len(), 2);
        let shared = &result.rows[0];
        assert_eq!(shared.row_id.as_str(), "shared");
        assert!(!shared.deleted);
        assert!(tx.row(&shared.row_version_id).is_some());
        assert_eq!(tx.table_rows(&published).len(), 1);

        let fresh_removed = &result.rows[1];
        assert!(fresh_removed.deleted);
        assert!(tx.row(&fresh.rows[0].row_version_id).is_none());

        assert!(tx.table_rows(&result.table_version_id).is_empty());
        assert!(result.has_changes);
    }

    #[test]
    fn test_remove_only_new_row_clears_changes() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (head, draft) = branch_with_draft(&mut tx);
        let published = publish_table(&mut tx, &head, &draft, "t1", &[("a", json!(1))]);
        let created = insert(&mut tx, &draft, vec![RowInput::new("b", json!(2))]);
        assert_ne!(created.table_version_id, published);
        assert!(tx.revision(&draft).unwrap().has_changes);

        let result = remove_rows(
            &mut tx,
            RemoveRowsInput {
                revision_id: draft.clone(),
                table_id: "t1".to_string(),
                row_ids: vec!["b".into()],
            },
        )
        .unwrap();

        assert!(result.rows[0].deleted);
        assert!(!result.has_changes);
        assert!(!tx.revision(&draft).unwrap().has_changes);
    }

    #[test]
    fn test_remove_missing_row_reports_id() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (_, draft) = branch_with_draft(&mut tx);
        table_in_draft(&mut tx, &draft, "t1");

        let err = remove_rows(
            &mut tx,
            RemoveRowsInput {
                revision_id: draft,
                table_id: "t1".to_string(),
                row_ids: vec!["nobody".into()],
            },
        )
        .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("nobody"));
    }

    #[test]
    fn test_rename_rows_swap() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (head, draft) = branch_with_draft(&mut tx);
        publish_table(&mut tx, &head, &draft, "t1", &[("a", json!("A")), ("b", json!("B"))]);

        let result = rename_rows(
            &mut tx,
            RenameRowsInput {
                revision_id: draft.clone(),
                table_id: "t1".to_string(),
                renames: vec![RowRename::new("a", "b"), RowRename::new("b", "a")],
            },
        )
        .unwrap();

        assert_eq!(result.rows.len(), 2);
        let table = result.table_version_id.clone();
        assert_eq!(tx.find_row(&table, "a").unwrap().data, json!("B"));
        assert_eq!(tx.find_row(&table, "b").unwrap().data, json!("A"));
        for row in &result.rows {
            assert_ne!(row.row_version_id, row.previous_row_version_id);
            assert_eq!(
                tx.row(&row.row_version_id).unwrap().created_id,
                tx.row(&row.previous_row_version_id).unwrap().created_id
            );
        }
        assert!(tx.revision(&draft).unwrap().has_changes);
    }

    #[test]
    fn test_rename_rows_validation() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (_, draft) = branch_with_draft(&mut tx);
        table_in_draft(&mut tx, &draft, "t1");
        insert(&mut tx, &draft, vec![RowInput::new("a", json!(1)), RowInput::new("b", json!(2))]);

        let mut rename = |renames: Vec<RowRename>| {
            rename_rows(
                &mut tx,
                RenameRowsInput {
                    revision_id: draft.clone(),
                    table_id: "t1".to_string(),
                    renames,
                },
            )
        };

        assert!(matches!(
            rename(vec![RowRename::new("a", "")]).unwrap_err(),
            DraftError::MalformedId { .. }
        ));
        assert!(rename(vec![RowRename::new("a", "a")]).unwrap_err().is_conflict());
        assert_eq!(
            rename(vec![RowRename::new("a", "x"), RowRename::new("a", "y")])
                .unwrap_err()
                .to_string(),
            "Duplicate row IDs in request"
        );
        assert!(rename(vec![RowRename::new("a", "x"), RowRename::new("b", "x")])
            .unwrap_err()
            .is_conflict());
        assert_eq!(
            rename(vec![RowRename::new("a", "b")]).unwrap_err().to_string(),
            "Rows already exist: b"
        );
        assert!(rename(vec![RowRename::new("zzz", "c")]).unwrap_err().is_not_found());

        let result = rename(vec![RowRename::new("a", "c")]).unwrap();
        assert_eq!(result.rows[0].previous_row_id.as_str(), "a");
        assert_eq!(result.rows[0].row_id.as_str(), "c");
        // mutable rows are renamed in place
        assert_eq!(result.rows[0].row_version_id, result.rows[0].previous_row_version_id);
    }
}
