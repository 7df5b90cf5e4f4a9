//! Persistent record types.
//!
//! Each record maps to one row of the backing store. Tables and rows are
//! version-carrying: a logical table or row is the set of records sharing one
//! `created_id`, and each record is one physical version keyed by `version_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::hash::hash_value;
use crate::storage::types::{BranchId, CreatedId, RevisionId, RowId, TableId, VersionId};

/// a logical line of development
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRecord {
    pub id: BranchId,
    pub created_at: DateTime<Utc>,
}

impl BranchRecord {
    pub fn new(id: BranchId) -> Self {
        Self {
            id,
            created_at: Utc::now(),
        }
    }
}

/// a point-in-time (head) or mutable working (draft) snapshot of a branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub id: RevisionId,
    pub branch_id: BranchId,
    /// `None` only for the start revision of a root branch
    pub parent_id: Option<RevisionId>,
    pub is_start: bool,
    pub is_head: bool,
    pub is_draft: bool,
    pub has_changes: bool,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RevisionRecord {
    /// the first revision of a branch; it is the head until the first commit
    pub fn start(branch_id: BranchId, parent_id: Option<RevisionId>) -> Self {
        Self {
            id: RevisionId::generate(),
            branch_id,
            parent_id,
            is_start: true,
            is_head: true,
            is_draft: false,
            has_changes: false,
            comment: None,
            created_at: Utc::now(),
        }
    }

    /// a fresh, unchanged draft on top of `parent_id`
    pub fn draft(branch_id: BranchId, parent_id: RevisionId) -> Self {
        Self {
            id: RevisionId::generate(),
            branch_id,
            parent_id: Some(parent_id),
            is_start: false,
            is_head: false,
            is_draft: true,
            has_changes: false,
            comment: None,
            created_at: Utc::now(),
        }
    }
}

/// one physical version of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    pub id: TableId,
    pub created_id: CreatedId,
    pub version_id: VersionId,
    pub readonly: bool,
    pub system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TableRecord {
    /// a brand new logical table
    pub fn new(id: TableId, system: bool) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_id: CreatedId::generate(),
            version_id: VersionId::generate(),
            readonly: false,
            system,
            created_at: now,
            updated_at: now,
        }
    }

    /// a mutable copy of this version: same identity, new version id
    pub fn draft_copy(&self) -> Self {
        Self {
            id: self.id.clone(),
            created_id: self.created_id.clone(),
            version_id: VersionId::generate(),
            readonly: false,
            system: self.system,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }
}

/// one physical version of a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    pub id: RowId,
    pub created_id: CreatedId,
    pub version_id: VersionId,
    pub readonly: bool,
    pub data: Value,
    /// content hash of `data`
    pub hash: String,
    pub schema_hash: Option<String>,
    pub meta: Option<Value>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RowRecord {
    /// a brand new logical row
    pub fn new(id: RowId, data: Value) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_id: CreatedId::generate(),
            version_id: VersionId::generate(),
            readonly: false,
            hash: hash_value(&data),
            data,
            schema_hash: None,
            meta: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// a mutable copy of this version: same identity and content, new version id
    pub fn draft_copy(&self) -> Self {
        Self {
            id: self.id.clone(),
            created_id: self.created_id.clone(),
            version_id: VersionId::generate(),
            readonly: false,
            data: self.data.clone(),
            hash: self.hash.clone(),
            schema_hash: self.schema_hash.clone(),
            meta: self.meta.clone(),
            published_at: self.published_at,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }

    /// replace the data, recomputing the content hash
    pub fn set_data(&mut self, data: Value) {
        self.hash = hash_value(&data);
        self.data = data;
        self.touch();
    }

    /// bump `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_draft_copy_keeps_identity() {
        let mut table = TableRecord::new(TableId::new("users").unwrap(), true);
        table.readonly = true;

        let copy = table.draft_copy();
        assert_eq!(copy.id, table.id);
        assert_eq!(copy.created_id, table.created_id);
        assert_eq!(copy.system, table.system);
        assert_ne!(copy.version_id, table.version_id);
        assert!(!copy.readonly);
    }

    #[test]
    fn test_row_draft_copy_keeps_content() {
        let mut row = RowRecord::new(RowId::new("r1").unwrap(), json!({"x": 1}));
        row.schema_hash = Some("abc".to_string());
        row.meta = Some(json!({"author": "a"}));
        row.published_at = Some(Utc::now());
        row.readonly = true;

        let copy = row.draft_copy();
        assert_eq!(copy.id, row.id);
        assert_eq!(copy.created_id, row.created_id);
        assert_eq!(copy.data, row.data);
        assert_eq!(copy.hash, row.hash);
        assert_eq!(copy.schema_hash, row.schema_hash);
        assert_eq!(copy.meta, row.meta);
        assert_eq!(copy.published_at, row.published_at);
        assert_ne!(copy.version_id, row.version_id);
        assert!(!copy.readonly);
    }

    #[test]
    fn test_row_set_data_rehashes() {
        let mut row = RowRecord::new(RowId::new("r1").unwrap(), json!({"x": 1}));
        let before = row.hash.clone();
        row.set_data(json!({"x": 2}));
        assert_ne!(row.hash, before);
        assert_eq!(row.hash, hash_value(&json!({"x": 2})));
    }

    #[test]
    fn test_revision_constructors() {
        let start = RevisionRecord::start(BranchId::main(), None);
        assert!(start.is_start && start.is_head && !start.is_draft);
        assert!(start.parent_id.is_none());

        let draft = RevisionRecord::draft(BranchId::main(), start.id.clone());
        assert!(draft.is_draft && !draft.is_head && !draft.has_changes);
        assert_eq!(draft.parent_id, Some(start.id));
    }
}
