//! Structural diff between two revisions.
//!
//! A revision's content is fully described by the set of table versions it
//! links and, per table version, the set of row versions it links. Diffing
//! two revisions is therefore a pure comparison of version-id sets keyed by
//! `created_id`; no row data is ever read.
//!
//! `hasChanges` on a draft is exactly `!diff(parent, draft).is_empty()`.

use std::collections::BTreeMap;

use crate::storage::{CreatedId, GatewayRead, RevisionId, RowId, TableId, VersionId};

/// A table version as seen from a revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    pub version_id: VersionId,
    pub created_id: CreatedId,
    pub id: TableId,
    pub rows: BTreeMap<CreatedId, RowSnapshot>,
}

/// A row version as seen from a table version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSnapshot {
    pub version_id: VersionId,
    pub id: RowId,
}

/// How an entity differs between two revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    /// content changed under the same id
    Modified,
    /// id changed (content may have changed too)
    Renamed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowChange {
    pub created_id: CreatedId,
    pub kind: ChangeKind,
    /// current id, or the last known id for removed rows
    pub row_id: RowId,
    pub previous_row_id: Option<RowId>,
    pub from_version: Option<VersionId>,
    pub to_version: Option<VersionId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableChange {
    pub created_id: CreatedId,
    pub kind: ChangeKind,
    /// current id, or the last known id for removed tables
    pub table_id: TableId,
    pub previous_table_id: Option<TableId>,
    pub from_version: Option<VersionId>,
    pub to_version: Option<VersionId>,
    pub rows: Vec<RowChange>,
}

/// Every difference between two revisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionDiff {
    pub tables: Vec<TableChange>,
}

impl RevisionDiff {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// total number of row-level changes across all tables
    pub fn row_change_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }

    pub fn table(&self, table_id: &str) -> Option<&TableChange> {
        self.tables.iter().find(|t| t.table_id.matches(table_id))
    }
}

/// Read the version sets linked to a revision.
pub fn snapshot_revision<G: GatewayRead + ?Sized>(
    gateway: &G,
    revision: &RevisionId,
) -> Vec<TableSnapshot> {
    gateway
        .revision_tables(revision)
        .into_iter()
        .map(|table| {
            let rows = gateway
                .table_rows(&table.version_id)
                .into_iter()
                .map(|row| {
                    (
                        row.created_id,
                        RowSnapshot {
                            version_id: row.version_id,
                            id: row.id,
                        },
                    )
                })
                .collect();
            TableSnapshot {
                version_id: table.version_id,
                created_id: table.created_id,
                id: table.id,
                rows,
            }
        })
        .collect()
}

/// Diff two revisions' version sets.
pub fn diff_tables(from: &[TableSnapshot], to: &[TableSnapshot]) -> RevisionDiff {
    let before: BTreeMap<&CreatedId, &TableSnapshot> =
        from.iter().map(|t| (&t.created_id, t)).collect();
    let after: BTreeMap<&CreatedId, &TableSnapshot> =
        to.iter().map(|t| (&t.created_id, t)).collect();

    let mut tables = Vec::new();

    for (created_id, old) in &before {
        if !after.contains_key(created_id) {
            tables.push(TableChange {
                created_id: old.created_id.clone(),
                kind: ChangeKind::Removed,
                table_id: old.id.clone(),
                previous_table_id: None,
                from_version: Some(old.version_id.clone()),
                to_version: None,
                rows: Vec::new(),
            });
        }
    }

    for (created_id, new) in &after {
        let Some(old) = before.get(created_id) else {
            tables.push(TableChange {
                created_id: new.created_id.clone(),
                kind: ChangeKind::Added,
                table_id: new.id.clone(),
                previous_table_id: None,
                from_version: None,
                to_version: Some(new.version_id.clone()),
                rows: diff_rows(&BTreeMap::new(), &new.rows),
            });
            continue;
        };

        if old.version_id == new.version_id {
            continue;
        }

        let rows = diff_rows(&old.rows, &new.rows);
        let renamed = old.id != new.id;
        if rows.is_empty() && !renamed {
            continue;
        }

        tables.push(TableChange {
            created_id: new.created_id.clone(),
            kind: if renamed {
                ChangeKind::Renamed
            } else {
                ChangeKind::Modified
            },
            table_id: new.id.clone(),
            previous_table_id: renamed.then(|| old.id.clone()),
            from_version: Some(old.version_id.clone()),
            to_version: Some(new.version_id.clone()),
            rows,
        });
    }

    RevisionDiff { tables }
}

fn diff_rows(
    before: &BTreeMap<CreatedId, RowSnapshot>,
    after: &BTreeMap<CreatedId, RowSnapshot>,
) -> Vec<RowChange> {
    let mut changes = Vec::new();

    for (created_id, old) in before {
        if !after.contains_key(created_id) {
            changes.push(RowChange {
                created_id: created_id.clone(),
                kind: ChangeKind::Removed,
                row_id: old.id.clone(),
                previous_row_id: None,
                from_version: Some(old.version_id.clone()),
                to_version: None,
            });
        }
    }

    for (created_id, new) in after {
        match before.get(created_id) {
            None => changes.push(RowChange {
                created_id: created_id.clone(),
                kind: ChangeKind::Added,
                row_id: new.id.clone(),
                previous_row_id: None,
                from_version: None,
                to_version: Some(new.version_id.clone()),
            }),
            Some(old) if old.version_id != new.version_id => {
                let renamed = old.id != new.id;
                changes.push(RowChange {
                    created_id: created_id.clone(),
                    kind: if renamed {
                        ChangeKind::Renamed
                    } else {
                        ChangeKind::Modified
                    },
                    row_id: new.id.clone(),
                    previous_row_id: renamed.then(|| old.id.clone()),
                    from_version: Some(old.version_id.clone()),
                    to_version: Some(new.version_id.clone()),
                });
            }
            Some(_) => {}
        }
    }

    changes
}

/// Diff two revisions as stored.
pub fn diff_revisions<G: GatewayRead + ?Sized>(
    gateway: &G,
    from: &RevisionId,
    to: &RevisionId,
) -> RevisionDiff {
    diff_tables(
        &snapshot_revision(gateway, from),
        &snapshot_revision(gateway, to),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(version: &str, created: &str, id: &str, rows: &[(&str, &str, &str)]) -> TableSnapshot {
        TableSnapshot {
            version_id: VersionId::from(version),
            created_id: CreatedId::from(created),
            id: TableId::new(id).unwrap(),
            rows: rows
                .iter()
                .map(|(v, c, r)| {
                    (
                        CreatedId::from(*c),
                        RowSnapshot {
                            version_id: VersionId::from(*v),
                            id: RowId::new(*r).unwrap(),
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn test_identical_sets_have_no_changes() {
        let head = vec![table("t1", "c1", "users", &[("r1", "rc1", "alice")])];
        assert!(diff_tables(&head, &head.clone()).is_empty());
    }

    #[test]
    fn test_new_table_version_with_same_rows_is_unchanged() {
        // copy-on-write followed by undoing the edit leaves only the version id different
        let head = vec![table("t1", "c1", "users", &[("r1", "rc1", "alice")])];
        let draft = vec![table("t2", "c1", "users", &[("r1", "rc1", "alice")])];
        assert!(diff_tables(&head, &draft).is_empty());
    }

    #[test]
    fn test_added_and_removed_tables() {
        let head = vec![table("t1", "c1", "users", &[])];
        let draft = vec![table("t2", "c2", "posts", &[("r1", "rc1", "p1")])];

        let diff = diff_tables(&head, &draft);
        assert_eq!(diff.tables.len(), 2);
        assert_eq!(diff.table("users").unwrap().kind, ChangeKind::Removed);
        let posts = diff.table("posts").unwrap();
        assert_eq!(posts.kind, ChangeKind::Added);
        assert_eq!(posts.rows.len(), 1);
        assert_eq!(posts.rows[0].kind, ChangeKind::Added);
    }

    #[test]
    fn test_row_level_changes() {
        let head = vec![table(
            "t1",
            "c1",
            "users",
            &[("r1", "rc1", "alice"), ("r2", "rc2", "bob"), ("r3", "rc3", "carol")],
        )];
        let draft = vec![table(
            "t2",
            "c1",
            "users",
            &[("r1", "rc1", "alice"), ("r4", "rc2", "bobby"), ("r5", "rc4", "dave")],
        )];

        let diff = diff_tables(&head, &draft);
        let users = diff.table("users").unwrap();
        assert_eq!(users.kind, ChangeKind::Modified);
        assert_eq!(diff.row_change_count(), 3);

        let kind_of = |row: &str| {
            users
                .rows
                .iter()
                .find(|r| r.row_id.as_str() == row)
                .map(|r| r.kind)
        };
        assert_eq!(kind_of("carol"), Some(ChangeKind::Removed));
        assert_eq!(kind_of("bobby"), Some(ChangeKind::Renamed));
        assert_eq!(kind_of("dave"), Some(ChangeKind::Added));
        assert_eq!(kind_of("alice"), None);
    }

    #[test]
    fn test_renamed_table() {
        let head = vec![table("t1", "c1", "users", &[])];
        let draft = vec![table("t2", "c1", "people", &[])];

        let diff = diff_tables(&head, &draft);
        let change = diff.table("people").unwrap();
        assert_eq!(change.kind, ChangeKind::Renamed);
        assert_eq!(change.previous_table_id.as_ref().unwrap().as_str(), "users");
    }
}
