//! Garbage collection of unreferenced versions.
//!
//! Commands never reclaim versions they merely detach (revert, removing a
//! shared table). This pass is the only place that does, and it only runs
//! when called.

use tracing::info;

use crate::draft::DraftResult;
use crate::storage::{Gateway, VersionId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GarbageReport {
    pub table_version_ids: Vec<VersionId>,
    pub row_version_ids: Vec<VersionId>,
}

impl GarbageReport {
    pub fn is_empty(&self) -> bool {
        self.table_version_ids.is_empty() && self.row_version_ids.is_empty()
    }
}

/// Delete table versions no revision links, then row versions no table links.
///
/// Tables go first: deleting one drops its row links, which may orphan rows
/// that the second sweep then picks up.
pub fn collect_garbage<G: Gateway + ?Sized>(gateway: &mut G) -> DraftResult<GarbageReport> {
    let mut report = GarbageReport::default();

    for version in gateway.table_versions() {
        if gateway.table_revisions(&version).is_empty() {
            gateway.delete_table(&version)?;
            report.table_version_ids.push(version);
        }
    }

    for version in gateway.row_versions() {
        if gateway.row_tables(&version).is_empty() {
            gateway.delete_row(&version)?;
            report.row_version_ids.push(version);
        }
    }

    info!(
        tables = report.table_version_ids.len(),
        rows = report.row_version_ids.len(),
        "collected garbage"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::test_support::{branch_with_draft, publish_table};
    use crate::draft::{create_rows, CreateRowsInput, RowInput};
    use crate::revision::{revert, RevertInput};
    use crate::storage::{BranchId, GatewayRead, MemoryStore};
    use serde_json::json;

    #[test]
    fn test_nothing_to_collect() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (head, draft) = branch_with_draft(&mut tx);
        publish_table(&mut tx, &head, &draft, "t1", &[("a", json!(1))]);

        let report = collect_garbage(&mut tx).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_collects_versions_detached_by_revert() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        let (head, draft) = branch_with_draft(&mut tx);
        let published = publish_table(&mut tx, &head, &draft, "t1", &[("a", json!(1))]);
        let shared_row = tx.table_rows(&published)[0].version_id.clone();

        let created = create_rows(
            &mut tx,
            CreateRowsInput {
                revision_id: draft.clone(),
                table_id: "t1".to_string(),
                rows: vec![RowInput::new("b", json!(2))],
            },
        )
        .unwrap();
        revert(
            &mut tx,
            RevertInput {
                branch_id: BranchId::main(),
            },
        )
        .unwrap();

        let report = collect_garbage(&mut tx).unwrap();
        assert_eq!(report.table_version_ids, vec![created.table_version_id.clone()]);
        assert_eq!(report.row_version_ids, vec![created.rows[0].row_version_id.clone()]);

        assert!(tx.table(&created.table_version_id).is_none());
        assert!(tx.table(&published).is_some());
        assert!(tx.row(&shared_row).is_some());
        assert_eq!(tx.row_tables(&shared_row), vec![published]);
    }
}
