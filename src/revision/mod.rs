//! Revision lifecycle.
//!
//! Branch bootstrap and forking, commit, revert, history and the explicit
//! garbage-collection pass. Like the draft commands these are plain
//! functions over a [`Gateway`] and run inside the caller's transaction.

mod branch;
mod gc;
mod lifecycle;

pub use branch::{create_branch, history, CreateBranchInput, CreateBranchResult};
pub use gc::{collect_garbage, GarbageReport};
pub use lifecycle::{commit, revert, CommitInput, CommitResult, RevertInput, RevertResult};

use crate::draft::DraftResult;
use crate::storage::{Gateway, TableRecord};

/// Mark a table version readonly, along with every row version it links.
///
/// Returns the number of records that changed.
pub(crate) fn lock_table<G: Gateway + ?Sized>(
    gateway: &mut G,
    mut table: TableRecord,
) -> DraftResult<usize> {
    let mut locked = 0;
    for mut row in gateway.table_rows(&table.version_id) {
        if !row.readonly {
            row.readonly = true;
            gateway.update_row(row)?;
            locked += 1;
        }
    }
    if !table.readonly {
        table.readonly = true;
        gateway.update_table(table)?;
        locked += 1;
    }
    Ok(locked)
}
