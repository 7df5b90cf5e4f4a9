//! Commit and revert.

use tracing::info;

use crate::draft::{DraftError, DraftResult};
use crate::revision::lock_table;
use crate::storage::{
    BranchId, Gateway, GatewayRead, RevisionId, RevisionRecord, RevisionRole, VersionId,
};

#[derive(Debug, Clone)]
pub struct CommitInput {
    pub branch_id: BranchId,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitResult {
    pub previous_head_revision_id: RevisionId,
    pub previous_draft_revision_id: RevisionId,
    pub next_head_revision_id: RevisionId,
    pub next_draft_revision_id: RevisionId,
}

#[derive(Debug, Clone)]
pub struct RevertInput {
    pub branch_id: BranchId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevertResult {
    pub head_revision_id: RevisionId,
    pub draft_revision_id: RevisionId,
    /// table versions the draft linked that its head does not
    pub detached_table_version_ids: Vec<VersionId>,
}

fn head_and_draft<G: GatewayRead + ?Sized>(
    gateway: &G,
    branch: &BranchId,
) -> DraftResult<(RevisionRecord, RevisionRecord)> {
    let head = gateway
        .find_revision(branch, RevisionRole::Head)
        .ok_or_else(|| DraftError::Precondition("Head revision not found".to_string()))?;
    let draft = gateway
        .find_revision(branch, RevisionRole::Draft)
        .ok_or_else(|| DraftError::Precondition("Draft revision not found".to_string()))?;
    if !draft.has_changes {
        return Err(DraftError::Precondition("There are no changes".to_string()));
    }
    Ok((head, draft))
}

/// Promote the draft to head and open a fresh draft on top of it.
///
/// Every table version the new head links is locked readonly together with
/// its rows, so later edits from any revision copy instead of mutating.
pub fn commit<G: Gateway + ?Sized>(gateway: &mut G, input: CommitInput) -> DraftResult<CommitResult> {
    let (mut head, mut draft) = head_and_draft(gateway, &input.branch_id)?;

    let previous_head_revision_id = head.id.clone();
    let previous_draft_revision_id = draft.id.clone();

    head.is_head = false;
    head.is_draft = false;
    gateway.update_revision(head)?;

    draft.is_head = true;
    draft.is_draft = false;
    draft.has_changes = false;
    draft.comment = input.comment;
    let next_head_revision_id = draft.id.clone();
    gateway.update_revision(draft)?;

    let next_draft = RevisionRecord::draft(input.branch_id.clone(), next_head_revision_id.clone());
    let next_draft_revision_id = next_draft.id.clone();
    gateway.create_revision(next_draft)?;

    let mut locked = 0;
    for table in gateway.revision_tables(&next_head_revision_id) {
        gateway.connect_table(&next_draft_revision_id, &table.version_id)?;
        locked += lock_table(gateway, table)?;
    }

    info!(
        branch = %input.branch_id,
        head = %next_head_revision_id,
        draft = %next_draft_revision_id,
        locked,
        "committed draft"
    );

    Ok(CommitResult {
        previous_head_revision_id,
        previous_draft_revision_id,
        next_head_revision_id,
        next_draft_revision_id,
    })
}

/// Reset the draft to exactly the head's table versions.
///
/// Versions that only the draft linked are left in place for
/// [`collect_garbage`](crate::revision::collect_garbage).
pub fn revert<G: Gateway + ?Sized>(gateway: &mut G, input: RevertInput) -> DraftResult<RevertResult> {
    let (head, mut draft) = head_and_draft(gateway, &input.branch_id)?;

    let head_tables: Vec<VersionId> = gateway
        .revision_tables(&head.id)
        .into_iter()
        .map(|table| table.version_id)
        .collect();

    let mut detached_table_version_ids = Vec::new();
    for table in gateway.revision_tables(&draft.id) {
        gateway.disconnect_table(&draft.id, &table.version_id)?;
        if !head_tables.contains(&table.version_id) {
            detached_table_version_ids.push(table.version_id);
        }
    }
    for version in &head_tables {
        gateway.connect_table(&draft.id, version)?;
    }

    draft.has_changes = false;
    let draft_revision_id = draft.id.clone();
    gateway.update_revision(draft)?;

    info!(
        branch = %input.branch_id,
        draft = %draft_revision_id,
        detached = detached_table_version_ids.len(),
        "reverted draft"
    );

    Ok(RevertResult {
        head_revision_id: head.id,
        draft_revision_id,
        detached_table_version_ids,
    })
}
