//! Branch creation and history.

use tracing::info;

use crate::draft::{DraftError, DraftResult};
use crate::revision::lock_table;
use crate::storage::{
    BranchId, BranchRecord, Gateway, GatewayRead, RevisionId, RevisionRecord, RevisionRole,
};

#[derive(Debug, Clone)]
pub struct CreateBranchInput {
    pub branch_id: String,
    /// fork from this revision; `None` starts an empty branch
    pub from_revision_id: Option<RevisionId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateBranchResult {
    pub branch_id: BranchId,
    /// the start revision, which is also the head until the first commit
    pub start_revision_id: RevisionId,
    pub draft_revision_id: RevisionId,
}

/// Create a branch with a start revision and a draft on top of it.
///
/// A fork's start revision is parented by the source revision and links the
/// same table versions, which get locked readonly so neither branch can
/// mutate what the other sees.
pub fn create_branch<G: Gateway + ?Sized>(
    gateway: &mut G,
    input: CreateBranchInput,
) -> DraftResult<CreateBranchResult> {
    let branch_id = BranchId::new(input.branch_id.as_str())
        .map_err(|e| DraftError::malformed(&input.branch_id, e))?;
    if gateway.branch(&branch_id).is_some() {
        return Err(DraftError::Conflict(format!(
            "Branch \"{}\" already exists",
            branch_id
        )));
    }

    let source = match &input.from_revision_id {
        Some(id) => {
            let revision = gateway
                .revision(id)
                .ok_or_else(|| DraftError::revision_not_found(id))?;
            if revision.is_draft {
                return Err(DraftError::Precondition(
                    "Cannot branch from a draft revision".to_string(),
                ));
            }
            Some(revision)
        }
        None => None,
    };

    gateway.create_branch(BranchRecord::new(branch_id.clone()))?;

    let start = RevisionRecord::start(branch_id.clone(), source.as_ref().map(|r| r.id.clone()));
    let draft = RevisionRecord::draft(branch_id.clone(), start.id.clone());
    let result = CreateBranchResult {
        branch_id: branch_id.clone(),
        start_revision_id: start.id.clone(),
        draft_revision_id: draft.id.clone(),
    };
    gateway.create_revision(start)?;
    gateway.create_revision(draft)?;

    if let Some(source) = &source {
        for table in gateway.revision_tables(&source.id) {
            gateway.connect_table(&result.start_revision_id, &table.version_id)?;
            gateway.connect_table(&result.draft_revision_id, &table.version_id)?;
            lock_table(gateway, table)?;
        }
    }

    info!(
        branch = %branch_id,
        from = ?input.from_revision_id.as_ref().map(|id| id.as_str()),
        start = %result.start_revision_id,
        "created branch"
    );

    Ok(result)
}

/// Committed revisions of a branch, newest first.
///
/// Walks `parent_id` from the head back to the branch's start revision.
pub fn history<G: GatewayRead + ?Sized>(
    gateway: &G,
    branch: &BranchId,
    limit: Option<usize>,
) -> DraftResult<Vec<RevisionRecord>> {
    if gateway.branch(branch).is_none() {
        return Err(DraftError::NotFound(format!("Branch \"{}\" not found", branch)));
    }
    let mut current = gateway.find_revision(branch, RevisionRole::Head);
    if current.is_none() {
        return Err(DraftError::Precondition("Head revision not found".to_string()));
    }

    let limit = limit.unwrap_or(usize::MAX);
    let mut revisions = Vec::new();
    while let Some(revision) = current.take() {
        if revisions.len() >= limit {
            break;
        }
        let stop = revision.is_start || &revision.branch_id != branch;
        current = match (&revision.parent_id, stop) {
            (Some(parent), false) => gateway.revision(parent),
            _ => None,
        };
        if &revision.branch_id == branch {
            revisions.push(revision);
        }
    }

    Ok(revisions)
}
