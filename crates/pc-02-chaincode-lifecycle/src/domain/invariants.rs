//! # Domain Invariants
//!
//! Pure lifecycle rules. The service feeds them fresh ledger query results;
//! nothing here caches state.

use shared_types::{MspId, PackageId};

use super::errors::LifecycleError;
use super::value_objects::{
    ApprovalRecord, CommitReadiness, CommittedDefinition, LifecycleState, OrgLifecycleStatus,
};

/// The only sequence a new approval or commit may target.
pub fn expected_sequence(committed: Option<&CommittedDefinition>) -> u64 {
    committed.map_or(1, |c| c.sequence + 1)
}

/// Invariant: sequencing.
///
/// Any operation targeting a sequence must target committed + 1.
pub fn invariant_sequence(
    name: &str,
    requested: u64,
    committed: Option<&CommittedDefinition>,
) -> Result<(), LifecycleError> {
    let expected = expected_sequence(committed);
    if requested != expected {
        return Err(LifecycleError::Sequence {
            name: name.to_string(),
            requested,
            expected,
        });
    }
    Ok(())
}

/// Invariant: commit readiness.
///
/// Ready iff every required organization approved, and all approvals name
/// the same package. The first approving organization in `required` order
/// sets the reference package; the first one that differs is reported.
pub fn invariant_readiness(
    name: &str,
    sequence: u64,
    required: &[MspId],
    approvals: &[(MspId, Option<PackageId>)],
) -> Result<CommitReadiness, LifecycleError> {
    let mut record = ApprovalRecord::new(name, sequence, required);
    let mut reference: Option<PackageId> = None;

    for msp_id in required {
        let approved = approvals
            .iter()
            .find(|(m, _)| m == msp_id)
            .and_then(|(_, p)| p.as_ref());
        let Some(package_id) = approved else {
            continue;
        };
        match &reference {
            None => reference = Some(package_id.clone()),
            Some(expected) if expected != package_id => {
                return Err(LifecycleError::Readiness {
                    msp_id: msp_id.clone(),
                    expected: expected.clone(),
                    found: package_id.clone(),
                });
            }
            Some(_) => {}
        }
        record.mark_approved(msp_id);
    }

    Ok(CommitReadiness {
        ready: !required.is_empty() && record.all_approved(),
        approvals: record,
        package_id: reference,
    })
}

/// Derive where a (name, sequence) sits in the lifecycle.
///
/// `statuses` covers the required organizations for `package_id`.
pub fn derive_state(
    sequence: u64,
    package_id: &PackageId,
    statuses: &[OrgLifecycleStatus],
    committed: Option<&CommittedDefinition>,
) -> LifecycleState {
    if let Some(c) = committed {
        if c.sequence > sequence {
            return LifecycleState::Committed;
        }
        if c.sequence == sequence {
            return if c.init_required && c.initialized {
                LifecycleState::Initialized
            } else {
                LifecycleState::Committed
            };
        }
    }

    let approved: Vec<MspId> = statuses
        .iter()
        .filter(|s| {
            s.approval
                .as_ref()
                .is_some_and(|a| a.sequence == sequence && &a.package_id == package_id)
        })
        .map(|s| s.msp_id.clone())
        .collect();
    if !statuses.is_empty() && approved.len() == statuses.len() {
        return LifecycleState::ReadyToCommit;
    }
    if !approved.is_empty() {
        return LifecycleState::Approved { orgs: approved };
    }

    let installed: Vec<MspId> = statuses
        .iter()
        .filter(|s| s.installed)
        .map(|s| s.msp_id.clone())
        .collect();
    if installed.is_empty() {
        LifecycleState::Packaged
    } else {
        LifecycleState::Installed { orgs: installed }
    }
}
