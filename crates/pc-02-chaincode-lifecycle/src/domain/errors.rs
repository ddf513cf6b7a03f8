//! Error types for the Chaincode Lifecycle

use shared_types::{LedgerError, MspId, PackageId};
use thiserror::Error;

/// Lifecycle failures. Every ledger-side failure names the organization
/// whose client reported it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Source unreadable or empty.
    #[error("Failed to package {source_ref}: {reason}")]
    Packaging { source_ref: String, reason: String },

    /// A peer of the organization could not install the package.
    #[error("Install failed for {msp_id}: {source}")]
    Install { msp_id: MspId, source: LedgerError },

    /// The organization already approved a different package at this sequence.
    #[error(
        "{msp_id} already approved {approved} at sequence {sequence}, refusing {requested}"
    )]
    ApprovalConflict {
        msp_id: MspId,
        sequence: u64,
        approved: PackageId,
        requested: PackageId,
    },

    /// Approving organizations disagree on the package.
    #[error("{msp_id} approved {found}, expected {expected}")]
    Readiness {
        msp_id: MspId,
        expected: PackageId,
        found: PackageId,
    },

    /// Commit attempted before every required organization approved.
    #[error("Contract {name} not ready to commit, missing approvals from {missing:?}")]
    NotReady { name: String, missing: Vec<MspId> },

    /// Requested sequence is not committed + 1.
    #[error("Contract {name}: sequence {requested} requested, expected {expected}")]
    Sequence {
        name: String,
        requested: u64,
        expected: u64,
    },

    /// Endorsement policy cannot be satisfied with the peers that answered.
    #[error("Endorsement policy for {name} not satisfied: {reason}")]
    Endorsement { name: String, reason: String },

    /// Init ran before for this sequence.
    #[error("Contract {name} already initialized")]
    AlreadyInitialized { name: String },

    /// Init requested for a definition that is not committed.
    #[error("Contract {name} sequence {sequence} is not committed")]
    NotCommitted { name: String, sequence: u64 },

    #[error("Unknown organization: {0}")]
    UnknownOrganization(MspId),

    /// Any other ledger failure during a lifecycle step.
    #[error("{operation} failed for {msp_id}: {source}")]
    Ledger {
        operation: &'static str,
        msp_id: MspId,
        source: LedgerError,
    },

    /// One or more organizations failed during a deployment.
    #[error("Deployment of {name} failed: {}", describe(.failures))]
    Deployment {
        name: String,
        failures: Vec<(MspId, Box<LifecycleError>)>,
    },
}

impl LifecycleError {
    /// Organization the failure is attributed to, when there is exactly one.
    pub fn msp_id(&self) -> Option<&MspId> {
        match self {
            LifecycleError::Install { msp_id, .. }
            | LifecycleError::ApprovalConflict { msp_id, .. }
            | LifecycleError::Readiness { msp_id, .. }
            | LifecycleError::Ledger { msp_id, .. }
            | LifecycleError::UnknownOrganization(msp_id) => Some(msp_id),
            _ => None,
        }
    }

    /// Whether rerunning the same step later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LifecycleError::Install { source, .. } | LifecycleError::Ledger { source, .. } => {
                source.is_transient()
            }
            LifecycleError::NotReady { .. } | LifecycleError::Endorsement { .. } => true,
            LifecycleError::Deployment { failures, .. } => {
                failures.iter().all(|(_, e)| e.is_retryable())
            }
            _ => false,
        }
    }
}

fn describe(failures: &[(MspId, Box<LifecycleError>)]) -> String {
    failures
        .iter()
        .map(|(msp_id, e)| format!("{msp_id}: {e}"))
        .collect::<Vec<_>>()
        .join("; ")
}
