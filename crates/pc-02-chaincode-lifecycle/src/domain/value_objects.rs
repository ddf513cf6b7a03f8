//! Value objects for the Chaincode Lifecycle
//!
//! Everything here is a snapshot of what one organization's ledger client
//! reported. Nothing is cached between calls.

use serde::{Deserialize, Serialize};
use shared_types::{ContractDescriptor, MspId, PackageId, TransactionId, TransactionResult};
use std::collections::BTreeMap;

/// A contract definition as one organization approved it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedDefinition {
    pub name: String,
    pub version: String,
    pub sequence: u64,
    pub package_id: PackageId,
    pub init_required: bool,
}

impl ApprovedDefinition {
    pub fn for_descriptor(descriptor: &ContractDescriptor, sequence: u64, package_id: PackageId) -> Self {
        Self {
            name: descriptor.name.clone(),
            version: descriptor.version.clone(),
            sequence,
            package_id,
            init_required: descriptor.init_required,
        }
    }
}

/// The definition currently committed on the channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedDefinition {
    pub name: String,
    pub version: String,
    pub sequence: u64,
    pub package_id: PackageId,
    pub init_required: bool,
    /// Whether the init entrypoint already ran for this sequence.
    pub initialized: bool,
}

/// One organization's lifecycle view for a (name, sequence).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgLifecycleStatus {
    pub msp_id: MspId,
    /// Whether the package is installed on the organization's peers.
    pub installed: bool,
    /// The organization's approval at this sequence, if any.
    pub approval: Option<ApprovedDefinition>,
}

/// Per-organization approval flags for one (name, sequence).
///
/// Starts all-false; an entry only ever moves from false to true.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub name: String,
    pub sequence: u64,
    pub entries: BTreeMap<MspId, bool>,
}

impl ApprovalRecord {
    pub fn new(name: impl Into<String>, sequence: u64, required: &[MspId]) -> Self {
        Self {
            name: name.into(),
            sequence,
            entries: required.iter().map(|m| (m.clone(), false)).collect(),
        }
    }

    /// Mark an organization approved. Unknown organizations are ignored.
    pub fn mark_approved(&mut self, msp_id: &MspId) {
        if let Some(entry) = self.entries.get_mut(msp_id) {
            *entry = true;
        }
    }

    pub fn all_approved(&self) -> bool {
        self.entries.values().all(|approved| *approved)
    }

    /// Organizations still to approve, in key order.
    pub fn missing(&self) -> Vec<MspId> {
        self.entries
            .iter()
            .filter(|(_, approved)| !**approved)
            .map(|(m, _)| m.clone())
            .collect()
    }
}

/// Derived commit readiness for one (name, sequence). Never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReadiness {
    pub ready: bool,
    pub approvals: ApprovalRecord,
    /// The package every approving organization agreed on.
    pub package_id: Option<PackageId>,
}

/// Lifecycle position of a (name, sequence), derived from ledger queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// No required organization has installed the package.
    Packaged,
    /// Installed on these organizations; nobody approved yet.
    Installed { orgs: Vec<MspId> },
    /// Approved by these organizations; not all of them yet.
    Approved { orgs: Vec<MspId> },
    /// Every required organization approved the same package.
    ReadyToCommit,
    /// Definition committed on the channel.
    Committed,
    /// Committed and the declared init entrypoint ran.
    Initialized,
}

impl LifecycleState {
    /// Terminal success for a contract with or without an init entrypoint.
    pub fn is_deployed(&self, init_required: bool) -> bool {
        match self {
            LifecycleState::Initialized => true,
            LifecycleState::Committed => !init_required,
            _ => false,
        }
    }
}

/// How a commit request ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitOutcome {
    /// This call's transaction committed the definition.
    Committed(TransactionId),
    /// Another committer got there first.
    AlreadyCommitted,
}

/// How the init step of a deployment ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitOutcome {
    NotDeclared,
    Initialized(TransactionResult),
    /// The ledger reported init already ran; benign during deployment.
    AlreadyInitialized,
}

/// Summary of one `deploy` run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub name: String,
    pub sequence: u64,
    pub package_id: PackageId,
    pub commit: CommitOutcome,
    pub init: InitOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orgs() -> Vec<MspId> {
        vec![MspId::from("Org1MSP"), MspId::from("Org2MSP")]
    }

    #[test]
    fn test_approval_record_starts_all_false() {
        let record = ApprovalRecord::new("nft", 1, &orgs());
        assert!(!record.all_approved());
        assert_eq!(record.missing(), orgs());
    }

    #[test]
    fn test_approval_record_never_reverts() {
        let mut record = ApprovalRecord::new("nft", 1, &orgs());
        record.mark_approved(&orgs()[0]);
        record.mark_approved(&orgs()[0]);
        assert_eq!(record.missing(), vec![MspId::from("Org2MSP")]);
        record.mark_approved(&orgs()[1]);
        assert!(record.all_approved());
    }

    #[test]
    fn test_unknown_org_ignored() {
        let mut record = ApprovalRecord::new("nft", 1, &orgs());
        record.mark_approved(&MspId::from("Org9MSP"));
        assert_eq!(record.entries.len(), 2);
    }

    #[test]
    fn test_is_deployed() {
        assert!(LifecycleState::Committed.is_deployed(false));
        assert!(!LifecycleState::Committed.is_deployed(true));
        assert!(LifecycleState::Initialized.is_deployed(true));
        assert!(!LifecycleState::ReadyToCommit.is_deployed(false));
    }
}
