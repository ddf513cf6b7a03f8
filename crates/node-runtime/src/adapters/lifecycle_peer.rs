//! # Lifecycle Peer Adapter
//!
//! Implements pc-02's `LifecyclePeer` port. Installs touch every peer of the
//! organization; approvals and definition queries go through the first peer
//! that answers.

use async_trait::async_trait;
use ledger_sim::{Approval, Definition, LedgerSim};
use pc_02_chaincode_lifecycle::{ApprovedDefinition, CommittedDefinition, LifecyclePeer};
use shared_types::{LedgerError, MspId, Organization, PackageArtifact, PackageId, TransactionId};
use tracing::debug;

use super::{endorsing_peer, first_reachable};

pub struct SimLifecyclePeer {
    ledger: LedgerSim,
}

impl SimLifecyclePeer {
    pub fn new(ledger: LedgerSim) -> Self {
        Self { ledger }
    }
}

fn to_approval(definition: &ApprovedDefinition) -> Approval {
    Approval {
        name: definition.name.clone(),
        version: definition.version.clone(),
        sequence: definition.sequence,
        package_id: definition.package_id.clone(),
        init_required: definition.init_required,
    }
}

fn from_approval(approval: Approval) -> ApprovedDefinition {
    ApprovedDefinition {
        name: approval.name,
        version: approval.version,
        sequence: approval.sequence,
        package_id: approval.package_id,
        init_required: approval.init_required,
    }
}

fn from_definition(definition: Definition) -> CommittedDefinition {
    CommittedDefinition {
        name: definition.name,
        version: definition.version,
        sequence: definition.sequence,
        package_id: definition.package_id,
        init_required: definition.init_required,
        initialized: definition.initialized,
    }
}

#[async_trait]
impl LifecyclePeer for SimLifecyclePeer {
    async fn query_installed(&self, org: &Organization, package_id: &PackageId) -> Result<bool, LedgerError> {
        for peer in org.peer_names() {
            if !self.ledger.is_installed(&peer, package_id)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn install(&self, org: &Organization, artifact: &PackageArtifact) -> Result<PackageId, LedgerError> {
        for peer in org.peer_names() {
            if self.ledger.is_installed(&peer, &artifact.package_id)? {
                continue;
            }
            self.ledger
                .install(&peer, &artifact.package_id, &artifact.bytes)?;
        }
        Ok(artifact.package_id.clone())
    }

    async fn query_approved(
        &self,
        org: &Organization,
        channel_id: &str,
        name: &str,
        sequence: u64,
    ) -> Result<Option<ApprovedDefinition>, LedgerError> {
        first_reachable(&self.ledger, org)?;
        Ok(self
            .ledger
            .approval(&org.msp_id, channel_id, name, sequence)?
            .map(from_approval))
    }

    async fn approve(
        &self,
        org: &Organization,
        channel_id: &str,
        definition: &ApprovedDefinition,
    ) -> Result<(), LedgerError> {
        let peer = first_reachable(&self.ledger, org)?;
        debug!(msp_id = %org.msp_id, peer = %peer, contract = %definition.name, "Submitting approval");
        self.ledger
            .approve(&org.msp_id, channel_id, to_approval(definition))
    }

    async fn query_committed(
        &self,
        org: &Organization,
        channel_id: &str,
        name: &str,
    ) -> Result<Option<CommittedDefinition>, LedgerError> {
        first_reachable(&self.ledger, org)?;
        Ok(self
            .ledger
            .committed(channel_id, name)?
            .map(from_definition))
    }

    async fn reachable_peers(&self, org: &Organization) -> Result<usize, LedgerError> {
        Ok(org
            .peer_names()
            .iter()
            .filter(|p| self.ledger.is_reachable(p))
            .count())
    }

    async fn commit(
        &self,
        org: &Organization,
        channel_id: &str,
        definition: &ApprovedDefinition,
        endorsers: &[&Organization],
    ) -> Result<TransactionId, LedgerError> {
        first_reachable(&self.ledger, org)?;
        let approvers: Vec<MspId> = endorsers.iter().map(|o| o.msp_id.clone()).collect();
        let peers: Vec<String> = endorsers
            .iter()
            .map(|o| endorsing_peer(&self.ledger, o))
            .collect();
        self.ledger
            .commit(channel_id, &to_approval(definition), &approvers, &peers)
    }

    async fn init(
        &self,
        org: &Organization,
        channel_id: &str,
        name: &str,
        function: &str,
        args: &[String],
    ) -> Result<TransactionId, LedgerError> {
        let peer = endorsing_peer(&self.ledger, org);
        debug!(msp_id = %org.msp_id, contract = name, function, args = args.len(), "Submitting init");
        self.ledger.init(channel_id, name, function, args, &[peer])
    }
}
