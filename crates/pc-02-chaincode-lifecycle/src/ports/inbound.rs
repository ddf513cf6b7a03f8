//! Inbound Ports (Driving Ports / API)

use async_trait::async_trait;
use shared_types::{ContractDescriptor, MspId, PackageArtifact, PackageId, TransactionResult};

use crate::domain::errors::LifecycleError;
use crate::domain::value_objects::{
    CommitOutcome, CommitReadiness, CommittedDefinition, DeploymentReport, LifecycleState,
};

/// Primary Chaincode Lifecycle API
///
/// Steps are individually idempotent; `deploy` chains them.
#[async_trait]
pub trait ChaincodeLifecycleApi: Send + Sync {
    /// Build the artifact from `descriptor.source_ref`. No ledger call.
    fn package(&self, descriptor: &ContractDescriptor) -> Result<PackageArtifact, LifecycleError>;

    /// Install on every peer of `org`. Already-installed is success.
    async fn install(&self, artifact: &PackageArtifact, org: &MspId) -> Result<PackageId, LifecycleError>;

    /// Record `org`'s approval of `package_id` at `sequence`.
    ///
    /// Re-approving the same package is a no-op; a different package at the
    /// same sequence is an `ApprovalConflict`.
    async fn approve(
        &self,
        descriptor: &ContractDescriptor,
        sequence: u64,
        package_id: &PackageId,
        org: &MspId,
    ) -> Result<(), LifecycleError>;

    /// Read-only readiness check across `required_orgs`.
    async fn check_commit_readiness(
        &self,
        descriptor: &ContractDescriptor,
        sequence: u64,
        required_orgs: &[MspId],
    ) -> Result<CommitReadiness, LifecycleError>;

    /// Commit the definition, submitted by `committing_org`.
    ///
    /// Losing a commit race to another committer is `AlreadyCommitted`, not
    /// an error.
    async fn commit(
        &self,
        descriptor: &ContractDescriptor,
        sequence: u64,
        committing_org: &MspId,
    ) -> Result<CommitOutcome, LifecycleError>;

    /// Run the init entrypoint when the descriptor declares one.
    ///
    /// Returns `None` when no init is declared. A second run surfaces
    /// `LifecycleError::AlreadyInitialized`.
    async fn init_if_declared(
        &self,
        descriptor: &ContractDescriptor,
        initiating_org: &MspId,
    ) -> Result<Option<TransactionResult>, LifecycleError>;

    /// Currently committed definition for `name`.
    async fn query_committed(&self, name: &str) -> Result<Option<CommittedDefinition>, LifecycleError>;

    /// Where `package_id` at `sequence` sits in the lifecycle.
    async fn lifecycle_state(
        &self,
        descriptor: &ContractDescriptor,
        sequence: u64,
        package_id: &PackageId,
    ) -> Result<LifecycleState, LifecycleError>;

    /// Package, install and approve per organization, commit, then init
    /// with `init_args`. Already-initialized is reported, not failed.
    async fn deploy(
        &self,
        descriptor: &ContractDescriptor,
        init_args: &[String],
    ) -> Result<DeploymentReport, LifecycleError>;
}
