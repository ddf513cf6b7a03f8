//! Outbound Ports (Driven Ports / SPI)
//!
//! Lifecycle calls against the ledger, made with the organization's admin
//! identity. Queries read committed ledger state and are always fresh.

use async_trait::async_trait;
use shared_types::{LedgerError, Organization, PackageArtifact, PackageId, TransactionId};

use crate::domain::value_objects::{ApprovedDefinition, CommittedDefinition};

/// Lifecycle operations one organization can perform.
#[async_trait]
pub trait LifecyclePeer: Send + Sync {
    /// Whether every peer of the organization has the package installed.
    async fn query_installed(&self, org: &Organization, package_id: &PackageId) -> Result<bool, LedgerError>;

    /// Install on every peer of the organization.
    async fn install(&self, org: &Organization, artifact: &PackageArtifact) -> Result<PackageId, LedgerError>;

    /// The organization's approval for (name, sequence), if any.
    async fn query_approved(
        &self,
        org: &Organization,
        channel_id: &str,
        name: &str,
        sequence: u64,
    ) -> Result<Option<ApprovedDefinition>, LedgerError>;

    /// Record the organization's approval.
    async fn approve(
        &self,
        org: &Organization,
        channel_id: &str,
        definition: &ApprovedDefinition,
    ) -> Result<(), LedgerError>;

    /// Currently committed definition for `name`.
    async fn query_committed(
        &self,
        org: &Organization,
        channel_id: &str,
        name: &str,
    ) -> Result<Option<CommittedDefinition>, LedgerError>;

    /// Number of the organization's peers that answer right now.
    async fn reachable_peers(&self, org: &Organization) -> Result<usize, LedgerError>;

    /// Submit the commit transaction, endorsed by `endorsers`.
    async fn commit(
        &self,
        org: &Organization,
        channel_id: &str,
        definition: &ApprovedDefinition,
        endorsers: &[&Organization],
    ) -> Result<TransactionId, LedgerError>;

    /// Invoke the contract's init entrypoint.
    async fn init(
        &self,
        org: &Organization,
        channel_id: &str,
        name: &str,
        function: &str,
        args: &[String],
    ) -> Result<TransactionId, LedgerError>;
}
