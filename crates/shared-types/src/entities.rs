//! # Core Domain Entities
//!
//! The static description of the consortium and the contract artifacts that
//! flow between subsystems.
//!
//! ## Clusters
//!
//! - **Registry**: `Organization`, `NetworkConfig`
//! - **Contracts**: `ContractDescriptor`, `PackageArtifact`, `PackageId`
//! - **Transactions**: `TransactionId`, `TransactionResult`
//! - **Dispatch**: `OperationKind`

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ConfigError;

/// Height of a block on the channel.
pub type BlockNumber = u64;

// =============================================================================
// CLUSTER A: THE REGISTRY
// =============================================================================

/// Membership service provider id, unique per organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MspId(pub String);

impl MspId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MspId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MspId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A participating organization. Immutable after bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Short organization name (e.g. `Org1`).
    pub name: String,
    /// Unique MSP id (e.g. `Org1MSP`).
    pub msp_id: MspId,
    /// Identity used for administrative transactions.
    pub admin_identity: String,
    /// Identity used for ordinary invokes and queries.
    pub ordinary_identity: String,
    /// Number of peers the organization runs.
    pub peer_count: u32,
    /// Reference to the anchor peer configuration update.
    pub anchor_peer_config_ref: String,
}

impl Organization {
    /// Peer host names: `peer0.org1.example.com`, `peer1.org1.example.com`, ...
    pub fn peer_names(&self) -> Vec<String> {
        let domain = self.name.to_lowercase();
        (0..self.peer_count)
            .map(|i| format!("peer{i}.{domain}.example.com"))
            .collect()
    }
}

/// Channel-wide configuration, created once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub channel_id: String,
    /// Reference to the channel creation transaction.
    pub channel_config_ref: String,
    pub ordering_org_name: String,
    pub ordering_endpoint: String,
    /// Organizations in registry order.
    pub organizations: Vec<Organization>,
}

impl NetworkConfig {
    /// Check the registry is usable before any component reads it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_id.trim().is_empty() {
            return Err(ConfigError::Missing("channel_id".into()));
        }
        if self.ordering_endpoint.trim().is_empty() {
            return Err(ConfigError::Missing("ordering_endpoint".into()));
        }
        if self.organizations.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one organization is required".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for org in &self.organizations {
            if org.msp_id.as_str().is_empty() {
                return Err(ConfigError::Missing(format!(
                    "msp_id for organization {}",
                    org.name
                )));
            }
            if !seen.insert(org.msp_id.clone()) {
                return Err(ConfigError::DuplicateOrganization(org.msp_id.clone()));
            }
            if org.peer_count == 0 {
                return Err(ConfigError::Invalid(format!(
                    "organization {} declares no peers",
                    org.msp_id
                )));
            }
        }
        Ok(())
    }

    /// Look up an organization by MSP id.
    pub fn organization(&self, msp_id: &MspId) -> Option<&Organization> {
        self.organizations.iter().find(|o| &o.msp_id == msp_id)
    }

    /// MSP ids in registry order.
    pub fn msp_ids(&self) -> Vec<MspId> {
        self.organizations.iter().map(|o| o.msp_id.clone()).collect()
    }
}

impl Default for NetworkConfig {
    /// The two-organization consortium the gateway ships with.
    fn default() -> Self {
        let org = |n: u32| Organization {
            name: format!("Org{n}"),
            msp_id: MspId(format!("Org{n}MSP")),
            admin_identity: "Admin".into(),
            ordinary_identity: "User1".into(),
            peer_count: 2,
            anchor_peer_config_ref: format!("fixtures/channel-artifacts/Org{n}MSPanchors.tx"),
        };
        Self {
            channel_id: "mychannel".into(),
            channel_config_ref: "fixtures/channel-artifacts/channel.tx".into(),
            ordering_org_name: "OrdererOrg".into(),
            ordering_endpoint: "orderer.example.com".into(),
            organizations: vec![org(1), org(2)],
        }
    }
}

// =============================================================================
// CLUSTER B: CONTRACTS
// =============================================================================

/// A smart contract definition targeted by one deployment round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDescriptor {
    /// Contract name, unique per deployment.
    pub name: String,
    /// Path of the contract source directory.
    pub source_ref: String,
    pub version: String,
    /// Lifecycle sequence; strictly increases on every redeploy.
    pub sequence: u64,
    /// Whether the contract declares a required init entrypoint.
    #[serde(default)]
    pub init_required: bool,
    /// Organizations whose endorsement the definition requires.
    /// `None` means every registry organization.
    #[serde(default)]
    pub endorsement_policy: Option<Vec<MspId>>,
}

impl ContractDescriptor {
    pub fn new(name: impl Into<String>, source_ref: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_ref: source_ref.into(),
            version: version.into(),
            sequence: 1,
            init_required: false,
            endorsement_policy: None,
        }
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    #[must_use]
    pub fn with_init_required(mut self, init_required: bool) -> Self {
        self.init_required = init_required;
        self
    }

    #[must_use]
    pub fn with_endorsement_policy(mut self, orgs: Vec<MspId>) -> Self {
        self.endorsement_policy = Some(orgs);
        self
    }

    /// Package label: `<name>_<version>`.
    pub fn label(&self) -> String {
        format!("{}_{}", self.name, self.version)
    }

    /// Organizations that must approve and endorse, resolved against the registry.
    pub fn required_orgs(&self, network: &NetworkConfig) -> Vec<MspId> {
        match &self.endorsement_policy {
            Some(orgs) => orgs.clone(),
            None => network.msp_ids(),
        }
    }
}

/// Content-addressed package identifier: `<label>:<sha256 hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(pub String);

impl PackageId {
    pub fn from_parts(label: &str, content_hash: &[u8; 32]) -> Self {
        Self(format!("{label}:{}", hex::encode(content_hash)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of the packaging step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageArtifact {
    pub label: String,
    pub content_hash: [u8; 32],
    pub package_id: PackageId,
    /// Deterministic archive bytes shipped to peers on install.
    pub bytes: Vec<u8>,
}

// =============================================================================
// CLUSTER C: TRANSACTIONS
// =============================================================================

/// Identifier of an ordered, endorsed write. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl TransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub transaction_id: TransactionId,
    pub payload: Option<Vec<u8>>,
}

// =============================================================================
// CLUSTER D: DISPATCH
// =============================================================================

/// Whether an operation mutates shared state or only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Endorsed, ordered and committed on the channel.
    Mutating,
    /// Evaluated on a single peer, possibly stale.
    ReadOnly,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Mutating => f.write_str("mutating"),
            OperationKind::ReadOnly => f.write_str("read-only"),
        }
    }
}
