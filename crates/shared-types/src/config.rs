//! # Deployment Configuration
//!
//! Loads the organization registry, the contracts to deploy and the gateway
//! operation table from a single TOML file.
//!
//! ```toml
//! [network]
//! channel_id = "mychannel"
//! channel_config_ref = "fixtures/channel-artifacts/channel.tx"
//! ordering_org_name = "OrdererOrg"
//! ordering_endpoint = "orderer.example.com"
//!
//! [[network.organizations]]
//! name = "Org1"
//! msp_id = "Org1MSP"
//! admin_identity = "Admin"
//! ordinary_identity = "User1"
//! peer_count = 2
//! anchor_peer_config_ref = "fixtures/channel-artifacts/Org1MSPanchors.tx"
//!
//! [[contracts]]
//! name = "product"
//! source_ref = "chaincode/product"
//! version = "1.0.0"
//! sequence = 1
//!
//! [[operations]]
//! contract = "product"
//! operation = "CreateProduct"
//! kind = "mutating"
//! arity = 8
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::entities::{ContractDescriptor, NetworkConfig, OperationKind};
use crate::errors::ConfigError;

/// One row of the external routing table: how a named operation dispatches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationConfig {
    pub contract: String,
    pub operation: String,
    pub kind: OperationKind,
    /// Number of positional arguments the contract function expects.
    pub arity: usize,
    /// Per-operation deadline in milliseconds; gateway default when absent.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Everything the process reads at startup. Immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub network: NetworkConfig,
    #[serde(default)]
    pub contracts: Vec<ContractDescriptor>,
    /// Empty means the gateway's built-in catalogue.
    #[serde(default)]
    pub operations: Vec<OperationConfig>,
}

impl DeploymentConfig {
    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: DeploymentConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.network.validate()?;

        let mut names = HashSet::new();
        for contract in &self.contracts {
            if contract.name.trim().is_empty() {
                return Err(ConfigError::Missing("contract name".into()));
            }
            if !names.insert(contract.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "contract {} listed twice",
                    contract.name
                )));
            }
            if contract.sequence == 0 {
                return Err(ConfigError::Invalid(format!(
                    "contract {} has sequence 0; sequences start at 1",
                    contract.name
                )));
            }
            if let Some(policy) = &contract.endorsement_policy {
                if policy.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "contract {} has an empty endorsement policy",
                        contract.name
                    )));
                }
                if let Some(unknown) = policy.iter().find(|m| self.network.organization(m).is_none()) {
                    return Err(ConfigError::Invalid(format!(
                        "contract {} endorsement policy names unknown organization {}",
                        contract.name, unknown
                    )));
                }
            }
        }

        let mut ops = HashSet::new();
        for op in &self.operations {
            if !ops.insert((op.contract.as_str(), op.operation.as_str())) {
                return Err(ConfigError::DuplicateOperation {
                    contract: op.contract.clone(),
                    operation: op.operation.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for DeploymentConfig {
    /// Default registry plus the `nft`, `image` and `product` contracts.
    fn default() -> Self {
        let contracts = ["nft", "image", "product"]
            .into_iter()
            .map(|name| ContractDescriptor::new(name, format!("chaincode/{name}/"), "1.0.0"))
            .collect();
        Self {
            network: NetworkConfig::default(),
            contracts,
            operations: Vec::new(),
        }
    }
}
