//! # Operation Registry
//!
//! Maps `(contract, operation)` to its kind tag and arity. One generic
//! invoke/query path serves every entry; nothing is inferred from names.

use shared_types::{ConfigError, OperationConfig};
use std::collections::BTreeMap;

use super::entities::OperationSpec;
use super::errors::GatewayError;

#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    entries: BTreeMap<(String, String), OperationSpec>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. A second entry for the same pair is a configuration error.
    pub fn register(&mut self, spec: OperationSpec) -> Result<(), ConfigError> {
        let key = (spec.contract.clone(), spec.operation.clone());
        if self.entries.contains_key(&key) {
            return Err(ConfigError::DuplicateOperation {
                contract: spec.contract,
                operation: spec.operation,
            });
        }
        self.entries.insert(key, spec);
        Ok(())
    }

    pub fn from_specs(specs: impl IntoIterator<Item = OperationSpec>) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    /// Registry from the `[[operations]]` table.
    pub fn from_config(operations: &[OperationConfig]) -> Result<Self, ConfigError> {
        Self::from_specs(operations.iter().map(OperationSpec::from))
    }

    /// The operations the stock `nft`, `image` and `product` contracts expose.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for spec in builtin_specs() {
            // Catalogue pairs are distinct.
            let _ = registry.register(spec);
        }
        registry
    }

    pub fn lookup(&self, contract: &str, operation: &str) -> Result<&OperationSpec, GatewayError> {
        self.entries
            .get(&(contract.to_string(), operation.to_string()))
            .ok_or_else(|| GatewayError::UnknownOperation {
                contract: contract.to_string(),
                operation: operation.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationSpec> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn builtin_specs() -> Vec<OperationSpec> {
    vec![
        // id, owner, data, operationRecord, digitalWatermark
        OperationSpec::mutating("nft", "CreateImageNFT", 5),
        // id, from, to
        OperationSpec::mutating("nft", "TransferImageNFT", 3),
        OperationSpec::mutating("nft", "BurnImageNFT", 1),
        OperationSpec::read_only("nft", "GetImageNFTById", 1),
        // id, operationRecord
        OperationSpec::read_only("nft", "GetImageNFTByOR", 2),
        // id, patientName, localRoute, modalCode, checkTime, status,
        // attachmentHash, totalHash
        OperationSpec::mutating("image", "CreateImage", 8),
        OperationSpec::read_only("image", "GetImage", 1),
        OperationSpec::read_only("image", "GetAllImages", 0),
        OperationSpec::mutating("product", "CreateProduct", 8),
        OperationSpec::read_only("product", "GetProduct", 1),
        OperationSpec::read_only("product", "GetAllProducts", 0),
    ]
}
