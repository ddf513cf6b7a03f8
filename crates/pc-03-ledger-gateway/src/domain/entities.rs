//! Gateway requests, responses and registered operations.

use serde::{Deserialize, Serialize};
use shared_types::{BlockNumber, OperationConfig, OperationKind, TransactionId};
use std::fmt;
use std::time::Duration;

/// A dispatchable contract operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub contract: String,
    pub operation: String,
    pub kind: OperationKind,
    pub arity: usize,
    /// Overrides the gateway default deadline.
    pub timeout: Option<Duration>,
}

impl OperationSpec {
    pub fn mutating(contract: &str, operation: &str, arity: usize) -> Self {
        Self::new(contract, operation, OperationKind::Mutating, arity)
    }

    pub fn read_only(contract: &str, operation: &str, arity: usize) -> Self {
        Self::new(contract, operation, OperationKind::ReadOnly, arity)
    }

    fn new(contract: &str, operation: &str, kind: OperationKind, arity: usize) -> Self {
        Self {
            contract: contract.to_string(),
            operation: operation.to_string(),
            kind,
            arity,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `contract.operation`, used in errors and logs.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.contract, self.operation)
    }
}

impl From<&OperationConfig> for OperationSpec {
    fn from(config: &OperationConfig) -> Self {
        Self {
            contract: config.contract.clone(),
            operation: config.operation.clone(),
            kind: config.kind,
            arity: config.arity,
            timeout: config.timeout_ms.map(Duration::from_millis),
        }
    }
}

impl fmt::Display for OperationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({}, {} args)", self.contract, self.operation, self.kind, self.arity)
    }
}

/// One call from the external request layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRequest {
    pub contract: String,
    pub operation: String,
    pub args: Vec<String>,
    /// Caller deadline in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl GatewayRequest {
    pub fn new(contract: &str, operation: &str, args: &[&str]) -> Self {
        Self {
            contract: contract.to_string(),
            operation: operation.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout_ms: None,
        }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// What the core hands back to the request layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayResponse {
    /// Mutating call ordered; commit is not awaited.
    Submitted { tx_id: TransactionId },
    /// Raw payload of a read-only call.
    Payload(Vec<u8>),
}

/// Channel summary for the request layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel_id: String,
    pub block_count: BlockNumber,
    pub transaction_count: u64,
}
