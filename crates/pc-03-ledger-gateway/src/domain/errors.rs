//! Error types for the Ledger Gateway

use shared_types::{ConfigError, LedgerError, MspId, OperationKind};
use std::time::Duration;
use thiserror::Error;

/// Gateway failures.
///
/// Caller contract violations (`UnknownOperation`, `OperationKindMismatch`,
/// `ArgumentArity`) are raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Unknown operation {contract}.{operation}")]
    UnknownOperation { contract: String, operation: String },

    /// Invoke on a read-only operation, or query on a mutating one.
    #[error("Operation {operation} is {registered}, called as {requested}")]
    OperationKindMismatch {
        operation: String,
        registered: OperationKind,
        requested: OperationKind,
    },

    #[error("Operation {operation} expects {expected} arguments, got {actual}")]
    ArgumentArity {
        operation: String,
        expected: usize,
        actual: usize,
    },

    /// Deadline exceeded. For a mutating call the transaction may still have
    /// been ordered; reconcile with `lookup_transaction`.
    #[error("Operation {operation} timed out after {elapsed:?} (may be ordered: {tx_may_be_ordered})")]
    Timeout {
        operation: String,
        elapsed: Duration,
        tx_may_be_ordered: bool,
    },

    #[error("Endorsement failed for {operation}: {reason}")]
    Endorsement { operation: String, reason: String },

    /// Any other failure reported through the organization's client.
    #[error("{operation} via {msp_id} failed: {source}")]
    Ledger {
        operation: String,
        msp_id: MspId,
        source: LedgerError,
    },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl GatewayError {
    /// Raised locally, before touching the network.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            GatewayError::UnknownOperation { .. }
                | GatewayError::OperationKindMismatch { .. }
                | GatewayError::ArgumentArity { .. }
        )
    }

    /// The outcome is unknown and must be reconciled by transaction id.
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            GatewayError::Timeout {
                tx_may_be_ordered: true,
                ..
            }
        )
    }
}
