//! # Error Types
//!
//! Errors shared across subsystems: what the ledger platform reports back,
//! and what configuration loading rejects.

use thiserror::Error;

use crate::entities::MspId;

/// Failures reported by the ledger platform through a client handle.
///
/// Subsystems wrap these with the operation and organization they attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Peer or orderer could not be reached.
    #[error("Unreachable: {target}")]
    Unreachable { target: String },

    /// Transport-level failure (connection reset, broken stream).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The ledger rejected the request.
    #[error("Rejected by {target}: {reason}")]
    Rejected { target: String, reason: String },

    /// A definition for this sequence is already committed on the channel.
    #[error("Contract {contract} already committed at sequence {sequence}")]
    AlreadyCommitted { contract: String, sequence: u64 },

    /// The contract's init entrypoint already ran for the committed sequence.
    #[error("Contract {contract} already initialized")]
    AlreadyInitialized { contract: String },

    /// Not enough live endorsements to satisfy the policy.
    #[error("Endorsement failed: {0}")]
    EndorsementFailed(String),

    /// The contract operation itself returned an error.
    #[error("Contract error: {0}")]
    Contract(String),

    /// Channel, contract or transaction not known to the ledger.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl LedgerError {
    /// Whether a bounded retry may succeed without operator action.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Unreachable { .. } | LedgerError::Transport(_))
    }
}

/// Malformed or missing configuration. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Duplicate organization: {0}")]
    DuplicateOrganization(MspId),

    #[error("Duplicate operation: {contract}/{operation}")]
    DuplicateOperation { contract: String, operation: String },

    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LedgerError::Unreachable { target: "peer0".into() }.is_transient());
        assert!(LedgerError::Transport("reset".into()).is_transient());
        assert!(!LedgerError::AlreadyInitialized { contract: "nft".into() }.is_transient());
        assert!(!LedgerError::EndorsementFailed("Org2MSP down".into()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::AlreadyCommitted {
            contract: "nft".into(),
            sequence: 2,
        };
        assert_eq!(err.to_string(), "Contract nft already committed at sequence 2");
    }
}
