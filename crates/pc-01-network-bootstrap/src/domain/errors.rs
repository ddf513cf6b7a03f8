//! Error types for Network Bootstrap

use shared_types::{ConfigError, LedgerError, MspId};
use thiserror::Error;

use super::entities::OrgOutcome;

/// Channel creation or join failures. Retryable per organization.
#[derive(Debug, Clone, Error)]
pub enum SetupError {
    /// Registry failed validation before any ledger call.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Creating the channel through the ordering service failed.
    #[error("Failed to create channel {channel_id}: {source}")]
    ChannelCreation {
        channel_id: String,
        source: LedgerError,
    },

    /// A requested organization is not in the registry.
    #[error("Unknown organization: {0}")]
    UnknownOrganization(MspId),

    /// One or more organizations failed; the rest are left joined.
    #[error("Bootstrap of channel {channel_id} failed for {}", failed_list(.outcomes))]
    Partial {
        channel_id: String,
        outcomes: Vec<OrgOutcome>,
    },
}

impl SetupError {
    /// Organizations to retry after a partial failure.
    pub fn failed_orgs(&self) -> Vec<MspId> {
        match self {
            SetupError::Partial { outcomes, .. } => outcomes
                .iter()
                .filter(|o| !o.is_success())
                .map(|o| o.msp_id.clone())
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn failed_list(outcomes: &[OrgOutcome]) -> String {
    outcomes
        .iter()
        .filter_map(|o| {
            o.failure
                .as_ref()
                .map(|(step, reason)| format!("{} ({step:?}: {reason})", o.msp_id))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::BootstrapStep;

    #[test]
    fn test_partial_error_names_failed_orgs() {
        let ok = OrgOutcome::new(MspId::from("Org1MSP"));
        let mut failed = OrgOutcome::new(MspId::from("Org2MSP"));
        failed.failure = Some((BootstrapStep::JoinPeers, "Unreachable: peer1.org2".into()));

        let err = SetupError::Partial {
            channel_id: "mychannel".into(),
            outcomes: vec![ok, failed],
        };
        assert_eq!(err.failed_orgs(), vec![MspId::from("Org2MSP")]);
        assert_eq!(
            err.to_string(),
            "Bootstrap of channel mychannel failed for Org2MSP (JoinPeers: Unreachable: peer1.org2)"
        );
    }
}
