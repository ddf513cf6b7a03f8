//! # Channel Admin Adapter
//!
//! Implements pc-01's `ChannelAdmin` port. Channel creation goes to the
//! ordering service; joins and anchor updates go through the organization's
//! own peers.

use async_trait::async_trait;
use ledger_sim::LedgerSim;
use pc_01_network_bootstrap::ChannelAdmin;
use shared_types::{LedgerError, NetworkConfig, Organization};
use tracing::debug;

use super::first_reachable;

pub struct SimChannelAdmin {
    ledger: LedgerSim,
}

impl SimChannelAdmin {
    pub fn new(ledger: LedgerSim) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl ChannelAdmin for SimChannelAdmin {
    async fn channel_exists(&self, channel_id: &str) -> Result<bool, LedgerError> {
        Ok(self.ledger.channel_exists(channel_id))
    }

    async fn create_channel(&self, network: &NetworkConfig) -> Result<(), LedgerError> {
        debug!(
            channel = %network.channel_id,
            orderer = %network.ordering_endpoint,
            config = %network.channel_config_ref,
            "Submitting channel creation"
        );
        self.ledger
            .create_channel(&network.channel_id, &network.msp_ids())
    }

    async fn joined_channels(&self, _org: &Organization, peer: &str) -> Result<Vec<String>, LedgerError> {
        self.ledger.joined_channels(peer)
    }

    async fn join_channel(&self, org: &Organization, peer: &str, channel_id: &str) -> Result<(), LedgerError> {
        debug!(msp_id = %org.msp_id, peer, channel = channel_id, "Joining peer");
        self.ledger.join_channel(peer, channel_id)
    }

    async fn anchor_peers_configured(&self, org: &Organization, channel_id: &str) -> Result<bool, LedgerError> {
        self.ledger.anchor_peers_configured(&org.msp_id, channel_id)
    }

    async fn update_anchor_peers(&self, org: &Organization, channel_id: &str) -> Result<(), LedgerError> {
        // Signed by the org admin through one of its own peers.
        let peer = first_reachable(&self.ledger, org)?;
        let tx_id = self.ledger.update_anchor_peers(&org.msp_id, channel_id)?;
        debug!(
            msp_id = %org.msp_id,
            peer = %peer,
            tx_id = %tx_id,
            config = %org.anchor_peer_config_ref,
            "Anchor peer update ordered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_01_network_bootstrap::{NetworkBootstrapApi, NetworkBootstrapService, SetupError};
    use shared_types::RetryPolicy;
    use std::sync::Arc;

    fn service(ledger: &LedgerSim) -> NetworkBootstrapService {
        NetworkBootstrapService::with_config(
            Arc::new(SimChannelAdmin::new(ledger.clone())),
            pc_01_network_bootstrap::BootstrapConfig {
                retry: RetryPolicy::none(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_bootstrap_over_ledger() {
        let ledger = LedgerSim::default();
        let network = NetworkConfig::default();

        let handle = service(&ledger).ensure_channel(&network).await.unwrap();

        assert_eq!(handle.members, network.msp_ids());
        for org in &network.organizations {
            assert!(ledger.anchor_peers_configured(&org.msp_id, "mychannel").unwrap());
            for peer in org.peer_names() {
                assert_eq!(ledger.joined_channels(&peer).unwrap(), vec!["mychannel".to_string()]);
            }
        }
    }

    #[tokio::test]
    async fn test_second_run_adds_no_blocks() {
        let ledger = LedgerSim::default();
        let network = NetworkConfig::default();
        service(&ledger).ensure_channel(&network).await.unwrap();
        let height = ledger.height();

        service(&ledger).ensure_channel(&network).await.unwrap();
        assert_eq!(ledger.height(), height);
    }

    #[tokio::test]
    async fn test_down_org_is_partial_and_retryable() {
        let ledger = LedgerSim::default();
        let network = NetworkConfig::default();
        let org2 = network.organizations[1].clone();
        ledger.set_peers_reachable(org2.peer_names(), false);

        let err = service(&ledger).ensure_channel(&network).await.unwrap_err();
        assert!(matches!(err, SetupError::Partial { .. }));
        assert_eq!(err.failed_orgs(), vec![org2.msp_id.clone()]);

        ledger.set_peers_reachable(org2.peer_names(), true);
        service(&ledger)
            .ensure_channel_for(&network, &err.failed_orgs())
            .await
            .unwrap();
        assert!(ledger.anchor_peers_configured(&org2.msp_id, "mychannel").unwrap());
    }
}
