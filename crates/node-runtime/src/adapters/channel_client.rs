//! # Channel Client Adapter
//!
//! Implements pc-03's `ChannelClient` port for one organization's ordinary
//! identity. Holds no lock of its own, so one instance serves every
//! concurrent gateway call.
//!
//! - `submit`: one endorsing peer per channel member, then ordering.
//! - `evaluate`: the first reachable peer of the client's own organization.

use async_trait::async_trait;
use ledger_sim::LedgerSim;
use pc_03_ledger_gateway::{ChannelClient, ChannelInfo};
use shared_types::{BlockNumber, ConfigError, LedgerError, MspId, NetworkConfig, Organization, TransactionId};
use tracing::debug;

use super::{endorsing_peer, first_reachable};

pub struct SimChannelClient {
    ledger: LedgerSim,
    channel_id: String,
    org: Organization,
    /// Channel members asked to endorse mutating calls.
    endorsers: Vec<Organization>,
}

impl SimChannelClient {
    /// Client for `msp_id`, endorsed by every registry organization.
    pub fn new(ledger: LedgerSim, network: &NetworkConfig, msp_id: &MspId) -> Result<Self, ConfigError> {
        let org = network
            .organization(msp_id)
            .cloned()
            .ok_or_else(|| ConfigError::Invalid(format!("gateway organization {msp_id} is not in the registry")))?;
        Ok(Self {
            ledger,
            channel_id: network.channel_id.clone(),
            org,
            endorsers: network.organizations.clone(),
        })
    }
}

#[async_trait]
impl ChannelClient for SimChannelClient {
    fn msp_id(&self) -> &MspId {
        &self.org.msp_id
    }

    async fn submit(&self, contract: &str, function: &str, args: &[String]) -> Result<TransactionId, LedgerError> {
        let peers: Vec<String> = self
            .endorsers
            .iter()
            .map(|o| endorsing_peer(&self.ledger, o))
            .collect();
        let tx_id = self
            .ledger
            .submit(&self.channel_id, contract, function, args, &peers)?;
        debug!(
            msp_id = %self.org.msp_id,
            identity = %self.org.ordinary_identity,
            contract,
            function,
            tx_id = %tx_id,
            "Transaction ordered"
        );
        Ok(tx_id)
    }

    async fn evaluate(&self, contract: &str, function: &str, args: &[String]) -> Result<Vec<u8>, LedgerError> {
        let peer = first_reachable(&self.ledger, &self.org)?;
        self.ledger
            .evaluate(&peer, &self.channel_id, contract, function, args)
    }

    async fn block_for_transaction(&self, tx_id: &TransactionId) -> Result<Option<BlockNumber>, LedgerError> {
        first_reachable(&self.ledger, &self.org)?;
        self.ledger.block_for_transaction(&self.channel_id, tx_id)
    }

    async fn channel_info(&self) -> Result<ChannelInfo, LedgerError> {
        first_reachable(&self.ledger, &self.org)?;
        let stats = self.ledger.channel_stats(&self.channel_id)?;
        Ok(ChannelInfo {
            channel_id: self.channel_id.clone(),
            block_count: stats.block_count,
            transaction_count: stats.transaction_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixtures::joined_network;
    use ledger_sim::Approval;
    use shared_types::PackageId;

    /// Commit a bare `nft` definition straight on the ledger.
    fn with_nft(ledger: &LedgerSim, network: &NetworkConfig) {
        let approval = Approval {
            name: "nft".into(),
            version: "1.0.0".into(),
            sequence: 1,
            package_id: PackageId("nft_1.0.0:00".into()),
            init_required: false,
        };
        let members = network.msp_ids();
        for msp in &members {
            ledger.approve(msp, "mychannel", approval.clone()).unwrap();
        }
        let peers: Vec<String> = network.organizations.iter().map(|o| o.peer_names()[0].clone()).collect();
        ledger.commit("mychannel", &approval, &members, &peers).unwrap();
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_submit_then_evaluate() {
        let (ledger, network) = joined_network();
        with_nft(&ledger, &network);
        let client = SimChannelClient::new(ledger.clone(), &network, &MspId::from("Org1MSP")).unwrap();

        let tx_id = client
            .submit("nft", "CreateImageNFT", &args(&["id-1", "alice", "data", "or", "wm"]))
            .await
            .unwrap();
        assert!(!tx_id.is_empty());
        assert!(client.block_for_transaction(&tx_id).await.unwrap().is_some());

        let payload = client.evaluate("nft", "GetImageNFTById", &args(&["id-1"])).await.unwrap();
        assert!(String::from_utf8(payload).unwrap().contains("alice"));
    }

    #[tokio::test]
    async fn test_channel_info_tracks_submissions() {
        let (ledger, network) = joined_network();
        with_nft(&ledger, &network);
        let client = SimChannelClient::new(ledger.clone(), &network, &MspId::from("Org1MSP")).unwrap();

        let before = client.channel_info().await.unwrap();
        assert_eq!(before.channel_id, "mychannel");
        assert_eq!(before.block_count, ledger.height());

        client
            .submit("nft", "CreateImageNFT", &args(&["id-1", "alice", "data", "or", "wm"]))
            .await
            .unwrap();
        let after = client.channel_info().await.unwrap();
        assert_eq!(after.block_count, before.block_count + 1);
        assert_eq!(after.transaction_count, before.transaction_count + 1);

        ledger.set_peers_reachable(network.organizations[0].peer_names(), false);
        assert!(matches!(client.channel_info().await, Err(LedgerError::Unreachable { .. })));
    }

    #[tokio::test]
    async fn test_evaluate_falls_over_to_second_peer() {
        let (ledger, network) = joined_network();
        with_nft(&ledger, &network);
        let client = SimChannelClient::new(ledger.clone(), &network, &MspId::from("Org1MSP")).unwrap();
        ledger.set_peer_reachable("peer0.org1.example.com", false);

        assert_eq!(client.evaluate("nft", "GetAllImageNFTs", &[]).await.unwrap(), b"[]");
    }

    #[tokio::test]
    async fn test_submit_fails_when_a_member_has_no_live_peer() {
        let (ledger, network) = joined_network();
        with_nft(&ledger, &network);
        let client = SimChannelClient::new(ledger.clone(), &network, &MspId::from("Org1MSP")).unwrap();
        ledger.set_peers_reachable(network.organizations[1].peer_names(), false);

        let err = client
            .submit("nft", "CreateImageNFT", &args(&["id-1", "alice", "d", "o", "w"]))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::EndorsementFailed(_)));
    }

    #[test]
    fn test_unknown_org_rejected() {
        let (ledger, network) = joined_network();
        assert!(SimChannelClient::new(ledger, &network, &MspId::from("Org9MSP")).is_err());
    }
}
