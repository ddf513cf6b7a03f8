//! Outbound Ports (Driven Ports / SPI)
//!
//! What bootstrap needs from the ledger platform. Every call is made with
//! the organization's admin identity.

use async_trait::async_trait;
use shared_types::{LedgerError, NetworkConfig, Organization};

/// Channel administration against peers and the ordering service.
#[async_trait]
pub trait ChannelAdmin: Send + Sync {
    /// Whether the ordering service already knows the channel.
    async fn channel_exists(&self, channel_id: &str) -> Result<bool, LedgerError>;

    /// Submit the channel creation transaction from `network.channel_config_ref`.
    async fn create_channel(&self, network: &NetworkConfig) -> Result<(), LedgerError>;

    /// Channels the peer has joined.
    async fn joined_channels(&self, org: &Organization, peer: &str) -> Result<Vec<String>, LedgerError>;

    /// Join one peer to the channel.
    async fn join_channel(&self, org: &Organization, peer: &str, channel_id: &str) -> Result<(), LedgerError>;

    /// Whether the organization's anchor peers are already in the channel config.
    async fn anchor_peers_configured(&self, org: &Organization, channel_id: &str) -> Result<bool, LedgerError>;

    /// Submit the anchor peer update from `org.anchor_peer_config_ref`.
    async fn update_anchor_peers(&self, org: &Organization, channel_id: &str) -> Result<(), LedgerError>;
}
