//! Network Bootstrap Service
//!
//! Orchestrates the bootstrap pipeline:
//! 1. Validate the registry
//! 2. Create the channel if absent
//! 3. Join every peer of every organization (organizations run concurrently)
//! 4. Update each organization's anchor peers
//!
//! Every step first asks the ledger whether it is already done, so a rerun
//! after a crash or a partial failure only repeats the missing pieces.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use shared_types::{retry_transient, MspId, NetworkConfig, Organization};

use crate::config::BootstrapConfig;
use crate::domain::entities::{BootstrapStep, ChannelHandle, OrgOutcome};
use crate::domain::errors::SetupError;
use crate::ports::inbound::NetworkBootstrapApi;
use crate::ports::outbound::ChannelAdmin;

/// Network Bootstrap Service
pub struct NetworkBootstrapService {
    admin: Arc<dyn ChannelAdmin>,
    config: BootstrapConfig,
}

impl NetworkBootstrapService {
    pub fn new(admin: Arc<dyn ChannelAdmin>) -> Self {
        Self::with_config(admin, BootstrapConfig::default())
    }

    pub fn with_config(admin: Arc<dyn ChannelAdmin>, config: BootstrapConfig) -> Self {
        Self { admin, config }
    }

    async fn ensure_channel_created(&self, network: &NetworkConfig) -> Result<(), SetupError> {
        let retry = &self.config.retry;
        let channel_id = network.channel_id.as_str();
        let creation_failed = |source| SetupError::ChannelCreation {
            channel_id: channel_id.to_string(),
            source,
        };

        let exists = retry_transient(retry, "channel_exists", || self.admin.channel_exists(channel_id))
            .await
            .map_err(creation_failed)?;
        if exists {
            debug!(channel = channel_id, "Channel already exists");
            return Ok(());
        }

        retry_transient(retry, "create_channel", || self.admin.create_channel(network))
            .await
            .map_err(creation_failed)?;
        info!(channel = channel_id, orderer = %network.ordering_endpoint, "Channel created");
        Ok(())
    }

    /// Join all peers and set anchor peers for one organization.
    async fn bootstrap_org(&self, org: &Organization, channel_id: &str) -> OrgOutcome {
        let mut outcome = OrgOutcome::new(org.msp_id.clone());
        let retry = &self.config.retry;

        for peer in org.peer_names() {
            let joined = retry_transient(retry, "joined_channels", || {
                self.admin.joined_channels(org, &peer)
            })
            .await;
            let step = match joined {
                Ok(channels) if channels.iter().any(|c| c == channel_id) => {
                    outcome.already_joined.push(peer);
                    continue;
                }
                Ok(_) => {
                    retry_transient(retry, "join_channel", || {
                        self.admin.join_channel(org, &peer, channel_id)
                    })
                    .await
                }
                Err(e) => Err(e),
            };
            match step {
                Ok(()) => {
                    info!(msp_id = %org.msp_id, peer = %peer, channel = channel_id, "Peer joined channel");
                    outcome.joined_peers.push(peer);
                }
                Err(e) => {
                    warn!(msp_id = %org.msp_id, peer = %peer, error = %e, "Peer join failed");
                    outcome.failure = Some((BootstrapStep::JoinPeers, format!("{peer}: {e}")));
                    return outcome;
                }
            }
        }

        let configured = retry_transient(retry, "anchor_peers_configured", || {
            self.admin.anchor_peers_configured(org, channel_id)
        })
        .await;
        let anchors = match configured {
            Ok(true) => Ok(false),
            Ok(false) => retry_transient(retry, "update_anchor_peers", || {
                self.admin.update_anchor_peers(org, channel_id)
            })
            .await
            .map(|()| true),
            Err(e) => Err(e),
        };
        match anchors {
            Ok(updated) => {
                if updated {
                    info!(msp_id = %org.msp_id, channel = channel_id, "Anchor peers updated");
                }
                outcome.anchor_updated = updated;
            }
            Err(e) => {
                warn!(msp_id = %org.msp_id, error = %e, "Anchor peer update failed");
                outcome.failure = Some((BootstrapStep::UpdateAnchorPeers, e.to_string()));
            }
        }
        outcome
    }

    async fn run(&self, network: &NetworkConfig, orgs: Vec<&Organization>) -> Result<ChannelHandle, SetupError> {
        self.ensure_channel_created(network).await?;

        let channel_id = network.channel_id.as_str();
        let outcomes: Vec<OrgOutcome> = if self.config.concurrent_orgs {
            join_all(orgs.iter().map(|org| self.bootstrap_org(org, channel_id))).await
        } else {
            let mut outcomes = Vec::with_capacity(orgs.len());
            for org in &orgs {
                outcomes.push(self.bootstrap_org(org, channel_id).await);
            }
            outcomes
        };

        if outcomes.iter().any(|o| !o.is_success()) {
            return Err(SetupError::Partial {
                channel_id: channel_id.to_string(),
                outcomes,
            });
        }

        let noop = outcomes.iter().all(OrgOutcome::was_noop);
        info!(
            channel = channel_id,
            organizations = outcomes.len(),
            already_in_place = noop,
            "Channel bootstrap complete"
        );

        Ok(ChannelHandle {
            channel_id: channel_id.to_string(),
            members: network.msp_ids(),
        })
    }
}

#[async_trait]
impl NetworkBootstrapApi for NetworkBootstrapService {
    async fn ensure_channel(&self, network: &NetworkConfig) -> Result<ChannelHandle, SetupError> {
        network.validate()?;
        self.run(network, network.organizations.iter().collect()).await
    }

    async fn ensure_channel_for(
        &self,
        network: &NetworkConfig,
        orgs: &[MspId],
    ) -> Result<ChannelHandle, SetupError> {
        network.validate()?;
        let selected = orgs
            .iter()
            .map(|id| {
                network
                    .organization(id)
                    .ok_or_else(|| SetupError::UnknownOrganization(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.run(network, selected).await
    }
}
