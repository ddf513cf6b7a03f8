//! Bootstrap results.

use serde::{Deserialize, Serialize};
use shared_types::MspId;

/// A channel every listed organization has joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHandle {
    pub channel_id: String,
    /// Member organizations in registry order.
    pub members: Vec<MspId>,
}

/// Where an organization's bootstrap stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootstrapStep {
    JoinPeers,
    UpdateAnchorPeers,
}

/// Per-organization result of one `ensure_channel` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgOutcome {
    pub msp_id: MspId,
    /// Peers joined by this run.
    pub joined_peers: Vec<String>,
    /// Peers that were already members.
    pub already_joined: Vec<String>,
    /// Whether this run submitted an anchor peer update.
    pub anchor_updated: bool,
    /// Failed step and the ledger's reason; `None` on success.
    pub failure: Option<(BootstrapStep, String)>,
}

impl OrgOutcome {
    pub fn new(msp_id: MspId) -> Self {
        Self {
            msp_id,
            joined_peers: Vec::new(),
            already_joined: Vec::new(),
            anchor_updated: false,
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// True when this run issued no ledger transaction for the organization.
    pub fn was_noop(&self) -> bool {
        self.is_success() && self.joined_peers.is_empty() && !self.anchor_updated
    }
}
