//! # Adapter Implementations
//!
//! Concrete implementations of every subsystem's outbound port over the
//! simulated ledger:
//!
//! | Port (crate)                    | Adapter             |
//! |---------------------------------|---------------------|
//! | `ChannelAdmin` (pc-01)          | `SimChannelAdmin`   |
//! | `LifecyclePeer` (pc-02)         | `SimLifecyclePeer`  |
//! | `ChannelClient` (pc-03)         | `SimChannelClient`  |
//! | `BlockSource` (shared-bus)      | `SimBlockSource`    |
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Subsystem services (pc-01, pc-02, pc-03, EventHub)          │
//! │                   ↓ call outbound ports ↓                    │
//! │  Adapters (this module): peer selection, type conversion     │
//! │                   ↓ call ↓                                   │
//! │  LedgerSim: channel, lifecycle tables, world state, blocks   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A platform client would replace these four adapters and nothing else.

pub mod block_source;
pub mod channel_admin;
pub mod channel_client;
pub mod lifecycle_peer;

pub use block_source::SimBlockSource;
pub use channel_admin::SimChannelAdmin;
pub use channel_client::SimChannelClient;
pub use lifecycle_peer::SimLifecyclePeer;

use ledger_sim::LedgerSim;
use shared_types::{LedgerError, Organization};

/// First peer of `org` that answers, or `Unreachable` naming its first peer.
pub(crate) fn first_reachable(ledger: &LedgerSim, org: &Organization) -> Result<String, LedgerError> {
    let peers = org.peer_names();
    if let Some(peer) = peers.iter().find(|p| ledger.is_reachable(p)) {
        return Ok(peer.clone());
    }
    Err(LedgerError::Unreachable {
        target: peers
            .into_iter()
            .next()
            .unwrap_or_else(|| org.msp_id.to_string()),
    })
}

/// Peer asked to endorse for `org`. Falls back to peer0 so the ledger
/// reports the endorsement failure itself.
pub(crate) fn endorsing_peer(ledger: &LedgerSim, org: &Organization) -> String {
    first_reachable(ledger, org).unwrap_or_else(|e| match e {
        LedgerError::Unreachable { target } => target,
        other => other.to_string(),
    })
}
