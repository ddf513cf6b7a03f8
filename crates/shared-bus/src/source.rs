//! # Block Source Port
//!
//! The driven side of the event hub: whatever can hand over committed blocks
//! in height order. Implemented by the ledger adapter in `node-runtime`.

use async_trait::async_trait;
use shared_types::{BlockNumber, LedgerError};

use crate::events::CommittedBlock;

/// Read access to the channel's committed block stream.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Number of committed blocks; the next block to commit has this number.
    async fn height(&self) -> Result<BlockNumber, LedgerError>;

    /// Wait until block `number` is committed and return it.
    ///
    /// Must be cancel-safe: the hub drops this future when a subscription
    /// is released.
    async fn wait_for_block(&self, number: BlockNumber) -> Result<CommittedBlock, LedgerError>;
}
