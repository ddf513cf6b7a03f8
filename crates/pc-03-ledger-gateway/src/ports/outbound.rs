//! Outbound Ports (Driven Ports / SPI)
//!
//! A channel client bound to one organization's ordinary identity. Shared by
//! all concurrent gateway calls, so implementations must be `Send + Sync`
//! and hold no lock across a call.

use async_trait::async_trait;
use shared_types::{BlockNumber, LedgerError, MspId, TransactionId};

use crate::domain::entities::ChannelInfo;

#[async_trait]
pub trait ChannelClient: Send + Sync {
    /// Organization whose identity signs requests.
    fn msp_id(&self) -> &MspId;

    /// Endorse and order. Returns once a transaction id is assigned.
    async fn submit(&self, contract: &str, function: &str, args: &[String]) -> Result<TransactionId, LedgerError>;

    /// Evaluate on a single peer's current view.
    async fn evaluate(&self, contract: &str, function: &str, args: &[String]) -> Result<Vec<u8>, LedgerError>;

    /// Block number of a committed transaction.
    async fn block_for_transaction(&self, tx_id: &TransactionId) -> Result<Option<BlockNumber>, LedgerError>;

    /// Block and transaction counts of the channel.
    async fn channel_info(&self) -> Result<ChannelInfo, LedgerError>;
}
