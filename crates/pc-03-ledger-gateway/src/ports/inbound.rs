//! Inbound Ports (Driving Ports / API)

use async_trait::async_trait;
use shared_types::{BlockNumber, TransactionId, TransactionResult};
use std::time::Duration;

use crate::domain::entities::{ChannelInfo, GatewayRequest, GatewayResponse};
use crate::domain::errors::GatewayError;

/// Primary Ledger Gateway API
#[async_trait]
pub trait LedgerGatewayApi: Send + Sync {
    /// Submit a mutating operation. Returns once the transaction is ordered;
    /// commit is observed through the event hub. Never retried.
    async fn invoke(
        &self,
        contract: &str,
        operation: &str,
        args: &[String],
        deadline: Option<Duration>,
    ) -> Result<TransactionResult, GatewayError>;

    /// Evaluate a read-only operation on one peer. May observe state older
    /// than a transaction already returned to the same caller.
    async fn query(
        &self,
        contract: &str,
        operation: &str,
        args: &[String],
        deadline: Option<Duration>,
    ) -> Result<Vec<u8>, GatewayError>;

    /// Block holding `tx_id`, if committed. Used to reconcile timeouts.
    async fn lookup_transaction(&self, tx_id: &TransactionId) -> Result<Option<BlockNumber>, GatewayError>;

    /// Channel name with its block and transaction counts.
    async fn channel_info(&self) -> Result<ChannelInfo, GatewayError>;

    /// Route by the registered kind tag.
    async fn dispatch(&self, request: GatewayRequest) -> Result<GatewayResponse, GatewayError>;
}
