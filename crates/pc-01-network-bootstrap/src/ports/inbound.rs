//! Inbound Ports (Driving Ports / API)

use async_trait::async_trait;
use shared_types::{MspId, NetworkConfig};

use crate::domain::entities::ChannelHandle;
use crate::domain::errors::SetupError;

/// Primary Network Bootstrap API
#[async_trait]
pub trait NetworkBootstrapApi: Send + Sync {
    /// Make sure the channel exists and every registry organization is a
    /// member with its anchor peers set.
    ///
    /// Idempotent: steps already in place issue no ledger transaction.
    async fn ensure_channel(&self, network: &NetworkConfig) -> Result<ChannelHandle, SetupError>;

    /// Same as `ensure_channel`, limited to `orgs`. Used to retry the failed
    /// subset reported by `SetupError::Partial`.
    async fn ensure_channel_for(
        &self,
        network: &NetworkConfig,
        orgs: &[MspId],
    ) -> Result<ChannelHandle, SetupError>;
}
