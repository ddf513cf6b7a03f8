//! Startup failures of the node runtime.

use pc_01_network_bootstrap::SetupError;
use pc_02_chaincode_lifecycle::LifecycleError;
use shared_bus::SubscriptionError;
use shared_types::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Channel setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("Deployment of {contract} failed: {source}")]
    Deployment {
        contract: String,
        source: LifecycleError,
    },

    /// The deployed contract is not serving its committed definition.
    #[error("Init service for {contract} failed: {reason}")]
    InitService { contract: String, reason: String },

    #[error("Event listener setup failed: {0}")]
    Subscription(#[from] SubscriptionError),

    #[error("Shutdown signal unavailable: {0}")]
    Signal(#[from] std::io::Error),

    #[error("Node runtime already started")]
    AlreadyStarted,
}
