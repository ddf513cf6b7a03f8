//! # Subsystem Container
//!
//! Holds every subsystem service, each wired to its ledger adapter.
//!
//! ## Initialization Order
//!
//! ```text
//! Ledger handle (dev: LedgerSim)
//!   ├─ pc-01 NetworkBootstrapService  ← SimChannelAdmin
//!   ├─ pc-02 LifecycleManager         ← SimLifecyclePeer
//!   ├─ pc-03 LedgerGateway            ← SimChannelClient + OperationRegistry
//!   └─ EventHub                       ← SimBlockSource
//! ```
//!
//! The registry is read once here and shared by `Arc`; nothing mutates it
//! afterwards.

use std::sync::Arc;

use ledger_sim::LedgerSim;
use pc_01_network_bootstrap::NetworkBootstrapService;
use pc_02_chaincode_lifecycle::LifecycleManager;
use pc_03_ledger_gateway::{LedgerGateway, OperationRegistry};
use shared_bus::EventHub;
use shared_types::{ConfigError, NetworkConfig};
use tracing::info;

use crate::adapters::{SimBlockSource, SimChannelAdmin, SimChannelClient, SimLifecyclePeer};
use crate::container::config::NodeConfig;

/// Central container holding all subsystem instances.
pub struct NodeContainer {
    pub config: NodeConfig,
    pub network: Arc<NetworkConfig>,
    pub ledger: LedgerSim,
    /// pc-01
    pub bootstrap: Arc<NetworkBootstrapService>,
    /// pc-02
    pub lifecycle: Arc<LifecycleManager>,
    /// pc-03
    pub gateway: Arc<LedgerGateway>,
    pub events: Arc<EventHub>,
}

impl NodeContainer {
    /// Build every subsystem over a fresh dev ledger.
    pub fn new(config: NodeConfig) -> Result<Self, ConfigError> {
        let ledger = LedgerSim::new(config.sim.clone());
        Self::with_ledger(config, ledger)
    }

    /// Build every subsystem over an existing ledger handle.
    pub fn with_ledger(config: NodeConfig, ledger: LedgerSim) -> Result<Self, ConfigError> {
        config.validate()?;
        let network = Arc::new(config.deployment.network.clone());

        let bootstrap = Arc::new(NetworkBootstrapService::with_config(
            Arc::new(SimChannelAdmin::new(ledger.clone())),
            config.bootstrap.clone(),
        ));

        let lifecycle = Arc::new(LifecycleManager::with_config(
            Arc::new(SimLifecyclePeer::new(ledger.clone())),
            Arc::clone(&network),
            config.lifecycle.clone(),
        ));

        let registry = if config.deployment.operations.is_empty() {
            OperationRegistry::builtin()
        } else {
            OperationRegistry::from_config(&config.deployment.operations)?
        };
        let gateway_org = config.gateway_msp_id()?;
        let client = SimChannelClient::new(ledger.clone(), &network, &gateway_org)?;
        let gateway = Arc::new(LedgerGateway::with_config(
            Arc::new(client),
            Arc::new(registry),
            config.gateway.clone(),
        ));

        let events = Arc::new(EventHub::with_config(
            Arc::new(SimBlockSource::new(ledger.clone())),
            config.events.clone(),
        ));

        info!(
            channel = %network.channel_id,
            organizations = network.organizations.len(),
            operations = gateway.registry().len(),
            gateway_org = %gateway_org,
            "Subsystems initialized"
        );

        Ok(Self {
            config,
            network,
            ledger,
            bootstrap,
            lifecycle,
            gateway,
            events,
        })
    }
}
