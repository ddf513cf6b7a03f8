//! # Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Ensure the channel (create, join every peer, anchor peers)
//! 2. Deploy each configured contract (package, install, approve, commit, init)
//! 3. Set each contract's service status
//! 4. Start the block listener and one contract-event listener per contract
//! 5. Serve the gateway until shutdown
//!
//! ## Shutdown
//!
//! Every listener unsubscribes before its task ends, on the shutdown signal
//! or when the hub closes its stream. A startup failure after some
//! subscriptions were taken releases them before returning.

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use ledger_sim::LedgerSim;
use parking_lot::Mutex;
use pc_01_network_bootstrap::{ChannelHandle, NetworkBootstrapApi};
use pc_02_chaincode_lifecycle::{ChaincodeLifecycleApi, DeploymentReport};
use shared_bus::{EventFilter, StartPosition, Subscription};
use shared_types::ContractDescriptor;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::container::{NodeConfig, NodeContainer};
use crate::errors::RuntimeError;
use crate::gateway::GatewayRuntime;
use crate::handlers::{EventListener, ListenerKind};

/// How long shutdown waits for listeners to release their subscriptions.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// What `start` brought up.
#[derive(Debug, Clone)]
pub struct StartupReport {
    pub channel: ChannelHandle,
    /// One report per configured contract, in configuration order.
    pub deployments: Vec<DeploymentReport>,
}

/// The main node runtime orchestrating all subsystems.
pub struct NodeRuntime {
    container: Arc<NodeContainer>,
    listeners: Mutex<Vec<JoinHandle<()>>>,
    /// Distinct events the listeners handled.
    observed: Arc<AtomicU64>,
    started: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    /// Create a runtime over a fresh dev ledger.
    pub fn new(config: NodeConfig) -> Result<Self, RuntimeError> {
        Ok(Self::from_container(NodeContainer::new(config)?))
    }

    /// Create a runtime over an existing ledger handle.
    pub fn with_ledger(config: NodeConfig, ledger: LedgerSim) -> Result<Self, RuntimeError> {
        Ok(Self::from_container(NodeContainer::with_ledger(config, ledger)?))
    }

    fn from_container(container: NodeContainer) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container: Arc::new(container),
            listeners: Mutex::new(Vec::new()),
            observed: Arc::new(AtomicU64::new(0)),
            started: AtomicBool::new(false),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Run the startup sequence. Callable once.
    pub async fn start(&self) -> Result<StartupReport, RuntimeError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(RuntimeError::AlreadyStarted);
        }
        let network = &self.container.network;
        info!(
            channel = %network.channel_id,
            orderer = %network.ordering_endpoint,
            organizations = network.organizations.len(),
            contracts = self.container.config.deployment.contracts.len(),
            "Starting node runtime"
        );

        let channel = self.container.bootstrap.ensure_channel(network).await?;
        info!(channel = %channel.channel_id, members = ?channel.members, "Channel ready");

        let contracts = &self.container.config.deployment.contracts;
        let mut deployments = Vec::with_capacity(contracts.len());
        for descriptor in contracts {
            let report = self
                .container
                .lifecycle
                .deploy(descriptor, &self.container.config.lifecycle.init_args)
                .await
                .map_err(|source| RuntimeError::Deployment {
                    contract: descriptor.name.clone(),
                    source,
                })?;
            self.init_service(descriptor).await?;
            deployments.push(report);
        }

        self.start_listeners(contracts).await?;
        info!(
            operations = self.container.gateway.registry().len(),
            "Gateway ready"
        );

        Ok(StartupReport {
            channel,
            deployments,
        })
    }

    /// Confirm the contract serves the definition this run deployed.
    async fn init_service(&self, descriptor: &ContractDescriptor) -> Result<(), RuntimeError> {
        let contract = descriptor.name.as_str();
        info!(contract, "Setting contract service status");

        let status = match self.container.lifecycle.query_committed(contract).await {
            Ok(None) => Err("definition is not committed".to_string()),
            Ok(Some(c)) if c.sequence != descriptor.sequence => Err(format!(
                "committed sequence {} differs from configured {}",
                c.sequence, descriptor.sequence
            )),
            Ok(Some(c)) if c.init_required && !c.initialized => Err("init entrypoint has not run".to_string()),
            Ok(Some(_)) => Ok(()),
            Err(e) => Err(e.to_string()),
        };

        // An error here is a failed init.
        if let Err(reason) = status {
            error!(contract, reason = %reason, "Init service failed");
            return Err(RuntimeError::InitService {
                contract: contract.to_string(),
                reason,
            });
        }
        info!(contract, "Contract service status set");
        Ok(())
    }

    async fn start_listeners(&self, contracts: &[ContractDescriptor]) -> Result<(), RuntimeError> {
        let hub = &self.container.events;
        let mut wanted = vec![("blocks".to_string(), ListenerKind::Block, EventFilter::blocks())];
        wanted.extend(contracts.iter().map(|c| {
            (
                format!("{}-events", c.name),
                ListenerKind::ContractEvent,
                EventFilter::contract(c.name.clone()),
            )
        }));

        let mut acquired: Vec<(String, ListenerKind, Subscription)> = Vec::with_capacity(wanted.len());
        for (name, kind, filter) in wanted {
            match hub.subscribe(filter, StartPosition::Current).await {
                Ok(subscription) => acquired.push((name, kind, subscription)),
                Err(e) => {
                    for (_, _, subscription) in acquired {
                        hub.unsubscribe(subscription).await;
                    }
                    return Err(e.into());
                }
            }
        }

        let count = acquired.len();
        let mut handles = self.listeners.lock();
        for (name, kind, subscription) in acquired {
            let listener = EventListener::new(name, kind, subscription, Arc::clone(&self.observed));
            handles.push(tokio::spawn(listener.run(self.shutdown_rx.clone())));
        }
        info!(listeners = count, "Event listeners started");
        Ok(())
    }

    /// Shut the node down gracefully.
    ///
    /// 1. Signal every listener
    /// 2. Wait (bounded) for them to unsubscribe
    /// 3. Close the event hub
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.shutdown_tx.send_replace(true);

        let handles = std::mem::take(&mut *self.listeners.lock());
        if tokio::time::timeout(SHUTDOWN_GRACE, join_all(handles))
            .await
            .is_err()
        {
            warn!(grace = ?SHUTDOWN_GRACE, "Listeners did not stop in time");
        }
        self.container.events.shutdown();

        info!("Shutdown complete");
    }

    /// Serve until `signal` resolves, then shut down.
    ///
    /// Shutdown runs whether the signal fired or failed; a failed signal is
    /// returned after the listeners have unsubscribed.
    pub async fn serve_until<F>(&self, signal: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = io::Result<()>>,
    {
        let result = signal.await;
        if let Err(e) = &result {
            error!(error = %e, "Waiting for the shutdown signal failed");
        }
        self.shutdown().await;
        result.map_err(RuntimeError::from)
    }

    /// Handle for the external request layer.
    pub fn gateway(&self) -> GatewayRuntime {
        GatewayRuntime::new(self.container.gateway.clone())
    }

    pub fn container(&self) -> Arc<NodeContainer> {
        Arc::clone(&self.container)
    }

    /// Distinct events the listeners have handled so far.
    pub fn events_observed(&self) -> u64 {
        self.observed.load(Ordering::Relaxed)
    }

    /// Subscriptions still registered with the hub.
    pub fn active_subscriptions(&self) -> usize {
        self.container.events.active_subscriptions()
    }
}
