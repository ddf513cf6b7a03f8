//! Shared fixtures: networks over a fresh simulated ledger, contract source
//! trees on disk and a generic asset operation table.

use std::fs;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use ledger_sim::{LedgerSim, SimConfig};
use node_runtime::{GatewayRuntime, NodeConfig, NodeContainer};
use pc_01_network_bootstrap::NetworkBootstrapApi;
use shared_types::{ContractDescriptor, MspId, NetworkConfig, OperationConfig, OperationKind, Organization};
use tempfile::TempDir;

pub const ASSET: &str = "asset";

/// Write a one-file contract tree under `root/name` and describe it.
pub fn contract_source(root: &Path, name: &str, body: &str) -> ContractDescriptor {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{name}.go")), body).unwrap();
    ContractDescriptor::new(name, dir.to_string_lossy(), "1.0.0")
}

fn operation(name: &str, kind: OperationKind, arity: usize) -> OperationConfig {
    OperationConfig {
        contract: ASSET.to_string(),
        operation: name.to_string(),
        kind,
        arity,
        timeout_ms: None,
    }
}

/// `create(id, field)`, `Transfer(id, from, to)`, `getById(id)` and
/// `GetAllAssets()` on the asset contract.
pub fn asset_operations() -> Vec<OperationConfig> {
    vec![
        operation("create", OperationKind::Mutating, 2),
        operation("Transfer", OperationKind::Mutating, 3),
        operation("getById", OperationKind::ReadOnly, 1),
        operation("GetAllAssets", OperationKind::ReadOnly, 0),
    ]
}

/// Registry of `orgs` organizations, two peers each.
pub fn network(orgs: u32) -> NetworkConfig {
    let mut network = NetworkConfig::default();
    network.organizations = (1..=orgs)
        .map(|n| Organization {
            name: format!("Org{n}"),
            msp_id: MspId(format!("Org{n}MSP")),
            admin_identity: "Admin".into(),
            ordinary_identity: "User1".into(),
            peer_count: 2,
            anchor_peer_config_ref: format!("fixtures/channel-artifacts/Org{n}MSPanchors.tx"),
        })
        .collect();
    network
}

/// Node configuration deploying the asset contract from `sources`.
pub fn node_config(orgs: u32, sources: &TempDir) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.deployment.network = network(orgs);
    config.deployment.contracts = vec![contract_source(sources.path(), ASSET, "package asset")];
    config.deployment.operations = asset_operations();
    config.set_retry_attempts(1);
    config.events.source_retry_delay = Duration::from_millis(10);
    config
}

/// Every subsystem wired over one simulated ledger.
pub struct TestNetwork {
    pub ledger: LedgerSim,
    pub container: NodeContainer,
    pub sources: TempDir,
}

impl TestNetwork {
    pub fn new(orgs: u32) -> Self {
        Self::with_sim(orgs, SimConfig::default())
    }

    pub fn with_sim(orgs: u32, sim: SimConfig) -> Self {
        let sources = TempDir::new().unwrap();
        let config = node_config(orgs, &sources);
        let ledger = LedgerSim::new(sim);
        let container = NodeContainer::with_ledger(config, ledger.clone()).unwrap();
        Self {
            ledger,
            container,
            sources,
        }
    }

    /// Network with the channel created and every peer joined.
    pub async fn bootstrapped(orgs: u32) -> Self {
        let net = Self::new(orgs);
        net.bootstrap().await;
        net
    }

    pub async fn bootstrap(&self) {
        self.container
            .bootstrap
            .ensure_channel(&self.container.network)
            .await
            .unwrap();
    }

    pub fn asset(&self) -> &ContractDescriptor {
        &self.container.config.deployment.contracts[0]
    }

    /// Another source tree for the asset contract, yielding a different package.
    pub fn asset_variant(&self, body: &str) -> ContractDescriptor {
        let root = self.sources.path().join("variant");
        fs::create_dir_all(&root).unwrap();
        contract_source(&root, ASSET, body)
    }

    pub fn msp_ids(&self) -> Vec<MspId> {
        self.container.network.msp_ids()
    }

    pub fn gateway(&self) -> GatewayRuntime {
        GatewayRuntime::new(self.container.gateway.clone())
    }

    /// Peers of the organization at `index` in registry order.
    pub fn peers_of(&self, index: usize) -> Vec<String> {
        self.container.network.organizations[index].peer_names()
    }
}

/// Poll `check` until it holds or `within` elapses.
pub async fn eventually<F, Fut>(within: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + within;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
