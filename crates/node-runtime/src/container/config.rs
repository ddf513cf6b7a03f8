//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! ## Sources
//!
//! - `PC_NETWORK_CONFIG`: TOML file with the registry, contracts and
//!   operation table. Absent means the built-in two-organization network.
//! - `PC_*` overrides for runtime knobs (see `load_config_from`).
//!
//! Every value is validated here; a bad value is fatal at startup.

use std::time::Duration;

use ledger_sim::SimConfig;
use pc_01_network_bootstrap::BootstrapConfig;
use pc_02_chaincode_lifecycle::LifecycleConfig;
use pc_03_ledger_gateway::GatewayConfig;
use shared_bus::HubConfig;
use shared_types::{ConfigError, DeploymentConfig, MspId};
use tracing::info;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Registry, contracts and operation table.
    pub deployment: DeploymentConfig,
    pub bootstrap: BootstrapConfig,
    pub lifecycle: LifecycleConfig,
    pub gateway: GatewayConfig,
    pub events: HubConfig,
    /// Dev-mode ledger knobs.
    pub sim: SimConfig,
    /// Organization whose ordinary identity the gateway uses.
    /// `None` means the first registry organization.
    pub gateway_org: Option<MspId>,
}

impl NodeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.deployment.validate()?;
        if let Some(org) = &self.gateway_org {
            if self.deployment.network.organization(org).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "gateway organization {org} is not in the registry"
                )));
            }
        }
        if self.events.channel_capacity == 0 {
            return Err(ConfigError::Invalid("event channel capacity must be at least 1".into()));
        }
        if self.gateway.default_timeout.is_zero() {
            return Err(ConfigError::Invalid("default gateway timeout must be positive".into()));
        }
        Ok(())
    }

    /// Gateway organization after defaulting.
    pub fn gateway_msp_id(&self) -> Result<MspId, ConfigError> {
        match &self.gateway_org {
            Some(org) => Ok(org.clone()),
            None => self
                .deployment
                .network
                .organizations
                .first()
                .map(|o| o.msp_id.clone())
                .ok_or_else(|| ConfigError::Missing("organizations".into())),
        }
    }

    /// Apply one attempt budget to every retried step.
    pub fn set_retry_attempts(&mut self, attempts: u32) {
        self.bootstrap.retry.max_attempts = attempts;
        self.lifecycle.retry.max_attempts = attempts;
        self.gateway.query_retry.max_attempts = attempts;
        self.events.height_retry.max_attempts = attempts;
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<NodeConfig, ConfigError> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Load configuration with `env` as the variable lookup.
///
/// | variable                    | effect                                   |
/// |-----------------------------|------------------------------------------|
/// | `PC_NETWORK_CONFIG`         | TOML deployment file                     |
/// | `PC_GATEWAY_ORG`            | gateway organization MSP id              |
/// | `PC_DEFAULT_TIMEOUT_MS`     | gateway deadline when none is registered |
/// | `PC_RETRY_ATTEMPTS`         | attempts for every retried step          |
/// | `PC_EVENT_CHANNEL_CAPACITY` | buffered events per subscriber           |
/// | `PC_INIT_FUNCTION`          | init entrypoint name                     |
/// | `PC_COMMIT_DELAY_MS`        | dev ledger ordering-to-commit delay      |
pub fn load_config_from<F>(env: F) -> Result<NodeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = NodeConfig::default();

    if let Some(path) = env("PC_NETWORK_CONFIG") {
        config.deployment = DeploymentConfig::load(&path)?;
        info!(path = %path, "Loaded network configuration");
    } else {
        info!("PC_NETWORK_CONFIG not set, using built-in network");
    }

    if let Some(org) = env("PC_GATEWAY_ORG") {
        config.gateway_org = Some(MspId::new(org));
    }
    if let Some(ms) = parsed::<u64, _>(&env, "PC_DEFAULT_TIMEOUT_MS")? {
        config.gateway.default_timeout = Duration::from_millis(ms);
    }
    if let Some(attempts) = parsed::<u32, _>(&env, "PC_RETRY_ATTEMPTS")? {
        config.set_retry_attempts(attempts);
    }
    if let Some(capacity) = parsed::<usize, _>(&env, "PC_EVENT_CHANNEL_CAPACITY")? {
        config.events.channel_capacity = capacity;
    }
    if let Some(function) = env("PC_INIT_FUNCTION") {
        config.lifecycle.init_function = function;
    }
    if let Some(ms) = parsed::<u64, _>(&env, "PC_COMMIT_DELAY_MS")? {
        config.sim.commit_delay = (ms > 0).then(|| Duration::from_millis(ms));
    }

    config.validate()?;
    Ok(config)
}

fn parsed<T, F>(env: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("{key}={raw}: {e}")))
        })
        .transpose()
}
