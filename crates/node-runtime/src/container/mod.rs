//! # Subsystem Container
//!
//! Configuration and the container that owns every subsystem service.
//!
//! - Subsystems initialized in dependency order (ledger first)
//! - Adapters implement each subsystem's outbound port

pub mod config;
pub mod subsystems;

pub use config::{load_config, load_config_from, NodeConfig};
pub use subsystems::NodeContainer;
