//! # Shared Types Crate
//!
//! The organization registry, network configuration, contract descriptors
//! and the error vocabulary the ledger platform reports.
//!
//! ## Design Principles
//!
//! - **Read once, share by reference**: `NetworkConfig` is loaded at startup
//!   and handed to every subsystem explicitly. There is no global registry.
//! - **Pure data**: nothing here talks to a ledger.

pub mod config;
pub mod entities;
pub mod errors;
pub mod retry;

pub use config::{DeploymentConfig, OperationConfig};
pub use entities::*;
pub use errors::*;
pub use retry::{retry_transient, RetryPolicy};
