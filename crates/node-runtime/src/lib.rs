//! # Node Runtime Library
//!
//! This library exposes the internal modules of the node runtime for testing.
//! The main entry point is the `main.rs` binary.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration loading and subsystem wiring
//! - `adapters/` - Outbound port implementations over the ledger
//! - `handlers/` - Block and contract-event listeners
//! - `gateway` - The request-layer entry point
//! - `runtime` - Startup sequence and graceful shutdown
//!
//! ## Architectural Patterns
//!
//! - **DDD (Domain-Driven Design)**: Each subsystem owns its domain logic
//! - **Hexagonal Architecture**: Ports define contracts, Adapters implement them

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod container;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod runtime;

pub use container::{load_config, load_config_from, NodeConfig, NodeContainer};
pub use errors::RuntimeError;
pub use gateway::{reply_json, GatewayRuntime};
pub use runtime::{NodeRuntime, StartupReport};
