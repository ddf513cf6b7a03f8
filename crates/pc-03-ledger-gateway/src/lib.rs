//! # PC-03: Ledger Gateway Subsystem
//!
//! Generic invoke/query over deployed contracts, driven by an operation
//! registry instead of one hand-written function per asset type.
//!
//! ## Architecture
//!
//! - **Domain**: `OperationSpec`, `OperationRegistry`, kind/arity invariants
//! - **Ports**: Inbound (`LedgerGatewayApi`) and Outbound (`ChannelClient`)
//! - **Service**: `LedgerGateway`
//!
//! ## Guarantees
//!
//! - Mutating calls return once ordered and are never retried here.
//! - Read-only calls may see state older than a tx id the caller holds.
//! - A timed-out mutating call may still commit; reconcile with
//!   `lookup_transaction`.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::GatewayConfig;
pub use domain::entities::*;
pub use domain::errors::GatewayError;
pub use domain::registry::OperationRegistry;
pub use ports::inbound::LedgerGatewayApi;
pub use ports::outbound::ChannelClient;
pub use service::LedgerGateway;
