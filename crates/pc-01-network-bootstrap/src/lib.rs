//! # PC-01: Network Bootstrap Subsystem
//!
//! Creates the shared channel and brings every registry organization into it.
//!
//! ## Architecture
//!
//! - **Domain**: `ChannelHandle`, per-organization `OrgOutcome`, `SetupError`
//! - **Ports**: Inbound (`NetworkBootstrapApi`) and Outbound (`ChannelAdmin`)
//! - **Service**: `NetworkBootstrapService`, idempotent step orchestration
//!
//! ## Partial Failure
//!
//! Organizations are independent. A failed join for one organization never
//! rolls back the others; the error lists per-organization outcomes so the
//! caller can retry only the failed subset with `ensure_channel_for`.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::BootstrapConfig;
pub use domain::entities::*;
pub use domain::errors::SetupError;
pub use ports::inbound::NetworkBootstrapApi;
pub use ports::outbound::ChannelAdmin;
pub use service::NetworkBootstrapService;
