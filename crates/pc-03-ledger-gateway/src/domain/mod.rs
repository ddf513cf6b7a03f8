//! Domain layer for the Ledger Gateway

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod registry;

pub use entities::*;
pub use errors::GatewayError;
pub use registry::OperationRegistry;
