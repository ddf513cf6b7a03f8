//! Ports module for the Chaincode Lifecycle
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::ChaincodeLifecycleApi;
pub use outbound::LifecyclePeer;
