//! Ports module for Network Bootstrap
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::NetworkBootstrapApi;
pub use outbound::ChannelAdmin;
