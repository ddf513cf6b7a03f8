//! Ports module for the Ledger Gateway
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::LedgerGatewayApi;
pub use outbound::ChannelClient;
