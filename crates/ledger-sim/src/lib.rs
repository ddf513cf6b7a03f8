//! # Ledger Simulator
//!
//! An in-process stand-in for the permissioned ledger platform: one channel,
//! its peers, the contract lifecycle tables, a key/value world state per
//! contract and an append-only block list with a height watch.
//!
//! Used by the runtime's dev mode and by cross-crate tests. Faults are
//! injected per peer (`set_peer_reachable`) and on the block stream
//! (`inject_stream_faults`).

pub mod ledger;
pub mod types;
pub mod world_state;

pub use ledger::{LedgerSim, SimConfig};
pub use types::{Approval, Block, ChaincodeEvent, ChannelStats, Definition, Validation};
pub use world_state::{WorldState, Write};
