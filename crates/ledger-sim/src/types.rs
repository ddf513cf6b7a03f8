//! Records kept by the simulated ledger.

use serde::{Deserialize, Serialize};
use shared_types::{BlockNumber, PackageId, TransactionId};

/// One organization's approval of a contract definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub name: String,
    pub version: String,
    pub sequence: u64,
    pub package_id: PackageId,
    pub init_required: bool,
}

/// A contract definition committed on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub version: String,
    pub sequence: u64,
    pub package_id: PackageId,
    pub init_required: bool,
    pub initialized: bool,
}

/// Event emitted by a valid mutating transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeEvent {
    pub contract: String,
    pub event_name: String,
    pub tx_id: TransactionId,
    pub payload: Vec<u8>,
}

/// Transaction outcome recorded in the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validation {
    Valid,
    /// The write set no longer applied at commit time.
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub number: BlockNumber,
    pub tx_ids: Vec<TransactionId>,
    pub validation: Vec<Validation>,
    pub events: Vec<ChaincodeEvent>,
}

/// Channel-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub block_count: BlockNumber,
    /// Every ordered transaction, valid or not.
    pub transaction_count: u64,
}
