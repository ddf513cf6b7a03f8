//! # Ledger Events
//!
//! Notifications delivered to subscribers: block commits and events emitted
//! by contract transactions, plus the filters that select them.

use serde::{Deserialize, Serialize};
use shared_types::{BlockNumber, TransactionId};

/// A block reached commit on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEvent {
    pub number: BlockNumber,
    /// Transactions in block order.
    pub tx_ids: Vec<TransactionId>,
}

/// An event a contract emitted from a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub contract: String,
    pub event_name: String,
    pub tx_id: TransactionId,
    pub block_number: BlockNumber,
    pub payload: Vec<u8>,
}

/// Everything a subscription can deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Block(BlockEvent),
    Contract(ContractEvent),
}

/// What a consumer compares to drop duplicate deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventIdentity {
    Block(BlockNumber),
    Contract {
        tx_id: TransactionId,
        event_name: String,
    },
}

impl LedgerEvent {
    pub fn block_number(&self) -> BlockNumber {
        match self {
            LedgerEvent::Block(b) => b.number,
            LedgerEvent::Contract(c) => c.block_number,
        }
    }

    pub fn identity(&self) -> EventIdentity {
        match self {
            LedgerEvent::Block(b) => EventIdentity::Block(b.number),
            LedgerEvent::Contract(c) => EventIdentity::Contract {
                tx_id: c.tx_id.clone(),
                event_name: c.event_name.clone(),
            },
        }
    }

    pub fn kind(&self) -> SubscriptionKind {
        match self {
            LedgerEvent::Block(_) => SubscriptionKind::Block,
            LedgerEvent::Contract(_) => SubscriptionKind::ContractEvent,
        }
    }
}

/// The two notification streams a subscriber can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionKind {
    Block,
    ContractEvent,
}

/// Selects which events a subscription receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventFilter {
    /// Every committed block.
    Blocks,
    /// Events from one contract, optionally narrowed to one event name.
    Contract {
        contract: String,
        event_name: Option<String>,
    },
}

impl EventFilter {
    pub fn blocks() -> Self {
        EventFilter::Blocks
    }

    pub fn contract(contract: impl Into<String>) -> Self {
        EventFilter::Contract {
            contract: contract.into(),
            event_name: None,
        }
    }

    pub fn contract_event(contract: impl Into<String>, event_name: impl Into<String>) -> Self {
        EventFilter::Contract {
            contract: contract.into(),
            event_name: Some(event_name.into()),
        }
    }

    pub fn kind(&self) -> SubscriptionKind {
        match self {
            EventFilter::Blocks => SubscriptionKind::Block,
            EventFilter::Contract { .. } => SubscriptionKind::ContractEvent,
        }
    }

    pub fn matches(&self, event: &LedgerEvent) -> bool {
        match (self, event) {
            (EventFilter::Blocks, LedgerEvent::Block(_)) => true,
            (
                EventFilter::Contract {
                    contract,
                    event_name,
                },
                LedgerEvent::Contract(ev),
            ) => {
                ev.contract == *contract
                    && event_name.as_ref().map_or(true, |name| ev.event_name == *name)
            }
            _ => false,
        }
    }
}

/// Where a fresh subscription starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StartPosition {
    /// The next block to commit.
    #[default]
    Current,
    /// Replay from this block number onwards.
    From(BlockNumber),
}

/// A committed block as the event source hands it over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedBlock {
    pub number: BlockNumber,
    pub tx_ids: Vec<TransactionId>,
    /// Contract events in transaction commit order.
    pub contract_events: Vec<ContractEvent>,
}

impl CommittedBlock {
    /// Events from this block the filter selects, in delivery order.
    pub fn events_matching(&self, filter: &EventFilter) -> Vec<LedgerEvent> {
        match filter {
            EventFilter::Blocks => vec![LedgerEvent::Block(BlockEvent {
                number: self.number,
                tx_ids: self.tx_ids.clone(),
            })],
            EventFilter::Contract { .. } => self
                .contract_events
                .iter()
                .cloned()
                .map(LedgerEvent::Contract)
                .filter(|e| filter.matches(e))
                .collect(),
        }
    }
}
