//! # Block Source Adapter
//!
//! Implements shared-bus's `BlockSource` port. Only transactions that
//! validated contribute contract events; an invalidated transaction's block
//! is still delivered to block listeners.

use async_trait::async_trait;
use ledger_sim::{Block, LedgerSim, Validation};
use shared_bus::{BlockSource, CommittedBlock, ContractEvent};
use shared_types::{BlockNumber, LedgerError, TransactionId};
use std::collections::HashSet;

pub struct SimBlockSource {
    ledger: LedgerSim,
}

impl SimBlockSource {
    pub fn new(ledger: LedgerSim) -> Self {
        Self { ledger }
    }
}

fn committed_block(block: Block) -> CommittedBlock {
    let valid: HashSet<&TransactionId> = block
        .tx_ids
        .iter()
        .zip(&block.validation)
        .filter(|(_, v)| **v == Validation::Valid)
        .map(|(tx, _)| tx)
        .collect();
    let contract_events = block
        .events
        .iter()
        .filter(|e| valid.contains(&e.tx_id))
        .map(|e| ContractEvent {
            contract: e.contract.clone(),
            event_name: e.event_name.clone(),
            tx_id: e.tx_id.clone(),
            block_number: block.number,
            payload: e.payload.clone(),
        })
        .collect();
    CommittedBlock {
        number: block.number,
        tx_ids: block.tx_ids,
        contract_events,
    }
}

#[async_trait]
impl BlockSource for SimBlockSource {
    async fn height(&self) -> Result<BlockNumber, LedgerError> {
        Ok(self.ledger.height())
    }

    async fn wait_for_block(&self, number: BlockNumber) -> Result<CommittedBlock, LedgerError> {
        self.ledger.wait_for_block(number).await.map(committed_block)
    }
}
