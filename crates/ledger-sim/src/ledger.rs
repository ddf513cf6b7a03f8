//! # Simulated Ledger
//!
//! One channel, its peers and the ordering service, behind a single lock.
//! The lock is never held across an `.await`.
//!
//! Mutating contract calls are endorsed against current state, ordered
//! (the caller gets the tx id back here), then committed. With a commit
//! delay configured the commit runs on a background task, so a query issued
//! right after `submit` returns may not see the write yet.

use parking_lot::Mutex;
use serde_json::json;
use sha2::{Digest, Sha256};
use shared_types::{BlockNumber, LedgerError, MspId, PackageId, TransactionId};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::types::{Approval, Block, ChaincodeEvent, ChannelStats, Definition, Validation};
use crate::world_state::{WorldState, Write};

/// Simulator knobs.
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    /// Delay between ordering and commit. `None` commits inline.
    pub commit_delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct ChannelState {
    id: String,
    members: BTreeSet<MspId>,
    anchors: HashSet<MspId>,
    approvals: HashMap<(MspId, String, u64), Approval>,
    committed: HashMap<String, Definition>,
    world: WorldState,
    blocks: Vec<Block>,
    tx_index: HashMap<TransactionId, BlockNumber>,
}

#[derive(Debug, Default)]
struct State {
    channel: Option<ChannelState>,
    /// peer -> joined channels
    joined: HashMap<String, BTreeSet<String>>,
    /// peer -> installed packages
    installed: HashMap<String, HashMap<PackageId, usize>>,
    unreachable: HashSet<String>,
}

struct Shared {
    state: Mutex<State>,
    height: watch::Sender<BlockNumber>,
    stream_faults: AtomicU32,
    config: SimConfig,
}

/// Cheap-to-clone handle to one simulated ledger.
#[derive(Clone)]
pub struct LedgerSim {
    shared: Arc<Shared>,
}

impl Default for LedgerSim {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl LedgerSim {
    pub fn new(config: SimConfig) -> Self {
        let (height, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                height,
                stream_faults: AtomicU32::new(0),
                config,
            }),
        }
    }

    // ---------------------------------------------------------------------
    // Fault injection
    // ---------------------------------------------------------------------

    pub fn set_peer_reachable(&self, peer: &str, reachable: bool) {
        let mut s = self.shared.state.lock();
        if reachable {
            s.unreachable.remove(peer);
        } else {
            s.unreachable.insert(peer.to_string());
        }
    }

    pub fn set_peers_reachable<I, P>(&self, peers: I, reachable: bool)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        for peer in peers {
            self.set_peer_reachable(peer.as_ref(), reachable);
        }
    }

    pub fn is_reachable(&self, peer: &str) -> bool {
        !self.shared.state.lock().unreachable.contains(peer)
    }

    /// Fail the next `n` block reads with a transport error.
    pub fn inject_stream_faults(&self, n: u32) {
        self.shared.stream_faults.store(n, Ordering::SeqCst);
    }

    // ---------------------------------------------------------------------
    // Channel membership
    // ---------------------------------------------------------------------

    pub fn channel_exists(&self, channel_id: &str) -> bool {
        self.shared
            .state
            .lock()
            .channel
            .as_ref()
            .is_some_and(|c| c.id == channel_id)
    }

    /// Create the channel and its genesis block.
    pub fn create_channel(&self, channel_id: &str, members: &[MspId]) -> Result<(), LedgerError> {
        let mut s = self.shared.state.lock();
        if s.channel.is_some() {
            return Err(LedgerError::Rejected {
                target: "orderer".into(),
                reason: "channel already exists".into(),
            });
        }
        let mut channel = ChannelState {
            id: channel_id.to_string(),
            members: members.iter().cloned().collect(),
            ..ChannelState::default()
        };
        channel.blocks.push(Block {
            number: 0,
            tx_ids: Vec::new(),
            validation: Vec::new(),
            events: Vec::new(),
        });
        s.channel = Some(channel);
        drop(s);
        self.shared.height.send_replace(1);
        debug!(channel = channel_id, "Genesis block written");
        Ok(())
    }

    pub fn joined_channels(&self, peer: &str) -> Result<Vec<String>, LedgerError> {
        let s = self.shared.state.lock();
        reachable(&s, peer)?;
        Ok(s.joined
            .get(peer)
            .map(|c| c.iter().cloned().collect())
            .unwrap_or_default())
    }

    pub fn join_channel(&self, peer: &str, channel_id: &str) -> Result<(), LedgerError> {
        let mut s = self.shared.state.lock();
        reachable(&s, peer)?;
        channel(&s, channel_id)?;
        s.joined
            .entry(peer.to_string())
            .or_default()
            .insert(channel_id.to_string());
        Ok(())
    }

    pub fn anchor_peers_configured(&self, msp_id: &MspId, channel_id: &str) -> Result<bool, LedgerError> {
        let s = self.shared.state.lock();
        Ok(channel(&s, channel_id)?.anchors.contains(msp_id))
    }

    /// Anchor updates are config transactions and get their own block.
    pub fn update_anchor_peers(&self, msp_id: &MspId, channel_id: &str) -> Result<TransactionId, LedgerError> {
        let mut s = self.shared.state.lock();
        let ch = channel_mut(&mut s, channel_id)?;
        if !ch.members.contains(msp_id) {
            return Err(LedgerError::Rejected {
                target: "orderer".into(),
                reason: format!("{msp_id} is not a channel member"),
            });
        }
        ch.anchors.insert(msp_id.clone());
        let tx_id = transaction_id(&[msp_id.as_str(), "anchors"]);
        let height = push_block(ch, vec![(tx_id.clone(), Validation::Valid)], Vec::new());
        drop(s);
        self.shared.height.send_replace(height);
        Ok(tx_id)
    }

    pub fn members(&self, channel_id: &str) -> Result<Vec<MspId>, LedgerError> {
        let s = self.shared.state.lock();
        Ok(channel(&s, channel_id)?.members.iter().cloned().collect())
    }

    // ---------------------------------------------------------------------
    // Contract lifecycle
    // ---------------------------------------------------------------------

    pub fn is_installed(&self, peer: &str, package_id: &PackageId) -> Result<bool, LedgerError> {
        let s = self.shared.state.lock();
        reachable(&s, peer)?;
        Ok(s.installed
            .get(peer)
            .is_some_and(|p| p.contains_key(package_id)))
    }

    pub fn install(&self, peer: &str, package_id: &PackageId, bytes: &[u8]) -> Result<(), LedgerError> {
        let mut s = self.shared.state.lock();
        reachable(&s, peer)?;
        if bytes.is_empty() {
            return Err(LedgerError::Rejected {
                target: peer.to_string(),
                reason: "empty package".into(),
            });
        }
        s.installed
            .entry(peer.to_string())
            .or_default()
            .insert(package_id.clone(), bytes.len());
        debug!(peer, package_id = %package_id, "Package installed");
        Ok(())
    }

    pub fn approval(
        &self,
        msp_id: &MspId,
        channel_id: &str,
        name: &str,
        sequence: u64,
    ) -> Result<Option<Approval>, LedgerError> {
        let s = self.shared.state.lock();
        Ok(channel(&s, channel_id)?
            .approvals
            .get(&(msp_id.clone(), name.to_string(), sequence))
            .cloned())
    }

    /// Record an approval. A different package at the same sequence is
    /// rejected, same as the real lifecycle.
    pub fn approve(&self, msp_id: &MspId, channel_id: &str, approval: Approval) -> Result<(), LedgerError> {
        let mut s = self.shared.state.lock();
        let ch = channel_mut(&mut s, channel_id)?;
        let key = (msp_id.clone(), approval.name.clone(), approval.sequence);
        if let Some(existing) = ch.approvals.get(&key) {
            if existing.package_id != approval.package_id {
                return Err(LedgerError::Rejected {
                    target: msp_id.to_string(),
                    reason: format!("already approved {} at sequence {}", existing.package_id, approval.sequence),
                });
            }
            return Ok(());
        }
        let expected = ch.committed.get(&approval.name).map_or(1, |d| d.sequence + 1);
        if approval.sequence != expected {
            return Err(LedgerError::Rejected {
                target: msp_id.to_string(),
                reason: format!("requested sequence {}, expected {expected}", approval.sequence),
            });
        }
        ch.approvals.insert(key, approval);
        Ok(())
    }

    pub fn committed(&self, channel_id: &str, name: &str) -> Result<Option<Definition>, LedgerError> {
        let s = self.shared.state.lock();
        Ok(channel(&s, channel_id)?.committed.get(name).cloned())
    }

    /// Commit a definition approved by every organization in `approvers`.
    pub fn commit(
        &self,
        channel_id: &str,
        approval: &Approval,
        approvers: &[MspId],
        endorsing_peers: &[String],
    ) -> Result<TransactionId, LedgerError> {
        let mut s = self.shared.state.lock();
        endorsed(&s, endorsing_peers)?;
        let ch = channel_mut(&mut s, channel_id)?;

        if let Some(current) = ch.committed.get(&approval.name) {
            if current.sequence >= approval.sequence {
                return Err(LedgerError::AlreadyCommitted {
                    contract: approval.name.clone(),
                    sequence: current.sequence,
                });
            }
        }
        let missing: Vec<String> = approvers
            .iter()
            .filter(|m| {
                ch.approvals
                    .get(&((*m).clone(), approval.name.clone(), approval.sequence))
                    .map_or(true, |a| a.package_id != approval.package_id)
            })
            .map(|m| m.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LedgerError::Rejected {
                target: "orderer".into(),
                reason: format!("missing approvals from {}", missing.join(", ")),
            });
        }

        ch.committed.insert(
            approval.name.clone(),
            Definition {
                name: approval.name.clone(),
                version: approval.version.clone(),
                sequence: approval.sequence,
                package_id: approval.package_id.clone(),
                init_required: approval.init_required,
                initialized: false,
            },
        );
        let tx_id = transaction_id(&[&approval.name, &approval.sequence.to_string(), "commit"]);
        let height = push_block(ch, vec![(tx_id.clone(), Validation::Valid)], Vec::new());
        drop(s);
        self.shared.height.send_replace(height);
        Ok(tx_id)
    }

    pub fn init(
        &self,
        channel_id: &str,
        name: &str,
        function: &str,
        args: &[String],
        endorsing_peers: &[String],
    ) -> Result<TransactionId, LedgerError> {
        let mut s = self.shared.state.lock();
        endorsed(&s, endorsing_peers)?;
        let ch = channel_mut(&mut s, channel_id)?;
        let Some(definition) = ch.committed.get_mut(name) else {
            return Err(LedgerError::NotFound(format!("contract {name}")));
        };
        if definition.initialized {
            return Err(LedgerError::AlreadyInitialized {
                contract: name.to_string(),
            });
        }
        definition.initialized = true;

        let tx_id = transaction_id(&[name, function, "init"]);
        // The init event carries the arguments the entrypoint ran with.
        let event = ChaincodeEvent {
            contract: name.to_string(),
            event_name: function.to_string(),
            tx_id: tx_id.clone(),
            payload: json!({ "args": args }).to_string().into_bytes(),
        };
        let height = push_block(ch, vec![(tx_id.clone(), Validation::Valid)], vec![event]);
        drop(s);
        self.shared.height.send_replace(height);
        Ok(tx_id)
    }

    // ---------------------------------------------------------------------
    // Contract invocation
    // ---------------------------------------------------------------------

    /// Endorse and order. The write lands when the block commits.
    pub fn submit(
        &self,
        channel_id: &str,
        contract: &str,
        function: &str,
        args: &[String],
        endorsing_peers: &[String],
    ) -> Result<TransactionId, LedgerError> {
        let write = {
            let s = self.shared.state.lock();
            endorsed(&s, endorsing_peers)?;
            let ch = channel(&s, channel_id)?;
            deployed(ch, contract)?;
            ch.world.simulate(contract, function, args)?
        };

        let mut seed: Vec<&str> = vec![contract, function];
        seed.extend(args.iter().map(String::as_str));
        let tx_id = transaction_id(&seed);

        match self.shared.config.commit_delay {
            Some(delay) => {
                let sim = self.clone();
                let channel_id = channel_id.to_string();
                let (contract, function, args) = (contract.to_string(), function.to_string(), args.to_vec());
                let tx = tx_id.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    sim.commit_transaction(&channel_id, &contract, &function, &args, tx, write);
                });
            }
            None => self.commit_transaction(channel_id, contract, function, args, tx_id.clone(), write),
        }
        Ok(tx_id)
    }

    fn commit_transaction(
        &self,
        channel_id: &str,
        contract: &str,
        function: &str,
        args: &[String],
        tx_id: TransactionId,
        endorsed_write: Write,
    ) {
        let mut s = self.shared.state.lock();
        let Ok(ch) = channel_mut(&mut s, channel_id) else {
            return;
        };
        // Re-validate against state at commit time: a concurrent write to
        // the same key since endorsement invalidates this one.
        let valid = ch
            .world
            .simulate(contract, function, args)
            .is_ok_and(|w| w == endorsed_write);

        let (validation, events) = if valid {
            let event = ChaincodeEvent {
                contract: contract.to_string(),
                event_name: function.to_string(),
                tx_id: tx_id.clone(),
                payload: endorsed_write.payload(),
            };
            ch.world.apply(contract, endorsed_write);
            (Validation::Valid, vec![event])
        } else {
            (Validation::Conflict, Vec::new())
        };
        let height = push_block(ch, vec![(tx_id.clone(), validation)], events);
        drop(s);
        debug!(tx_id = %tx_id, ?validation, height, "Transaction committed");
        self.shared.height.send_replace(height);
    }

    /// Evaluate on one peer's committed state.
    pub fn evaluate(
        &self,
        peer: &str,
        channel_id: &str,
        contract: &str,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, LedgerError> {
        let s = self.shared.state.lock();
        reachable(&s, peer)?;
        let ch = channel(&s, channel_id)?;
        deployed(ch, contract)?;
        ch.world.read(contract, function, args)
    }

    // ---------------------------------------------------------------------
    // Blocks
    // ---------------------------------------------------------------------

    pub fn height(&self) -> BlockNumber {
        *self.shared.height.borrow()
    }

    pub fn block(&self, number: BlockNumber) -> Option<Block> {
        let s = self.shared.state.lock();
        s.channel
            .as_ref()
            .and_then(|c| c.blocks.get(number as usize).cloned())
    }

    pub fn block_for_transaction(&self, channel_id: &str, tx_id: &TransactionId) -> Result<Option<BlockNumber>, LedgerError> {
        let s = self.shared.state.lock();
        Ok(channel(&s, channel_id)?.tx_index.get(tx_id).copied())
    }

    pub fn channel_stats(&self, channel_id: &str) -> Result<ChannelStats, LedgerError> {
        let s = self.shared.state.lock();
        let ch = channel(&s, channel_id)?;
        Ok(ChannelStats {
            block_count: ch.blocks.len() as BlockNumber,
            transaction_count: ch.tx_index.len() as u64,
        })
    }

    /// Wait until block `number` is committed. Cancel-safe.
    pub async fn wait_for_block(&self, number: BlockNumber) -> Result<Block, LedgerError> {
        let faulted = self
            .shared
            .stream_faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if faulted {
            return Err(LedgerError::Transport("block stream interrupted".into()));
        }

        let mut height = self.shared.height.subscribe();
        loop {
            if let Some(block) = self.block(number) {
                return Ok(block);
            }
            if height.changed().await.is_err() {
                return Err(LedgerError::Transport("ledger closed".into()));
            }
        }
    }
}

fn reachable(s: &State, peer: &str) -> Result<(), LedgerError> {
    if s.unreachable.contains(peer) {
        return Err(LedgerError::Unreachable {
            target: peer.to_string(),
        });
    }
    Ok(())
}

fn endorsed(s: &State, peers: &[String]) -> Result<(), LedgerError> {
    if peers.is_empty() {
        return Err(LedgerError::EndorsementFailed("no endorsing peers".into()));
    }
    let down: Vec<&str> = peers
        .iter()
        .filter(|p| s.unreachable.contains(p.as_str()))
        .map(String::as_str)
        .collect();
    if !down.is_empty() {
        return Err(LedgerError::EndorsementFailed(format!(
            "no response from {}",
            down.join(", ")
        )));
    }
    Ok(())
}

fn channel<'a>(s: &'a State, channel_id: &str) -> Result<&'a ChannelState, LedgerError> {
    s.channel
        .as_ref()
        .filter(|c| c.id == channel_id)
        .ok_or_else(|| LedgerError::NotFound(format!("channel {channel_id}")))
}

fn channel_mut<'a>(s: &'a mut State, channel_id: &str) -> Result<&'a mut ChannelState, LedgerError> {
    s.channel
        .as_mut()
        .filter(|c| c.id == channel_id)
        .ok_or_else(|| LedgerError::NotFound(format!("channel {channel_id}")))
}

fn deployed(ch: &ChannelState, contract: &str) -> Result<(), LedgerError> {
    if ch.committed.contains_key(contract) {
        Ok(())
    } else {
        Err(LedgerError::NotFound(format!("contract {contract}")))
    }
}

/// Append a block; returns the new height.
fn push_block(
    ch: &mut ChannelState,
    txs: Vec<(TransactionId, Validation)>,
    events: Vec<ChaincodeEvent>,
) -> BlockNumber {
    let number = ch.blocks.len() as BlockNumber;
    for (tx_id, _) in &txs {
        ch.tx_index.insert(tx_id.clone(), number);
    }
    let (tx_ids, validation) = txs.into_iter().unzip();
    ch.blocks.push(Block {
        number,
        tx_ids,
        validation,
        events,
    });
    number + 1
}

/// `sha256(nonce || parts...)` in hex. The nonce keeps ids unique across
/// identical calls.
fn transaction_id(parts: &[&str]) -> TransactionId {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().as_bytes());
    for part in parts {
        hasher.update(part.as_bytes());
    }
    TransactionId(hex::encode(hasher.finalize()))
}
