//! Block and contract-event listeners.
//!
//! Each listener owns one `Subscription` and logs what it receives. The
//! loop ends on shutdown or when the hub closes the stream; both paths go
//! through `unsubscribe()` before the task returns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::json;
use shared_bus::{DedupWindow, LedgerEvent, Subscription};
use tokio::sync::watch;
use tracing::{debug, info};

/// What a listener prints for each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Block,
    ContractEvent,
}

/// Logging consumer of one subscription.
pub struct EventListener {
    name: String,
    kind: ListenerKind,
    subscription: Subscription,
    dedup: DedupWindow,
    /// Distinct events handled, shared with the runtime.
    observed: Arc<AtomicU64>,
}

impl EventListener {
    pub fn new(name: impl Into<String>, kind: ListenerKind, subscription: Subscription, observed: Arc<AtomicU64>) -> Self {
        Self {
            name: name.into(),
            kind,
            subscription,
            dedup: DedupWindow::new(),
            observed,
        }
    }

    /// Run the listener loop until shutdown or end of stream.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(listener = %self.name, subscription = %self.subscription.id(), "Listener started");

        loop {
            tokio::select! {
                event = self.subscription.recv() => match event {
                    Some(event) => self.handle(&event),
                    None => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.subscription.unsubscribe().await;
        info!(listener = %self.name, "Listener stopped");
    }

    fn handle(&mut self, event: &LedgerEvent) {
        if !self.dedup.first_sighting(event) {
            debug!(listener = %self.name, identity = ?event.identity(), "Duplicate delivery dropped");
            return;
        }
        self.observed.fetch_add(1, Ordering::Relaxed);
        info!("EVENT_FLOW_JSON {}", describe(&self.name, self.kind, event));
    }
}

fn describe(listener: &str, kind: ListenerKind, event: &LedgerEvent) -> serde_json::Value {
    match event {
        LedgerEvent::Block(block) => json!({
            "listener": listener,
            "kind": format!("{kind:?}"),
            "block_number": block.number,
            "tx_count": block.tx_ids.len(),
            "tx_ids": block.tx_ids.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
        }),
        LedgerEvent::Contract(ev) => json!({
            "listener": listener,
            "kind": format!("{kind:?}"),
            "contract": ev.contract,
            "event_name": ev.event_name,
            "tx_id": ev.tx_id.as_str(),
            "block_number": ev.block_number,
            "payload": payload_json(&ev.payload),
        }),
    }
}

/// Payload as JSON when it parses, as a string otherwise.
pub(crate) fn payload_json(payload: &[u8]) -> serde_json::Value {
    serde_json::from_slice(payload)
        .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(payload).into_owned()))
}
