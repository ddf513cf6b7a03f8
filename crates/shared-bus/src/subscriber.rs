//! # Subscription Handle
//!
//! The consumer side of the hub. A `Subscription` owns the receiving end of
//! a bounded channel fed by one background delivery task.
//!
//! Release is a pair with `EventHub::subscribe`: call `unsubscribe()` on the
//! normal path; `Drop` performs the same release on every other path, so an
//! early return or a panic unwinding through the owner never leaks the
//! delivery task.

use dashmap::DashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tracing::debug;
use uuid::Uuid;

use shared_types::LedgerError;

use crate::events::{EventFilter, LedgerEvent};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The hub was shut down.
    #[error("Event hub closed")]
    Closed,

    /// The starting height could not be read from the ledger.
    #[error("Event source unavailable: {0}")]
    Source(#[from] LedgerError),
}

/// Identifier of one registration.
pub type SubscriptionId = Uuid;

/// Registry entry the hub keeps for each live subscription.
pub(crate) struct Registration {
    pub(crate) filter: EventFilter,
    pub(crate) stop: Arc<watch::Sender<bool>>,
}

pub(crate) type Registry = Arc<DashMap<SubscriptionId, Registration>>;

/// A live subscription. Receives events in commit order.
pub struct Subscription {
    id: SubscriptionId,
    filter: EventFilter,
    receiver: mpsc::Receiver<LedgerEvent>,
    stop: Arc<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
    registry: Registry,
    released: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        filter: EventFilter,
        receiver: mpsc::Receiver<LedgerEvent>,
        stop: Arc<watch::Sender<bool>>,
        task: JoinHandle<()>,
        registry: Registry,
    ) -> Self {
        Self {
            id,
            filter,
            receiver,
            stop,
            task: Some(task),
            registry,
            released: false,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Receive the next event.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - The next matching event
    /// - `None` - The subscription was released or the hub shut down
    pub async fn recv(&mut self) -> Option<LedgerEvent> {
        if self.released {
            return None;
        }
        self.receiver.recv().await
    }

    /// Non-blocking receive. `None` when nothing is buffered.
    pub fn try_recv(&mut self) -> Option<LedgerEvent> {
        if self.released {
            return None;
        }
        self.receiver.try_recv().ok()
    }

    pub fn is_active(&self) -> bool {
        !self.released
    }

    /// Stop delivery and release the registration.
    ///
    /// Waits for the delivery task to exit, then discards anything still
    /// buffered: once this returns, no event reaches this handle.
    pub async fn unsubscribe(&mut self) {
        if self.released {
            return;
        }
        self.stop.send_replace(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(subscription = %self.id, error = %e, "Delivery task ended abnormally");
            }
        }
        self.close();
        debug!(subscription = %self.id, "Subscription released");
    }

    fn close(&mut self) {
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
        self.registry.remove(&self.id);
        self.released = true;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.stop.send_replace(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.close();
        debug!(subscription = %self.id, "Subscription dropped without unsubscribe");
    }
}

impl Stream for Subscription {
    type Item = LedgerEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.released {
            return Poll::Ready(None);
        }
        this.receiver.poll_recv(cx)
    }
}
