//! # Event Hub
//!
//! Turns the ledger's committed block stream into per-subscriber deliveries.
//!
//! Each subscription gets its own background task and its own bounded
//! channel. The task walks block numbers from its start position, extracts
//! the events its filter selects and `send().await`s them: a full channel
//! blocks the task instead of dropping events, so ordering holds and a slow
//! consumer only slows itself.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_types::{retry_transient, BlockNumber, RetryPolicy};

use crate::events::{EventFilter, LedgerEvent, StartPosition};
use crate::source::BlockSource;
use crate::subscriber::{Registration, Registry, Subscription, SubscriptionError};
use crate::DEFAULT_CHANNEL_CAPACITY;

/// Tuning for the hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Buffered events per subscriber before the deliverer blocks.
    pub channel_capacity: usize,
    /// Pause before re-reading a block after a transient source failure.
    pub source_retry_delay: Duration,
    /// Retry policy for reading the current height on subscribe.
    pub height_retry: RetryPolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            source_retry_delay: Duration::from_millis(200),
            height_retry: RetryPolicy::default(),
        }
    }
}

/// Subscription manager over one block source.
pub struct EventHub {
    source: Arc<dyn BlockSource>,
    registry: Registry,
    config: HubConfig,
    delivered: Arc<AtomicU64>,
    closed: watch::Sender<bool>,
}

impl EventHub {
    pub fn new(source: Arc<dyn BlockSource>) -> Self {
        Self::with_config(source, HubConfig::default())
    }

    pub fn with_config(source: Arc<dyn BlockSource>, config: HubConfig) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            source,
            registry: Arc::new(DashMap::new()),
            config,
            delivered: Arc::new(AtomicU64::new(0)),
            closed,
        }
    }

    /// Register a subscription and start its delivery task.
    ///
    /// `StartPosition::Current` begins at the next block to commit;
    /// `StartPosition::From(n)` replays from block `n`.
    pub async fn subscribe(
        &self,
        filter: EventFilter,
        start: StartPosition,
    ) -> Result<Subscription, SubscriptionError> {
        if *self.closed.borrow() {
            return Err(SubscriptionError::Closed);
        }

        let cursor = match start {
            StartPosition::From(n) => n,
            StartPosition::Current => {
                let source = Arc::clone(&self.source);
                retry_transient(&self.config.height_retry, "event_source_height", || {
                    let source = Arc::clone(&source);
                    async move { source.height().await }
                })
                .await?
            }
        };

        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let (stop_tx, stop_rx) = watch::channel(false);
        let stop = Arc::new(stop_tx);

        let delivery = Delivery {
            id,
            source: Arc::clone(&self.source),
            filter: filter.clone(),
            cursor,
            sender: tx,
            stop: stop_rx,
            closed: self.closed.subscribe(),
            retry_delay: self.config.source_retry_delay,
            delivered: Arc::clone(&self.delivered),
        };
        let task = tokio::spawn(delivery.run());

        self.registry.insert(
            id,
            Registration {
                filter: filter.clone(),
                stop: Arc::clone(&stop),
            },
        );

        info!(subscription = %id, kind = ?filter.kind(), start_block = cursor, "Subscription registered");

        Ok(Subscription::new(
            id,
            filter,
            rx,
            stop,
            task,
            Arc::clone(&self.registry),
        ))
    }

    /// Release a subscription. Equivalent to `subscription.unsubscribe()`.
    pub async fn unsubscribe(&self, mut subscription: Subscription) {
        subscription.unsubscribe().await;
    }

    /// Number of registrations not yet released.
    pub fn active_subscriptions(&self) -> usize {
        self.registry.len()
    }

    /// Filters of the live registrations.
    pub fn active_filters(&self) -> Vec<EventFilter> {
        self.registry.iter().map(|r| r.filter.clone()).collect()
    }

    /// Total events handed to subscriber channels.
    pub fn events_delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Stop every delivery task. Handles still need to be dropped or
    /// unsubscribed to release their registration.
    pub fn shutdown(&self) {
        self.closed.send_replace(true);
        for entry in self.registry.iter() {
            entry.stop.send_replace(true);
        }
        info!(active = self.registry.len(), "Event hub shut down");
    }
}

impl Drop for EventHub {
    fn drop(&mut self) {
        self.closed.send_replace(true);
    }
}

/// State of one background delivery task.
struct Delivery {
    id: Uuid,
    source: Arc<dyn BlockSource>,
    filter: EventFilter,
    cursor: BlockNumber,
    sender: mpsc::Sender<LedgerEvent>,
    stop: watch::Receiver<bool>,
    closed: watch::Receiver<bool>,
    retry_delay: Duration,
    delivered: Arc<AtomicU64>,
}

impl Delivery {
    async fn run(mut self) {
        loop {
            if *self.stop.borrow() || *self.closed.borrow() {
                break;
            }

            let fetched = tokio::select! {
                biased;
                _ = self.stop.changed() => break,
                _ = self.closed.changed() => break,
                block = self.source.wait_for_block(self.cursor) => block,
            };

            let block = match fetched {
                Ok(block) => block,
                Err(e) if e.is_transient() => {
                    warn!(subscription = %self.id, block = self.cursor, error = %e, "Event source failed, re-reading block");
                    tokio::select! {
                        biased;
                        _ = self.stop.changed() => break,
                        _ = self.closed.changed() => break,
                        _ = tokio::time::sleep(self.retry_delay) => continue,
                    }
                }
                Err(e) => {
                    error!(subscription = %self.id, block = self.cursor, error = %e, "Event source failed permanently");
                    break;
                }
            };

            for event in block.events_matching(&self.filter) {
                let sent = tokio::select! {
                    biased;
                    _ = self.stop.changed() => return,
                    _ = self.closed.changed() => return,
                    sent = self.sender.send(event) => sent,
                };
                if sent.is_err() {
                    debug!(subscription = %self.id, "Receiver gone, delivery stopped");
                    return;
                }
                self.delivered.fetch_add(1, Ordering::Relaxed);
            }
            self.cursor += 1;
        }
        debug!(subscription = %self.id, next_block = self.cursor, "Delivery task exiting");
    }
}
