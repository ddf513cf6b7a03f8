//! # Duplicate Delivery Window
//!
//! Delivery is at-least-once, so a consumer may see the same block or
//! contract event twice. This window remembers the most recent identities
//! and reports whether a delivery is new.
//!
//! - Memory is bounded by `capacity`; the oldest identity is evicted first.
//! - Duplicates older than the window are not detected. Size the window to
//!   exceed the largest redelivery gap the consumer tolerates.

use std::collections::{HashSet, VecDeque};

use crate::events::{EventIdentity, LedgerEvent};

/// Bounded set of recently seen event identities.
#[derive(Debug)]
pub struct DedupWindow {
    seen: HashSet<EventIdentity>,
    order: VecDeque<EventIdentity>,
    capacity: usize,
}

impl DedupWindow {
    pub const DEFAULT_CAPACITY: usize = 4096;

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record the event; `true` the first time its identity is seen.
    pub fn first_sighting(&mut self, event: &LedgerEvent) -> bool {
        let identity = event.identity();
        if self.seen.contains(&identity) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(identity.clone());
        self.order.push_back(identity);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for DedupWindow {
    fn default() -> Self {
        Self::new()
    }
}
