//! # Shared Bus - Ledger Event Subscriptions
//!
//! Delivers block-commit and contract-event notifications to subscribers.
//!
//! ```text
//!   Ledger (BlockSource)
//!          │  wait_for_block(n), n = start, start+1, ...
//!          ▼
//!   ┌──────────────┐  one task + one bounded channel per subscription
//!   │   EventHub   │ ──────────────┬──────────────┐
//!   └──────────────┘               ▼              ▼
//!                            Subscription    Subscription
//! ```
//!
//! ## Guarantees
//!
//! - **Ordered**: blocks in increasing height; contract events in commit order.
//! - **At-least-once**: a block is re-read after a transient source failure.
//!   Consumers drop duplicates by identity (see `DedupWindow`).
//! - **Backpressure**: a full subscriber channel blocks its deliverer; nothing
//!   is dropped.
//! - **Scoped release**: `unsubscribe()` or `Drop` stops the delivery task.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod dedup;
pub mod events;
pub mod hub;
pub mod source;
pub mod subscriber;

// Re-export main types
pub use dedup::DedupWindow;
pub use events::{
    BlockEvent, CommittedBlock, ContractEvent, EventFilter, EventIdentity, LedgerEvent,
    StartPosition, SubscriptionKind,
};
pub use hub::{EventHub, HubConfig};
pub use source::BlockSource;
pub use subscriber::{Subscription, SubscriptionError, SubscriptionId};

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
