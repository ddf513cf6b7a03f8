//! # Event Handlers
//!
//! Background consumers of the event hub's subscriptions.

pub mod listeners;

pub use listeners::*;
