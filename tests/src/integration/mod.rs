//! # Integration Tests
//!
//! Cross-subsystem flows over the simulated ledger.

pub mod properties;
pub mod recovery;
pub mod scenarios;
