//! # Permissioned-Chain Test Suite
//!
//! Unified test crate exercising the subsystems together over the simulated
//! ledger, wired exactly as the node runtime wires them.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs        # Networks, contract source trees, operation tables
//! └── integration/
//!     ├── scenarios.rs   # End-to-end scenarios A-D
//!     ├── properties.rs  # Lifecycle and gateway properties
//!     └── recovery.rs    # Faults, restarts and partial failures
//! benches/
//! └── gateway_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p pc-tests
//!
//! # By category
//! cargo test -p pc-tests integration::scenarios::
//! cargo test -p pc-tests integration::properties::
//!
//! # Benchmarks
//! cargo bench -p pc-tests
//! ```

#![allow(dead_code)]

#[cfg(test)]
pub mod fixtures;
pub mod integration;
