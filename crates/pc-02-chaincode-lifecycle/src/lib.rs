//! # PC-02: Chaincode Lifecycle Subsystem
//!
//! Packages a contract, installs and approves it per organization, commits
//! the definition on the channel and runs its init entrypoint.
//!
//! ## Architecture
//!
//! - **Domain**: packaging, approval/readiness/sequence invariants, the
//!   derived `LifecycleState`
//! - **Ports**: Inbound (`ChaincodeLifecycleApi`) and Outbound (`LifecyclePeer`)
//! - **Service**: `LifecycleManager`
//!
//! ## Derived State
//!
//! Lifecycle position is never stored. `lifecycle_state` re-queries every
//! required organization and the committed definition, then folds them with
//! a pure function. Restarting the process loses nothing.
//!
//! ## Sequencing
//!
//! Approve, readiness and commit only accept `committed + 1`. A commit that
//! loses a race to another committer reports `AlreadyCommitted`.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::LifecycleConfig;
pub use domain::errors::LifecycleError;
pub use domain::packaging::{package, unpack, SourceArchive, SourceFile};
pub use domain::value_objects::*;
pub use ports::inbound::ChaincodeLifecycleApi;
pub use ports::outbound::LifecyclePeer;
pub use service::LifecycleManager;
