//! Domain layer for the Chaincode Lifecycle

pub mod errors;
pub mod invariants;
pub mod packaging;
pub mod value_objects;

pub use errors::LifecycleError;
pub use value_objects::*;
