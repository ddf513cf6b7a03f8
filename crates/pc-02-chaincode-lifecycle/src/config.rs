//! Configuration for the Chaincode Lifecycle

use serde::{Deserialize, Serialize};
use shared_types::RetryPolicy;

/// Lifecycle configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Retry policy for install, approve and lifecycle queries
    pub retry: RetryPolicy,
    /// Contract function invoked by `init_if_declared`
    pub init_function: String,
    /// Arguments passed to the init function
    pub init_args: Vec<String>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            init_function: "InitLedger".to_string(),
            init_args: Vec::new(),
        }
    }
}
