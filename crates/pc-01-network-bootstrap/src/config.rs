//! Configuration for Network Bootstrap

use serde::{Deserialize, Serialize};
use shared_types::RetryPolicy;

/// Bootstrap configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Retry policy for each ledger step
    pub retry: RetryPolicy,
    /// Process organizations concurrently; outcomes stay in registry order
    pub concurrent_orgs: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            concurrent_orgs: true,
        }
    }
}
