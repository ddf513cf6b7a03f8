//! Configuration for the Ledger Gateway

use serde::{Deserialize, Serialize};
use shared_types::RetryPolicy;
use std::time::Duration;

/// Gateway configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Deadline when neither the caller nor the operation sets one
    pub default_timeout: Duration,
    /// Retry policy for read-only calls. Mutating calls are never retried.
    pub query_retry: RetryPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            query_retry: RetryPolicy::default(),
        }
    }
}
