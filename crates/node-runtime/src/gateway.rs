//! # Gateway Runtime
//!
//! The narrow interface the external request layer calls: contract name,
//! operation name and positional arguments in; transaction id, payload or a
//! tagged error out. Routing, form decoding and CORS stay outside.

use std::sync::Arc;

use pc_03_ledger_gateway::{ChannelInfo, GatewayError, GatewayRequest, GatewayResponse, LedgerGatewayApi};
use serde_json::json;
use shared_types::{BlockNumber, TransactionId};
use tracing::{debug, error, warn};

use crate::handlers::payload_json;

/// Shared handle to the ledger gateway. Cheap to clone per request.
#[derive(Clone)]
pub struct GatewayRuntime {
    gateway: Arc<dyn LedgerGatewayApi>,
}

impl GatewayRuntime {
    pub fn new(gateway: Arc<dyn LedgerGatewayApi>) -> Self {
        Self { gateway }
    }

    /// Dispatch one request by its registered operation kind.
    pub async fn handle(&self, request: GatewayRequest) -> Result<GatewayResponse, GatewayError> {
        let contract = request.contract.clone();
        let operation = request.operation.clone();
        let result = self.gateway.dispatch(request).await;

        match &result {
            Ok(GatewayResponse::Submitted { tx_id }) => {
                debug!(contract = %contract, operation = %operation, tx_id = %tx_id, "Request submitted");
            }
            Ok(GatewayResponse::Payload(payload)) => {
                debug!(contract = %contract, operation = %operation, bytes = payload.len(), "Request answered");
            }
            Err(e) if e.is_caller_error() => {
                warn!(contract = %contract, operation = %operation, error = %e, "Request rejected");
            }
            Err(e) if e.is_ambiguous() => {
                warn!(
                    contract = %contract,
                    operation = %operation,
                    error = %e,
                    "Outcome unknown, reconcile by transaction id"
                );
            }
            Err(e) => {
                error!(contract = %contract, operation = %operation, error = %e, "Request failed");
            }
        }
        result
    }

    /// `handle` with the reply encoded as JSON.
    pub async fn handle_json(&self, request: GatewayRequest) -> serde_json::Value {
        reply_json(&self.handle(request).await)
    }

    /// Block holding `tx_id`, `None` while it is not committed.
    pub async fn lookup_transaction(&self, tx_id: &TransactionId) -> Result<Option<BlockNumber>, GatewayError> {
        self.gateway.lookup_transaction(tx_id).await
    }

    /// Channel name, block count and transaction count.
    pub async fn channel_info(&self) -> Result<ChannelInfo, GatewayError> {
        self.gateway.channel_info().await
    }

    /// `channel_info` as `{"ChannelName", "BlockCount", "TransactionCount"}`.
    pub async fn channel_info_json(&self) -> serde_json::Value {
        match self.channel_info().await {
            Ok(info) => json!({
                "status": "ok",
                "ChannelName": info.channel_id,
                "BlockCount": info.block_count,
                "TransactionCount": info.transaction_count,
            }),
            Err(e) => {
                warn!(error = %e, "Channel info unavailable");
                json!({
                    "status": "error",
                    "kind": error_kind(&e),
                    "message": e.to_string(),
                    "ambiguous": false,
                })
            }
        }
    }
}

/// JSON reply for the request layer.
///
/// ```text
/// {"status":"submitted","tx_id":"…"}
/// {"status":"ok","payload":…}
/// {"status":"error","kind":"ArgumentArity","message":"…","ambiguous":false}
/// ```
pub fn reply_json(result: &Result<GatewayResponse, GatewayError>) -> serde_json::Value {
    match result {
        Ok(GatewayResponse::Submitted { tx_id }) => json!({
            "status": "submitted",
            "tx_id": tx_id.as_str(),
        }),
        Ok(GatewayResponse::Payload(payload)) => json!({
            "status": "ok",
            "payload": payload_json(payload),
        }),
        Err(e) => json!({
            "status": "error",
            "kind": error_kind(e),
            "message": e.to_string(),
            "ambiguous": e.is_ambiguous(),
        }),
    }
}

fn error_kind(error: &GatewayError) -> &'static str {
    match error {
        GatewayError::UnknownOperation { .. } => "UnknownOperation",
        GatewayError::OperationKindMismatch { .. } => "OperationKindMismatch",
        GatewayError::ArgumentArity { .. } => "ArgumentArity",
        GatewayError::Timeout { .. } => "Timeout",
        GatewayError::Endorsement { .. } => "Endorsement",
        GatewayError::Ledger { .. } => "Ledger",
        GatewayError::Configuration(_) => "Configuration",
    }
}
