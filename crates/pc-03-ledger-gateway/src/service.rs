//! Ledger Gateway Service
//!
//! One generic path per kind:
//! - **Mutating**: validate, submit once under a deadline, return the tx id
//! - **ReadOnly**: validate, evaluate with bounded retry under a deadline
//!
//! Validation (registry lookup, kind tag, arity) happens before any call to
//! the channel client.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use shared_types::{
    retry_transient, BlockNumber, LedgerError, OperationKind, TransactionId, TransactionResult,
};

use crate::config::GatewayConfig;
use crate::domain::entities::{ChannelInfo, GatewayRequest, GatewayResponse, OperationSpec};
use crate::domain::errors::GatewayError;
use crate::domain::invariants::{invariant_arity, invariant_kind};
use crate::domain::registry::OperationRegistry;
use crate::ports::inbound::LedgerGatewayApi;
use crate::ports::outbound::ChannelClient;

/// Ledger Gateway Service
pub struct LedgerGateway {
    client: Arc<dyn ChannelClient>,
    registry: Arc<OperationRegistry>,
    config: GatewayConfig,
}

impl LedgerGateway {
    pub fn new(client: Arc<dyn ChannelClient>, registry: Arc<OperationRegistry>) -> Self {
        Self::with_config(client, registry, GatewayConfig::default())
    }

    pub fn with_config(
        client: Arc<dyn ChannelClient>,
        registry: Arc<OperationRegistry>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    fn validated(
        &self,
        contract: &str,
        operation: &str,
        kind: OperationKind,
        args: &[String],
    ) -> Result<&OperationSpec, GatewayError> {
        let spec = self.registry.lookup(contract, operation)?;
        invariant_kind(spec, kind)?;
        invariant_arity(spec, args)?;
        Ok(spec)
    }

    fn deadline(&self, spec: &OperationSpec, requested: Option<Duration>) -> Duration {
        requested
            .or(spec.timeout)
            .unwrap_or(self.config.default_timeout)
    }

    fn wrap(&self, operation: String, source: LedgerError) -> GatewayError {
        match source {
            LedgerError::EndorsementFailed(reason) => GatewayError::Endorsement { operation, reason },
            source => GatewayError::Ledger {
                operation,
                msp_id: self.client.msp_id().clone(),
                source,
            },
        }
    }
}

#[async_trait]
impl LedgerGatewayApi for LedgerGateway {
    async fn invoke(
        &self,
        contract: &str,
        operation: &str,
        args: &[String],
        deadline: Option<Duration>,
    ) -> Result<TransactionResult, GatewayError> {
        let spec = self.validated(contract, operation, OperationKind::Mutating, args)?;
        let deadline = self.deadline(spec, deadline);

        let submitted = tokio::time::timeout(deadline, self.client.submit(contract, operation, args)).await;
        let transaction_id = match submitted {
            Ok(Ok(tx_id)) => tx_id,
            Ok(Err(source)) => {
                warn!(contract, operation, error = %source, "Invoke failed");
                return Err(self.wrap(spec.qualified_name(), source));
            }
            Err(_) => {
                warn!(contract, operation, ?deadline, "Invoke timed out, outcome unknown");
                return Err(GatewayError::Timeout {
                    operation: spec.qualified_name(),
                    elapsed: deadline,
                    tx_may_be_ordered: true,
                });
            }
        };

        info!(contract, operation, tx_id = %transaction_id, "Transaction ordered");
        Ok(TransactionResult {
            transaction_id,
            payload: None,
        })
    }

    async fn query(
        &self,
        contract: &str,
        operation: &str,
        args: &[String],
        deadline: Option<Duration>,
    ) -> Result<Vec<u8>, GatewayError> {
        let spec = self.validated(contract, operation, OperationKind::ReadOnly, args)?;
        let deadline = self.deadline(spec, deadline);

        let evaluated = tokio::time::timeout(
            deadline,
            retry_transient(&self.config.query_retry, operation, || {
                self.client.evaluate(contract, operation, args)
            }),
        )
        .await;
        match evaluated {
            Ok(Ok(payload)) => {
                debug!(contract, operation, bytes = payload.len(), "Query evaluated");
                Ok(payload)
            }
            Ok(Err(source)) => Err(self.wrap(spec.qualified_name(), source)),
            Err(_) => Err(GatewayError::Timeout {
                operation: spec.qualified_name(),
                elapsed: deadline,
                tx_may_be_ordered: false,
            }),
        }
    }

    async fn lookup_transaction(&self, tx_id: &TransactionId) -> Result<Option<BlockNumber>, GatewayError> {
        retry_transient(&self.config.query_retry, "block_for_transaction", || {
            self.client.block_for_transaction(tx_id)
        })
        .await
        .map_err(|source| self.wrap(format!("lookup {tx_id}"), source))
    }

    async fn channel_info(&self) -> Result<ChannelInfo, GatewayError> {
        retry_transient(&self.config.query_retry, "channel_info", || self.client.channel_info())
            .await
            .map_err(|source| self.wrap("channel info".to_string(), source))
    }

    async fn dispatch(&self, request: GatewayRequest) -> Result<GatewayResponse, GatewayError> {
        let deadline = request.deadline();
        let GatewayRequest {
            contract,
            operation,
            args,
            ..
        } = request;
        let kind = self.registry.lookup(&contract, &operation)?.kind;

        match kind {
            OperationKind::Mutating => self
                .invoke(&contract, &operation, &args, deadline)
                .await
                .map(|r| GatewayResponse::Submitted {
                    tx_id: r.transaction_id,
                }),
            OperationKind::ReadOnly => self
                .query(&contract, &operation, &args, deadline)
                .await
                .map(GatewayResponse::Payload),
        }
    }
}
