//! Chaincode Lifecycle Service
//!
//! Drives a contract from source tree to committed, initialized definition:
//! 1. Package the source (pure, local)
//! 2. Install and approve per organization (organizations run concurrently)
//! 3. Check readiness across the required organizations
//! 4. Commit from one organization
//! 5. Run init if the descriptor declares it
//!
//! No lifecycle state is kept here. Every decision is made on fresh ledger
//! queries, so a restart simply re-derives where each contract stands.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use shared_types::{
    retry_transient, ContractDescriptor, LedgerError, MspId, NetworkConfig, Organization,
    PackageArtifact, PackageId, TransactionResult,
};

use crate::config::LifecycleConfig;
use crate::domain::errors::LifecycleError;
use crate::domain::invariants::{derive_state, invariant_readiness, invariant_sequence};
use crate::domain::packaging;
use crate::domain::value_objects::{
    ApprovedDefinition, CommitOutcome, CommitReadiness, CommittedDefinition, DeploymentReport,
    InitOutcome, LifecycleState, OrgLifecycleStatus,
};
use crate::ports::inbound::ChaincodeLifecycleApi;
use crate::ports::outbound::LifecyclePeer;

/// Chaincode Lifecycle Service
pub struct LifecycleManager {
    peer: Arc<dyn LifecyclePeer>,
    network: Arc<NetworkConfig>,
    config: LifecycleConfig,
}

impl LifecycleManager {
    pub fn new(peer: Arc<dyn LifecyclePeer>, network: Arc<NetworkConfig>) -> Self {
        Self::with_config(peer, network, LifecycleConfig::default())
    }

    pub fn with_config(
        peer: Arc<dyn LifecyclePeer>,
        network: Arc<NetworkConfig>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            peer,
            network,
            config,
        }
    }

    fn channel(&self) -> &str {
        &self.network.channel_id
    }

    fn org(&self, msp_id: &MspId) -> Result<&Organization, LifecycleError> {
        self.network
            .organization(msp_id)
            .ok_or_else(|| LifecycleError::UnknownOrganization(msp_id.clone()))
    }

    fn orgs(&self, msp_ids: &[MspId]) -> Result<Vec<&Organization>, LifecycleError> {
        msp_ids.iter().map(|m| self.org(m)).collect()
    }

    async fn committed_via(
        &self,
        org: &Organization,
        name: &str,
    ) -> Result<Option<CommittedDefinition>, LifecycleError> {
        retry_transient(&self.config.retry, "query_committed", || {
            self.peer.query_committed(org, self.channel(), name)
        })
        .await
        .map_err(|source| ledger("query_committed", org, source))
    }

    async fn approved_via(
        &self,
        org: &Organization,
        name: &str,
        sequence: u64,
    ) -> Result<Option<ApprovedDefinition>, LifecycleError> {
        retry_transient(&self.config.retry, "query_approved", || {
            self.peer.query_approved(org, self.channel(), name, sequence)
        })
        .await
        .map_err(|source| ledger("query_approved", org, source))
    }

    /// Organizations able to endorse right now, one per required org.
    async fn endorsers<'a>(
        &self,
        name: &str,
        orgs: &[&'a Organization],
    ) -> Result<Vec<&'a Organization>, LifecycleError> {
        let counts = join_all(orgs.iter().map(|org| self.peer.reachable_peers(org))).await;
        let unreachable: Vec<String> = orgs
            .iter()
            .zip(&counts)
            .filter(|(_, count)| !matches!(count, Ok(n) if *n > 0))
            .map(|(org, _)| org.msp_id.to_string())
            .collect();
        if !unreachable.is_empty() {
            return Err(LifecycleError::Endorsement {
                name: name.to_string(),
                reason: format!("no reachable peer for {}", unreachable.join(", ")),
            });
        }
        Ok(orgs.to_vec())
    }

    async fn install_and_approve(
        &self,
        artifact: &PackageArtifact,
        descriptor: &ContractDescriptor,
        msp_id: &MspId,
    ) -> Result<(), LifecycleError> {
        let package_id = self.install(artifact, msp_id).await?;
        self.approve(descriptor, descriptor.sequence, &package_id, msp_id)
            .await
    }

    async fn run_init(
        &self,
        descriptor: &ContractDescriptor,
        msp_id: &MspId,
        args: &[String],
    ) -> Result<Option<TransactionResult>, LifecycleError> {
        if !descriptor.init_required {
            return Ok(None);
        }
        let org = self.org(msp_id)?;
        let name = descriptor.name.as_str();

        match self.committed_via(org, name).await? {
            Some(c) if c.sequence == descriptor.sequence => {
                if c.initialized {
                    return Err(LifecycleError::AlreadyInitialized {
                        name: name.to_string(),
                    });
                }
            }
            _ => {
                return Err(LifecycleError::NotCommitted {
                    name: name.to_string(),
                    sequence: descriptor.sequence,
                })
            }
        }

        let function = self.config.init_function.as_str();
        let result = retry_transient(&self.config.retry, "init", || {
            self.peer.init(org, self.channel(), name, function, args)
        })
        .await;
        match result {
            Ok(transaction_id) => {
                info!(contract = name, msp_id = %msp_id, tx_id = %transaction_id, "Contract initialized");
                Ok(Some(TransactionResult {
                    transaction_id,
                    payload: None,
                }))
            }
            Err(LedgerError::AlreadyInitialized { .. }) => Err(LifecycleError::AlreadyInitialized {
                name: name.to_string(),
            }),
            Err(source) => Err(ledger("init", org, source)),
        }
    }
}

fn ledger(operation: &'static str, org: &Organization, source: LedgerError) -> LifecycleError {
    LifecycleError::Ledger {
        operation,
        msp_id: org.msp_id.clone(),
        source,
    }
}

#[async_trait]
impl ChaincodeLifecycleApi for LifecycleManager {
    fn package(&self, descriptor: &ContractDescriptor) -> Result<PackageArtifact, LifecycleError> {
        let artifact = packaging::package(descriptor)?;
        debug!(
            contract = %descriptor.name,
            package_id = %artifact.package_id,
            bytes = artifact.bytes.len(),
            "Contract packaged"
        );
        Ok(artifact)
    }

    async fn install(&self, artifact: &PackageArtifact, msp_id: &MspId) -> Result<PackageId, LifecycleError> {
        let org = self.org(msp_id)?;
        let retry = &self.config.retry;
        let install_failed = |source| LifecycleError::Install {
            msp_id: msp_id.clone(),
            source,
        };

        let installed = retry_transient(retry, "query_installed", || {
            self.peer.query_installed(org, &artifact.package_id)
        })
        .await
        .map_err(install_failed)?;
        if installed {
            debug!(msp_id = %msp_id, package_id = %artifact.package_id, "Package already installed");
            return Ok(artifact.package_id.clone());
        }

        let package_id = retry_transient(retry, "install", || self.peer.install(org, artifact))
            .await
            .map_err(install_failed)?;
        info!(msp_id = %msp_id, package_id = %package_id, "Package installed");
        Ok(package_id)
    }

    async fn approve(
        &self,
        descriptor: &ContractDescriptor,
        sequence: u64,
        package_id: &PackageId,
        msp_id: &MspId,
    ) -> Result<(), LifecycleError> {
        let org = self.org(msp_id)?;
        let name = descriptor.name.as_str();

        if let Some(existing) = self.approved_via(org, name, sequence).await? {
            if &existing.package_id == package_id {
                debug!(contract = name, msp_id = %msp_id, sequence, "Already approved");
                return Ok(());
            }
            return Err(LifecycleError::ApprovalConflict {
                msp_id: msp_id.clone(),
                sequence,
                approved: existing.package_id,
                requested: package_id.clone(),
            });
        }

        let committed = self.committed_via(org, name).await?;
        invariant_sequence(name, sequence, committed.as_ref())?;

        let definition = ApprovedDefinition::for_descriptor(descriptor, sequence, package_id.clone());
        retry_transient(&self.config.retry, "approve", || {
            self.peer.approve(org, self.channel(), &definition)
        })
        .await
        .map_err(|source| ledger("approve", org, source))?;
        info!(contract = name, msp_id = %msp_id, sequence, package_id = %package_id, "Definition approved");
        Ok(())
    }

    async fn check_commit_readiness(
        &self,
        descriptor: &ContractDescriptor,
        sequence: u64,
        required_orgs: &[MspId],
    ) -> Result<CommitReadiness, LifecycleError> {
        let orgs = self.orgs(required_orgs)?;
        let name = descriptor.name.as_str();

        let committed = self.query_committed(name).await?;
        invariant_sequence(name, sequence, committed.as_ref())?;

        let approvals = join_all(orgs.iter().map(|org| async move {
            self.approved_via(org, name, sequence)
                .await
                .map(|a| (org.msp_id.clone(), a.map(|a| a.package_id)))
        }))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        let readiness = invariant_readiness(name, sequence, required_orgs, &approvals)?;
        debug!(
            contract = name,
            sequence,
            ready = readiness.ready,
            missing = ?readiness.approvals.missing(),
            "Commit readiness checked"
        );
        Ok(readiness)
    }

    async fn commit(
        &self,
        descriptor: &ContractDescriptor,
        sequence: u64,
        committing_org: &MspId,
    ) -> Result<CommitOutcome, LifecycleError> {
        let org = self.org(committing_org)?;
        let name = descriptor.name.as_str();
        let already = |c: &Option<CommittedDefinition>| c.as_ref().is_some_and(|c| c.sequence == sequence);

        if already(&self.committed_via(org, name).await?) {
            info!(contract = name, sequence, "Definition already committed");
            return Ok(CommitOutcome::AlreadyCommitted);
        }

        let required = descriptor.required_orgs(&self.network);
        let readiness = match self.check_commit_readiness(descriptor, sequence, &required).await {
            Ok(r) => r,
            // Another committer may have landed between the two queries.
            Err(e @ LifecycleError::Sequence { .. }) => {
                if already(&self.committed_via(org, name).await?) {
                    info!(contract = name, sequence, "Definition committed concurrently");
                    return Ok(CommitOutcome::AlreadyCommitted);
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let package_id = match (readiness.ready, readiness.package_id) {
            (true, Some(package_id)) => package_id,
            _ => {
                return Err(LifecycleError::NotReady {
                    name: name.to_string(),
                    missing: readiness.approvals.missing(),
                })
            }
        };

        let required_orgs = self.orgs(&required)?;
        let endorsers = self.endorsers(name, &required_orgs).await?;
        let definition = ApprovedDefinition::for_descriptor(descriptor, sequence, package_id);

        let result = retry_transient(&self.config.retry, "commit", || {
            self.peer.commit(org, self.channel(), &definition, &endorsers)
        })
        .await;
        match result {
            Ok(tx_id) => {
                info!(contract = name, sequence, msp_id = %committing_org, tx_id = %tx_id, "Definition committed");
                Ok(CommitOutcome::Committed(tx_id))
            }
            Err(LedgerError::AlreadyCommitted { .. }) => {
                info!(contract = name, sequence, "Commit lost race, definition already committed");
                Ok(CommitOutcome::AlreadyCommitted)
            }
            Err(LedgerError::EndorsementFailed(reason)) => Err(LifecycleError::Endorsement {
                name: name.to_string(),
                reason,
            }),
            Err(source) => Err(ledger("commit", org, source)),
        }
    }

    async fn init_if_declared(
        &self,
        descriptor: &ContractDescriptor,
        initiating_org: &MspId,
    ) -> Result<Option<TransactionResult>, LifecycleError> {
        self.run_init(descriptor, initiating_org, &self.config.init_args)
            .await
    }

    async fn query_committed(&self, name: &str) -> Result<Option<CommittedDefinition>, LifecycleError> {
        // Any member can answer; take the first one that does.
        let mut last_error = None;
        for org in &self.network.organizations {
            match self.committed_via(org, name).await {
                Ok(committed) => return Ok(committed),
                Err(e) => {
                    warn!(contract = name, msp_id = %org.msp_id, error = %e, "Committed query failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| LifecycleError::NotCommitted {
            name: name.to_string(),
            sequence: 0,
        }))
    }

    async fn lifecycle_state(
        &self,
        descriptor: &ContractDescriptor,
        sequence: u64,
        package_id: &PackageId,
    ) -> Result<LifecycleState, LifecycleError> {
        let required = descriptor.required_orgs(&self.network);
        let orgs = self.orgs(&required)?;
        let name = descriptor.name.as_str();
        let retry = &self.config.retry;

        let statuses = join_all(orgs.iter().map(|org| async move {
            let installed = retry_transient(retry, "query_installed", || {
                self.peer.query_installed(org, package_id)
            })
            .await
            .map_err(|source| ledger("query_installed", org, source))?;
            let approval = self.approved_via(org, name, sequence).await?;
            Ok::<_, LifecycleError>(OrgLifecycleStatus {
                msp_id: org.msp_id.clone(),
                installed,
                approval,
            })
        }))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        let committed = self.query_committed(name).await?;
        Ok(derive_state(sequence, package_id, &statuses, committed.as_ref()))
    }

    async fn deploy(
        &self,
        descriptor: &ContractDescriptor,
        init_args: &[String],
    ) -> Result<DeploymentReport, LifecycleError> {
        let name = descriptor.name.as_str();
        let sequence = descriptor.sequence;
        let artifact = self.package(descriptor)?;
        let required = descriptor.required_orgs(&self.network);
        let Some(lead) = required.first() else {
            return Err(LifecycleError::Endorsement {
                name: name.to_string(),
                reason: "policy names no organization".into(),
            });
        };

        let results = join_all(
            required
                .iter()
                .map(|msp_id| self.install_and_approve(&artifact, descriptor, msp_id)),
        )
        .await;
        let failures: Vec<(MspId, Box<LifecycleError>)> = required
            .iter()
            .zip(results)
            .filter_map(|(msp_id, r)| r.err().map(|e| (msp_id.clone(), Box::new(e))))
            .collect();
        if !failures.is_empty() {
            for (msp_id, e) in &failures {
                warn!(contract = name, msp_id = %msp_id, error = %e, "Deployment step failed");
            }
            return Err(LifecycleError::Deployment {
                name: name.to_string(),
                failures,
            });
        }

        let commit = self.commit(descriptor, sequence, lead).await?;

        let init = match self.run_init(descriptor, lead, init_args).await {
            Ok(None) => InitOutcome::NotDeclared,
            Ok(Some(result)) => InitOutcome::Initialized(result),
            Err(LifecycleError::AlreadyInitialized { .. }) => {
                info!(contract = name, "Contract already initialized");
                InitOutcome::AlreadyInitialized
            }
            Err(e) => return Err(e),
        };

        info!(contract = name, sequence, package_id = %artifact.package_id, "Contract deployed");
        Ok(DeploymentReport {
            name: name.to_string(),
            sequence,
            package_id: artifact.package_id,
            commit,
            init,
        })
    }
}
