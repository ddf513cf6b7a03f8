//! # Lifecycle and Gateway Properties
//!
//! Properties that must hold for every organization, sequence and subset:
//!
//! - Install is idempotent per organization
//! - A second, different approval at the same sequence is a conflict
//! - Commits only advance the sequence by one
//! - Readiness holds exactly when every required organization approved
//! - Operation kinds are enforced before the network is reached

#[cfg(test)]
mod tests {
    use pc_02_chaincode_lifecycle::{ChaincodeLifecycleApi, LifecycleError, LifecycleState};
    use pc_03_ledger_gateway::{GatewayError, LedgerGatewayApi};
    use proptest::prelude::*;
    use shared_types::{MspId, OperationKind};

    use crate::fixtures::TestNetwork;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    // =========================================================================
    // IDEMPOTENT INSTALL
    // =========================================================================

    #[tokio::test]
    async fn test_install_twice_is_same_success_for_every_org() {
        let net = TestNetwork::bootstrapped(3).await;
        let lifecycle = &net.container.lifecycle;
        let artifact = lifecycle.package(net.asset()).unwrap();
        let height = net.ledger.height();

        for (index, org) in net.msp_ids().iter().enumerate() {
            let first = lifecycle.install(&artifact, org).await.unwrap();
            let second = lifecycle.install(&artifact, org).await.unwrap();
            assert_eq!(first, second);
            assert_eq!(first, artifact.package_id);
            for peer in net.peers_of(index) {
                assert!(net.ledger.is_installed(&peer, &artifact.package_id).unwrap());
            }
        }

        // Install is peer-local: no channel transaction.
        assert_eq!(net.ledger.height(), height);
        let state = lifecycle
            .lifecycle_state(net.asset(), 1, &artifact.package_id)
            .await
            .unwrap();
        assert_eq!(state, LifecycleState::Installed { orgs: net.msp_ids() });
    }

    // =========================================================================
    // APPROVAL CONFLICT
    // =========================================================================

    #[tokio::test]
    async fn test_different_package_at_same_sequence_conflicts() {
        let net = TestNetwork::bootstrapped(2).await;
        let lifecycle = &net.container.lifecycle;
        let org = &net.msp_ids()[0];

        let original = lifecycle.package(net.asset()).unwrap();
        let variant = net.asset_variant("package asset // v2");
        let other = lifecycle.package(&variant).unwrap();
        assert_ne!(original.package_id, other.package_id);

        lifecycle.install(&original, org).await.unwrap();
        lifecycle.install(&other, org).await.unwrap();
        lifecycle
            .approve(net.asset(), 1, &original.package_id, org)
            .await
            .unwrap();

        let err = lifecycle
            .approve(&variant, 1, &other.package_id, org)
            .await
            .unwrap_err();
        match err {
            LifecycleError::ApprovalConflict {
                msp_id,
                sequence,
                approved,
                requested,
            } => {
                assert_eq!(&msp_id, org);
                assert_eq!(sequence, 1);
                assert_eq!(approved, original.package_id);
                assert_eq!(requested, other.package_id);
            }
            other => panic!("expected ApprovalConflict, got {other:?}"),
        }

        // Never a silent overwrite.
        let readiness = lifecycle
            .check_commit_readiness(net.asset(), 1, std::slice::from_ref(org))
            .await
            .unwrap();
        assert_eq!(readiness.package_id, Some(original.package_id.clone()));

        // Re-approving the same package stays a no-op.
        lifecycle
            .approve(net.asset(), 1, &original.package_id, org)
            .await
            .unwrap();
    }

    // =========================================================================
    // MONOTONIC SEQUENCING
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn prop_commit_skipping_a_sequence_fails(committed in 0u64..4, gap in 2u64..6) {
            let requested = committed + gap;
            runtime().block_on(async {
                let net = TestNetwork::bootstrapped(2).await;
                let lifecycle = &net.container.lifecycle;
                let orgs = net.msp_ids();

                for sequence in 1..=committed {
                    let descriptor = net.asset().clone().with_sequence(sequence);
                    lifecycle.deploy(&descriptor, &[]).await.unwrap();
                }

                let descriptor = net.asset().clone().with_sequence(requested);
                let err = lifecycle.commit(&descriptor, requested, &orgs[0]).await.unwrap_err();
                match err {
                    LifecycleError::Sequence { requested: r, expected, .. } => {
                        assert_eq!(r, requested);
                        assert_eq!(expected, committed + 1);
                    }
                    other => panic!("expected Sequence, got {other:?}"),
                }
                let current = lifecycle.query_committed(&descriptor.name).await.unwrap();
                assert_eq!(current.map_or(0, |c| c.sequence), committed);
            });
        }
    }

    #[tokio::test]
    async fn test_next_sequence_commits_after_upgrade() {
        let net = TestNetwork::bootstrapped(2).await;
        let lifecycle = &net.container.lifecycle;

        lifecycle.deploy(net.asset(), &[]).await.unwrap();
        let upgrade = net.asset_variant("package asset // v2").with_sequence(2);
        let report = lifecycle.deploy(&upgrade, &[]).await.unwrap();
        assert_eq!(report.sequence, 2);

        let committed = lifecycle.query_committed(&upgrade.name).await.unwrap().unwrap();
        assert_eq!(committed.sequence, 2);
        assert_eq!(committed.package_id, report.package_id);
    }

    // =========================================================================
    // READINESS OVER SUBSETS
    // =========================================================================

    #[tokio::test]
    async fn test_readiness_iff_every_required_org_approved() {
        const ORGS: u32 = 3;
        for mask in 0u32..(1 << ORGS) {
            let net = TestNetwork::bootstrapped(ORGS).await;
            let lifecycle = &net.container.lifecycle;
            let orgs = net.msp_ids();
            let artifact = lifecycle.package(net.asset()).unwrap();

            let approving: Vec<MspId> = orgs
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, m)| m.clone())
                .collect();
            for org in &approving {
                lifecycle.install(&artifact, org).await.unwrap();
                lifecycle
                    .approve(net.asset(), 1, &artifact.package_id, org)
                    .await
                    .unwrap();
            }

            let readiness = lifecycle
                .check_commit_readiness(net.asset(), 1, &orgs)
                .await
                .unwrap();
            assert_eq!(readiness.ready, approving.len() == orgs.len(), "mask {mask:03b}");
            let missing: Vec<MspId> = orgs.iter().filter(|m| !approving.contains(m)).cloned().collect();
            assert_eq!(readiness.approvals.missing(), missing, "mask {mask:03b}");

            // Readiness over exactly the approving subset.
            let subset = lifecycle
                .check_commit_readiness(net.asset(), 1, &approving)
                .await
                .unwrap();
            assert_eq!(subset.ready, !approving.is_empty(), "mask {mask:03b}");
        }
    }

    #[tokio::test]
    async fn test_disagreeing_packages_are_never_ready() {
        let net = TestNetwork::bootstrapped(2).await;
        let lifecycle = &net.container.lifecycle;
        let orgs = net.msp_ids();

        let original = lifecycle.package(net.asset()).unwrap();
        let variant = net.asset_variant("package asset // fork");
        let other = lifecycle.package(&variant).unwrap();

        lifecycle.install(&original, &orgs[0]).await.unwrap();
        lifecycle
            .approve(net.asset(), 1, &original.package_id, &orgs[0])
            .await
            .unwrap();
        lifecycle.install(&other, &orgs[1]).await.unwrap();
        lifecycle
            .approve(&variant, 1, &other.package_id, &orgs[1])
            .await
            .unwrap();

        let err = lifecycle
            .check_commit_readiness(net.asset(), 1, &orgs)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Readiness { ref msp_id, .. } if msp_id == &orgs[1]));
        assert!(lifecycle.commit(net.asset(), 1, &orgs[0]).await.is_err());
        assert!(lifecycle.query_committed(&net.asset().name).await.unwrap().is_none());
    }

    // =========================================================================
    // KIND ENFORCEMENT
    // =========================================================================

    #[tokio::test]
    async fn test_wrong_kind_never_reaches_network() {
        let net = TestNetwork::bootstrapped(2).await;
        let gateway = &net.container.gateway;
        let height = net.ledger.height();

        let specs: Vec<_> = gateway.registry().iter().cloned().collect();
        assert!(!specs.is_empty());
        for spec in &specs {
            let args = vec!["x".to_string(); spec.arity];
            let result = match spec.kind {
                OperationKind::Mutating => gateway
                    .query(&spec.contract, &spec.operation, &args, None)
                    .await
                    .map(|_| ()),
                OperationKind::ReadOnly => gateway
                    .invoke(&spec.contract, &spec.operation, &args, None)
                    .await
                    .map(|_| ()),
            };
            match result {
                Err(GatewayError::OperationKindMismatch { registered, requested, .. }) => {
                    assert_eq!(registered, spec.kind);
                    assert_ne!(requested, spec.kind);
                }
                other => panic!("{spec}: expected OperationKindMismatch, got {other:?}"),
            }
        }
        assert_eq!(net.ledger.height(), height);
    }
}
