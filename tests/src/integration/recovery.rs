//! # Faults and Recovery
//!
//! Partial failures must leave a state the next run can finish from:
//! bootstrap retried for the failed organizations only, deployment resumed
//! after an outage, reads served by another peer, and the event stream
//! surviving transport errors.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pc_01_network_bootstrap::{NetworkBootstrapApi, SetupError};
    use pc_02_chaincode_lifecycle::{ChaincodeLifecycleApi, CommitOutcome, LifecycleError};
    use pc_03_ledger_gateway::{GatewayError, GatewayRequest, GatewayResponse};
    use shared_bus::{EventFilter, LedgerEvent, StartPosition};
    use tokio::time::timeout;

    use crate::fixtures::{TestNetwork, ASSET};

    #[tokio::test]
    async fn test_bootstrap_retries_only_failed_orgs() {
        let net = TestNetwork::new(3);
        let network = &net.container.network;
        let bootstrap = &net.container.bootstrap;
        net.ledger.set_peers_reachable(net.peers_of(2), false);

        let err = bootstrap.ensure_channel(network).await.unwrap_err();
        let failed = err.failed_orgs();
        assert!(matches!(err, SetupError::Partial { .. }));
        assert_eq!(failed, vec![net.msp_ids()[2].clone()]);
        for peer in net.peers_of(0) {
            assert_eq!(net.ledger.joined_channels(&peer).unwrap(), vec![network.channel_id.clone()]);
        }

        net.ledger.set_peers_reachable(net.peers_of(2), true);
        let height = net.ledger.height();
        let handle = bootstrap.ensure_channel_for(network, &failed).await.unwrap();
        assert_eq!(handle.members, net.msp_ids());
        // One anchor peer update for the recovered organization only.
        assert_eq!(net.ledger.height(), height + 1);

        // A full rerun finds everything in place.
        let height = net.ledger.height();
        bootstrap.ensure_channel(network).await.unwrap();
        assert_eq!(net.ledger.height(), height);
    }

    #[tokio::test]
    async fn test_deployment_resumes_after_org_outage() {
        let net = TestNetwork::bootstrapped(2).await;
        let lifecycle = &net.container.lifecycle;
        let orgs = net.msp_ids();
        net.ledger.set_peers_reachable(net.peers_of(1), false);

        let err = lifecycle.deploy(net.asset(), &[]).await.unwrap_err();
        let LifecycleError::Deployment { failures, .. } = &err else {
            panic!("expected Deployment, got {err:?}");
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, orgs[1]);
        assert!(failures[0].1.is_retryable());

        // The healthy organization's approval survives the failed run.
        net.ledger.set_peers_reachable(net.peers_of(1), true);
        assert!(lifecycle.query_committed(ASSET).await.unwrap().is_none());
        let artifact = lifecycle.package(net.asset()).unwrap();
        let readiness = lifecycle
            .check_commit_readiness(net.asset(), 1, &orgs)
            .await
            .unwrap();
        assert_eq!(readiness.approvals.missing(), vec![orgs[1].clone()]);

        let report = lifecycle.deploy(net.asset(), &[]).await.unwrap();
        assert!(matches!(report.commit, CommitOutcome::Committed(_)));
        assert_eq!(report.package_id, artifact.package_id);
    }

    #[tokio::test]
    async fn test_query_fails_over_to_second_peer() {
        let net = TestNetwork::bootstrapped(2).await;
        net.container.lifecycle.deploy(net.asset(), &[]).await.unwrap();
        let gateway = net.gateway();
        gateway
            .handle(GatewayRequest::new(ASSET, "create", &["id-1", "field-a"]))
            .await
            .unwrap();

        net.ledger.set_peer_reachable(&net.peers_of(0)[0], false);
        let response = gateway
            .handle(GatewayRequest::new(ASSET, "getById", &["id-1"]))
            .await
            .unwrap();
        let GatewayResponse::Payload(payload) = response else {
            panic!("expected a payload, got {response:?}");
        };
        assert!(String::from_utf8_lossy(&payload).contains("field-a"));
    }

    #[tokio::test]
    async fn test_invoke_with_unreachable_member_is_not_ambiguous() {
        let net = TestNetwork::bootstrapped(2).await;
        net.container.lifecycle.deploy(net.asset(), &[]).await.unwrap();
        let gateway = net.gateway();
        let height = net.ledger.height();

        net.ledger.set_peers_reachable(net.peers_of(1), false);
        let err = gateway
            .handle(GatewayRequest::new(ASSET, "create", &["id-1", "field-a"]))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Endorsement { .. }), "got {err:?}");
        assert!(!err.is_ambiguous());
        assert_eq!(net.ledger.height(), height);

        net.ledger.set_peers_reachable(net.peers_of(1), true);
        let response = gateway
            .handle(GatewayRequest::new(ASSET, "create", &["id-1", "field-a"]))
            .await
            .unwrap();
        assert!(matches!(response, GatewayResponse::Submitted { .. }));
    }

    #[tokio::test]
    async fn test_conflicting_writes_emit_one_event() {
        let net = TestNetwork::bootstrapped(2).await;
        net.container.lifecycle.deploy(net.asset(), &[]).await.unwrap();
        let gateway = net.gateway();
        gateway
            .handle(GatewayRequest::new(ASSET, "create", &["id-1", "alice"]))
            .await
            .unwrap();

        let mut events = net
            .container
            .events
            .subscribe(EventFilter::contract(ASSET), StartPosition::Current)
            .await
            .unwrap();

        gateway
            .handle(GatewayRequest::new(ASSET, "Transfer", &["id-1", "alice", "bob"]))
            .await
            .unwrap();
        // Endorsed against a stale owner: rejected before ordering.
        let stale = gateway
            .handle(GatewayRequest::new(ASSET, "Transfer", &["id-1", "alice", "carol"]))
            .await;
        assert!(stale.is_err());

        let Some(LedgerEvent::Contract(event)) = timeout(Duration::from_secs(5), events.recv()).await.unwrap()
        else {
            panic!("expected the transfer event");
        };
        assert_eq!(event.event_name, "Transfer");
        assert!(String::from_utf8_lossy(&event.payload).contains("bob"));
        assert!(timeout(Duration::from_millis(100), events.recv()).await.is_err());
        events.unsubscribe().await;
    }

    #[tokio::test]
    async fn test_event_stream_survives_transport_faults() {
        let net = TestNetwork::bootstrapped(2).await;
        net.container.lifecycle.deploy(net.asset(), &[]).await.unwrap();
        let hub = &net.container.events;
        let gateway = net.gateway();

        let start = net.ledger.height();
        let mut blocks = hub
            .subscribe(EventFilter::blocks(), StartPosition::From(start))
            .await
            .unwrap();
        net.ledger.inject_stream_faults(3);

        for i in 0..3 {
            let id = format!("id-{i}");
            gateway
                .handle(GatewayRequest::new(ASSET, "create", &[id.as_str(), "field"]))
                .await
                .unwrap();
        }

        let mut numbers = Vec::new();
        while numbers.len() < 3 {
            match timeout(Duration::from_secs(5), blocks.recv()).await.unwrap() {
                Some(LedgerEvent::Block(block)) => numbers.push(block.number),
                other => panic!("unexpected delivery {other:?}"),
            }
        }
        assert_eq!(numbers, vec![start, start + 1, start + 2]);
        hub.unsubscribe(blocks).await;
    }
}
