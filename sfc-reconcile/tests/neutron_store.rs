//! NeutronStore against a mock Neutron API.

mod common;

use std::sync::Arc;

use common::{MockNeutron, TEST_TOKEN, object};
use serde_json::json;
use sfc_reconcile::{
    DesiredState, Error, ObjectKind, RemoteStore, ResourceKind, SfcReconciler, StoreError,
    TargetState,
};

#[tokio::test]
async fn test_lookup_by_name_and_id() {
    let neutron = MockNeutron::spawn().await;
    let id = neutron.seed("ports", json!({"name": "p1"}));
    let store = neutron.store();

    let by_name = store.get(ObjectKind::Port, "p1").await.unwrap().unwrap();
    assert_eq!(by_name["id"], json!(id));

    let by_id = store.get(ObjectKind::Port, &id).await.unwrap().unwrap();
    assert_eq!(by_id["name"], json!("p1"));

    let missing = store.get(ObjectKind::Port, "p9").await.unwrap();
    assert!(missing.is_none());

    assert_eq!(
        neutron.requests(),
        vec!["GET /ports", "GET /ports", "GET /ports"]
    );
    assert!(
        neutron
            .tokens()
            .iter()
            .all(|t| t.as_deref() == Some(TEST_TOKEN))
    );
}

#[tokio::test]
async fn test_uuid_shaped_name_falls_back_to_name_lookup() {
    let neutron = MockNeutron::spawn().await;
    let name = "6d1bb0e4-3f43-4bc4-a4b4-3c1d0a1c9a21";
    neutron.seed("port_pairs", json!({"name": name}));
    let store = neutron.store();

    let found = store.get(ObjectKind::PortPair, name).await.unwrap();
    assert!(found.is_some());
    assert_eq!(neutron.requests().len(), 2);
}

#[tokio::test]
async fn test_duplicate_names_conflict() {
    let neutron = MockNeutron::spawn().await;
    neutron.seed("flow_classifiers", json!({"name": "fc"}));
    neutron.seed("flow_classifiers", json!({"name": "fc"}));

    let err = neutron
        .store()
        .get(ObjectKind::FlowClassifier, "fc")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
async fn test_create_update_delete() {
    let neutron = MockNeutron::spawn().await;
    let store = neutron.store();

    let created = store
        .create(
            ObjectKind::PortPairGroup,
            object(json!({"name": "ppg1", "port_pairs": ["a"]})),
        )
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["port_pairs"], json!(["a"]));

    let updated = store
        .update(
            ObjectKind::PortPairGroup,
            &id,
            object(json!({"port_pairs": ["a", "b"]})),
        )
        .await
        .unwrap();
    assert_eq!(updated["port_pairs"], json!(["a", "b"]));
    assert_eq!(updated["name"], json!("ppg1"));

    store.delete(ObjectKind::PortPairGroup, &id).await.unwrap();
    assert!(neutron.objects("port_pair_groups").is_empty());

    assert_eq!(
        neutron.requests(),
        vec![
            "POST /port_pair_groups".to_string(),
            format!("PUT /port_pair_groups/{id}"),
            format!("DELETE /port_pair_groups/{id}"),
        ]
    );
}

#[tokio::test]
async fn test_api_error_message_is_verbatim() {
    let neutron = MockNeutron::spawn().await;
    let err = neutron
        .store()
        .delete(ObjectKind::PortChain, "no-such-chain")
        .await
        .unwrap_err();

    match err {
        StoreError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "port_chain no-such-chain could not be found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_transport_error() {
    let neutron = MockNeutron::spawn().await;
    let store = neutron.store();
    drop(neutron);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let err = store.get(ObjectKind::Port, "p1").await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)), "{err}");
}

#[tokio::test]
async fn test_reconcile_chain_end_to_end() {
    let neutron = MockNeutron::spawn().await;
    neutron.seed("ports", json!({"name": "sf-in"}));
    neutron.seed("ports", json!({"name": "sf-out"}));
    neutron.seed("ports", json!({"name": "client"}));
    let reconciler = SfcReconciler::new(Arc::new(neutron.store()));

    let steps = [
        (
            ResourceKind::FlowClassifier,
            DesiredState::named("fc1")
                .with("logical_source_port", "client")
                .with("protocol", "tcp")
                .with("destination_port_range_min", 80)
                .with("destination_port_range_max", 80),
        ),
        (
            ResourceKind::PortPair,
            DesiredState::named("pp1")
                .with("ingress", "sf-in")
                .with("egress", "sf-out"),
        ),
        (
            ResourceKind::PortPairGroup,
            DesiredState::named("ppg1").with("port_pairs", vec!["pp1"]),
        ),
        (
            ResourceKind::PortChain,
            DesiredState::named("pc1")
                .with("port_pair_groups", vec!["ppg1"])
                .with("flow_classifiers", vec!["fc1"]),
        ),
    ];

    for (kind, desired) in &steps {
        let result = reconciler
            .apply(*kind, desired, TargetState::Present, false)
            .await
            .unwrap();
        assert!(result.changed, "{kind}");
    }
    let mutations = neutron.mutation_count();
    assert_eq!(mutations, 4);

    for (kind, desired) in &steps {
        let result = reconciler
            .apply(*kind, desired, TargetState::Present, false)
            .await
            .unwrap();
        assert!(!result.changed, "{kind} should be converged");
    }
    assert_eq!(neutron.mutation_count(), mutations);

    let chains = neutron.objects("port_chains");
    let groups = neutron.objects("port_pair_groups");
    assert_eq!(chains[0]["port_pair_groups"], json!([groups[0]["id"]]));

    for (kind, desired) in steps.iter().rev() {
        let result = reconciler
            .apply(*kind, desired, TargetState::Absent, false)
            .await
            .unwrap();
        assert!(result.changed, "{kind}");
    }
    assert!(neutron.objects("port_chains").is_empty());
    assert!(neutron.objects("flow_classifiers").is_empty());
}

#[tokio::test]
async fn test_rejected_update_surfaces_neutron_message() {
    let neutron = MockNeutron::spawn().await;
    let p1 = neutron.seed("ports", json!({"name": "p1"}));
    let p2 = neutron.seed("ports", json!({"name": "p2"}));
    neutron.seed("ports", json!({"name": "p3"}));
    neutron.seed(
        "port_pairs",
        json!({"name": "pp1", "ingress": p1, "egress": p2}),
    );
    let reconciler = SfcReconciler::new(Arc::new(neutron.store()));

    let desired = DesiredState::named("pp1")
        .with("ingress", "p3")
        .with("egress", "p2");
    let err = reconciler
        .apply(ResourceKind::PortPair, &desired, TargetState::Present, false)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RemoteStore { .. }));
    assert_eq!(
        err.to_string(),
        "failed to update port pair: API error (400): Attribute 'ingress' cannot be updated"
    );
}

#[tokio::test]
async fn test_check_mode_sends_only_reads() {
    let neutron = MockNeutron::spawn().await;
    neutron.seed("port_pair_groups", json!({"name": "ppg1", "port_pairs": []}));
    let reconciler = SfcReconciler::new(Arc::new(neutron.store()));

    let desired = DesiredState::named("pc1")
        .with("port_pair_groups", vec!["ppg1"])
        .with("flow_classifiers", vec!["fc-not-yet-created"]);
    let result = reconciler
        .apply(ResourceKind::PortChain, &desired, TargetState::Present, true)
        .await
        .unwrap();

    assert!(result.changed);
    assert!(result.object.is_none());
    assert_eq!(neutron.mutation_count(), 0);
}
