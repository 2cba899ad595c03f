//! REST adapter against an in-process control plane

mod common;

use assert_matches::assert_matches;
use mayastor_cp_query::cluster::StaticNodeAddresses;
use mayastor_cp_query::controlplane::RestConfig;
use mayastor_cp_query::reconcile::{self, PollSettings};
use mayastor_cp_query::{
    ControlPlaneBackend, Error, NodeDirectory, PoolDirectory, RestControlPlane, VolumeDirectory,
};
use std::sync::Arc;
use std::time::Duration;

fn adapter(port: u16) -> RestControlPlane {
    let config = RestConfig {
        port,
        request_timeout_secs: 5,
        ..Default::default()
    };
    RestControlPlane::new(config, common::node_addresses()).unwrap()
}

async fn start() -> (RestControlPlane, Arc<common::MockState>) {
    let state = common::cluster();
    let port = common::serve(state.clone()).await;
    (adapter(port), state)
}

#[tokio::test]
async fn test_get_volume_fails_over_to_live_node() {
    let (cp, _) = start().await;

    let volume = cp.get_volume("vol-1").await.unwrap().unwrap();
    assert_eq!(volume.name, "vol-1");
    assert_eq!(volume.spec.replica_count, 2);
    assert_eq!(volume.spec.protocol, "nvmf");
    assert_eq!(volume.spec.target_node, "node-1");
    assert_eq!(volume.status.state, "Online");
    assert_eq!(volume.status.nexus.node, "node-1");
    assert_eq!(volume.status.nexus.children.len(), 2);
}

#[tokio::test]
async fn test_replica_uris_resolved_per_replica() {
    let (cp, _) = start().await;

    let replicas = cp.get_volume_replicas("vol-1").await.unwrap();
    assert_eq!(replicas.len(), 2);
    assert_eq!(replicas[0].pool, "pool-1");
    assert_eq!(replicas[0].uri, "bdev:///r1?uuid=r1");
    assert!(!replicas[0].offline);
    // r2 is unknown to the control plane
    assert_eq!(replicas[1].pool, "pool-2");
    assert_eq!(replicas[1].uri, "");

    let nodes = cp.get_volume_nodes("vol-1").await.unwrap();
    assert_eq!(nodes.nexus_node, "node-1");
    assert_eq!(nodes.replica_nodes, vec!["node-1", "node-2"]);
}

#[tokio::test]
async fn test_pending_volume() {
    let (cp, _) = start().await;

    assert!(cp.get_volume("vol-new").await.unwrap().is_none());
    assert_eq!(cp.get_volume_state("vol-new").await.unwrap(), "");
    assert!(!cp.is_volume_published("vol-new").await.unwrap());
    assert!(!cp.is_volume_deleted("vol-new").await.unwrap());

    // Pending volumes are left out of the listing
    let volumes = cp.list_volumes().await.unwrap();
    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes[0].name, "vol-1");
}

#[tokio::test]
async fn test_missing_volume() {
    let (cp, _) = start().await;

    let err = cp.get_volume("vol-missing").await.unwrap_err();
    assert_matches!(err, Error::NotFound { ref kind, ref name } if kind == "volume" && name == "vol-missing");
    assert!(cp.is_volume_deleted("vol-missing").await.unwrap());
}

#[tokio::test]
async fn test_malformed_volume_fails_listing() {
    let state = common::cluster();
    let mut broken = common::volume("vol-bad");
    broken["spec"]["num_replicas"] = 0.into();
    state
        .volumes
        .lock()
        .unwrap()
        .insert("vol-bad".to_string(), broken);
    let cp = adapter(common::serve(state).await);

    let err = cp.list_volumes().await.unwrap_err();
    assert_matches!(err, Error::InvalidReplicaCount { ref uuid, count: 0 } if uuid == "vol-bad");
}

#[tokio::test]
async fn test_wait_through_unknown_state() {
    let state = common::cluster();
    let mut unknown = common::volume("vol-1");
    unknown["state"]["status"] = "Unknown".into();
    state
        .volumes
        .lock()
        .unwrap()
        .insert("vol-1".to_string(), unknown);
    let cp = adapter(common::serve(state.clone()).await);

    // The raw state is readable even though the full record is rejected
    assert_eq!(cp.get_volume_state("vol-1").await.unwrap(), "Unknown");
    assert_matches!(
        cp.get_volume("vol-1").await,
        Err(Error::StateNotDefined { .. })
    );

    let recovered = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        recovered
            .volumes
            .lock()
            .unwrap()
            .insert("vol-1".to_string(), common::volume("vol-1"));
    });

    let settings = PollSettings {
        timeout: Duration::from_secs(10),
        interval: Duration::from_millis(200),
        unexpected_limit: 10,
    };
    reconcile::wait_for_volume_healthy(&cp, "vol-1", &settings)
        .await
        .unwrap();
    assert_eq!(cp.get_volume_state("vol-1").await.unwrap(), "Online");
}

#[tokio::test]
async fn test_volume_health_summary() {
    let state = common::cluster();
    let mut degraded = common::volume("vol-2");
    degraded["state"]["status"] = "Degraded".into();
    state
        .volumes
        .lock()
        .unwrap()
        .insert("vol-2".to_string(), degraded);
    let cp = adapter(common::serve(state).await);

    assert!(cp.check_for_volumes().await.unwrap());
    let err = cp.check_all_volumes_healthy().await.unwrap_err();
    assert_matches!(err, Error::Unhealthy { ref names, .. } if names == "vol-2=Degraded");
}

#[tokio::test]
async fn test_set_replica_count_and_delete() {
    let (cp, state) = start().await;

    cp.set_replica_count("vol-1", 3).await.unwrap();
    assert_eq!(
        *state.replica_counts.lock().unwrap(),
        vec![("vol-1".to_string(), 3)]
    );

    cp.delete_volume("vol-1").await.unwrap();
    assert!(cp.is_volume_deleted("vol-1").await.unwrap());

    let err = cp.delete_volume("vol-1").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_pools() {
    let (cp, _) = start().await;

    let pools = cp.list_pools().await.unwrap();
    assert_eq!(pools.len(), 2);

    let pool = cp.get_pool("pool-2").await.unwrap();
    assert_eq!(pool.name, "pool-2");
    assert_eq!(pool.spec.node, "node-2");
    assert_eq!(pool.spec.disks, vec!["/dev/sdb"]);
    assert_eq!(pool.status.avail, 10737418240 - 2147483648);
    cp.check_all_pools_online().await.unwrap();

    let err = cp.get_pool("pool-9").await.unwrap_err();
    assert_matches!(err, Error::NotFound { ref kind, .. } if kind == "pool");
}

#[tokio::test]
async fn test_request_timeout_is_classified() {
    let (cp, _) = start().await;

    let err = cp.get_pool(common::SLOW_POOL).await.unwrap_err();
    assert_matches!(err, Error::RequestTimeout { .. });
    assert!(cp.is_timeout_error(&err));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_nodes() {
    let (cp, _) = start().await;

    let nodes = cp.list_nodes().await.unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].name, "node-2");
    assert_eq!(nodes[1].spec.grpc_endpoint, "10.0.0.2:10124");
    assert_eq!(nodes[1].state.status, "Online");
}

#[tokio::test]
async fn test_no_nodes() {
    let cp = RestControlPlane::new(
        RestConfig::default(),
        Arc::new(StaticNodeAddresses::new(Vec::new())),
    )
    .unwrap();

    let err = cp.list_volumes().await.unwrap_err();
    assert_matches!(err, Error::NodesNotFound);
}

#[tokio::test]
async fn test_every_node_down() {
    let cp = RestControlPlane::new(
        RestConfig {
            port: 1,
            request_timeout_secs: 2,
            ..Default::default()
        },
        common::node_addresses(),
    )
    .unwrap();

    let err = cp.list_pools().await.unwrap_err();
    assert_matches!(err, Error::Reqwest(_));
    assert!(!err.is_not_found());
}
