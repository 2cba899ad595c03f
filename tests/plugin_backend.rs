//! kubectl plugin adapter, driven through a shell script standing in for
//! the plugin binary

mod common;

use assert_matches::assert_matches;
use mayastor_cp_query::controlplane::{PluginConfig, RestConfig};
use mayastor_cp_query::{
    ControlPlaneBackend, Error, NodeDirectory, PluginControlPlane, PoolDirectory, VolumeDirectory,
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const NOT_FOUND_OUTPUT: &str = "Error error in response: status code '404 Not Found', \
content: 'RestJsonError { details: \"\", message: \"SvcError :: VolumeNotFound\", kind: NotFound }'";

const TIMEOUT_OUTPUT: &str = "Error error in response: status code '408 Request Timeout', \
content: 'RestJsonError { details: \"\", message: \"\", kind: Timeout }'";

/// Fake plugin: fails on the dead node, answers the live one from JSON
/// files and records each argument list in `calls.log`
fn write_plugin(dir: &Path) -> String {
    let write = |name: &str, value: &Value| {
        fs::write(dir.join(name), serde_json::to_vec(value).unwrap()).unwrap();
    };
    write("volume.json", &common::volume("vol-1"));
    write(
        "volumes.json",
        &json!([common::volume("vol-1"), common::creating_volume("vol-new")]),
    );
    write(
        "pools.json",
        &json!([
            common::pool("pool-1", "node-1", "Online"),
            common::pool("pool-2", "node-2", "Degraded")
        ]),
    );
    write("pool.json", &common::pool("pool-1", "node-1", "Online"));
    write("nodes.json", &json!({ "entries": [common::node("node-1", "10.0.0.1")] }));
    write("node.json", &common::node("node-1", "10.0.0.1"));

    let dir = dir.display();
    let script = format!(
        r#"#!/bin/sh
endpoint="$2"
shift 2
case "$endpoint" in
  *{dead}*) echo "Failed to connect to $endpoint: Connection refused" >&2; exit 1 ;;
esac
echo "$*" >> {dir}/calls.log
case "$*" in
  "-ojson get volume vol-1") cat {dir}/volume.json ;;
  "-ojson get volume vol-gone") echo "{not_found}" >&2; exit 1 ;;
  "-ojson get volumes") cat {dir}/volumes.json ;;
  "-ojson get pools") cat {dir}/pools.json ;;
  "-ojson get pool pool-1") cat {dir}/pool.json ;;
  "-ojson get pool slow") echo "{timeout}"; exit 1 ;;
  "-ojson get nodes") cat {dir}/nodes.json ;;
  "-ojson get node node-1") cat {dir}/node.json ;;
  "scale volume vol-1 3") echo "Volume vol-1 Scaled Successfully" ;;
  *) echo "unexpected arguments: $*" >&2; exit 2 ;;
esac
"#,
        dead = common::DEAD_NODE,
        dir = dir,
        not_found = NOT_FOUND_OUTPUT.replace('"', "\\\""),
        timeout = TIMEOUT_OUTPUT.replace('"', "\\\""),
    );

    let path = format!("{}/kubectl-mayastor.sh", dir);
    fs::write(&path, script).unwrap();
    path
}

/// The plugin adapter, with replica URIs served by the mock REST service
async fn start() -> (PluginControlPlane, TempDir) {
    let dir = TempDir::new().unwrap();
    let script = write_plugin(dir.path());
    let port = common::serve(common::cluster()).await;

    let plugin = PluginConfig {
        binary: "/bin/sh".to_string(),
        base_args: vec![script],
    };
    let rest = RestConfig {
        port,
        request_timeout_secs: 5,
        ..Default::default()
    };
    let cp = PluginControlPlane::new(plugin, rest, common::node_addresses()).unwrap();
    (cp, dir)
}

fn calls(dir: &TempDir) -> Vec<String> {
    fs::read_to_string(dir.path().join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_get_volume() {
    let (cp, dir) = start().await;

    let volume = cp.get_volume("vol-1").await.unwrap().unwrap();
    assert_eq!(volume.name, "vol-1");
    assert_eq!(volume.status.state, "Online");
    assert_eq!(volume.status.replicas.len(), 2);
    assert_eq!(volume.status.replicas[0].uri, "bdev:///r1?uuid=r1");
    assert_eq!(volume.status.replicas[1].uri, "");

    // Only the live node recorded a call
    assert_eq!(calls(&dir), vec!["-ojson get volume vol-1"]);

    assert_eq!(cp.get_volume_state("vol-1").await.unwrap(), "Online");
}

#[tokio::test]
async fn test_list_volumes_skips_pending() {
    let (cp, _dir) = start().await;

    let volumes = cp.list_volumes().await.unwrap();
    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes[0].name, "vol-1");
}

#[tokio::test]
async fn test_not_found_output() {
    let (cp, _dir) = start().await;

    let err = cp.get_volume("vol-gone").await.unwrap_err();
    assert_matches!(err, Error::NotFound { ref kind, ref name } if kind == "volume" && name == "vol-gone");
    assert!(cp.is_volume_deleted("vol-gone").await.unwrap());
}

#[tokio::test]
async fn test_timeout_output() {
    let (cp, _dir) = start().await;

    let err = cp.get_pool("slow").await.unwrap_err();
    assert_matches!(err, Error::RequestTimeout { .. });
    assert!(cp.is_timeout_error(&err));
}

#[tokio::test]
async fn test_unrecognised_failure() {
    let (cp, _dir) = start().await;

    let err = cp.get_pool("pool-9").await.unwrap_err();
    assert_matches!(err, Error::Plugin { ref output, .. } if output.contains("unexpected arguments"));
    assert!(!err.is_not_found());
    assert!(!cp.is_timeout_error(&err));
}

#[tokio::test]
async fn test_pools() {
    let (cp, _dir) = start().await;

    let pool = cp.get_pool("pool-1").await.unwrap();
    assert_eq!(pool.status.state, "Online");
    assert_eq!(pool.status.avail, pool.status.capacity - pool.status.used);

    let err = cp.check_all_pools_online().await.unwrap_err();
    assert_matches!(err, Error::Unhealthy { ref names, .. } if names == "pool-2=Degraded");
}

#[tokio::test]
async fn test_nodes() {
    let (cp, _dir) = start().await;

    let nodes = cp.list_nodes().await.unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(cp.get_node_status("node-1").await.unwrap(), "Online");
}

#[tokio::test]
async fn test_scale_and_unsupported_deletes() {
    let (cp, dir) = start().await;

    cp.set_replica_count("vol-1", 3).await.unwrap();
    assert_eq!(calls(&dir), vec!["scale volume vol-1 3"]);

    assert_matches!(
        cp.delete_volume("vol-1").await.unwrap_err(),
        Error::Unsupported { ref backend, .. } if backend == "plugin"
    );
    assert_matches!(
        cp.delete_pool("pool-1").await.unwrap_err(),
        Error::Unsupported { .. }
    );
}
