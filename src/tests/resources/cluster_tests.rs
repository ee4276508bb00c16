use crate::{
    ApiError, NodeRole, PveApi,
    tests::support::{create_authenticated_client, mount_get, mount_status},
};
use wiremock::MockServer;

fn cluster_status() -> serde_json::Value {
    serde_json::json!([
        {"type": "cluster", "id": "cluster", "name": "prod", "nodes": 3, "quorate": 1, "version": 12},
        {"type": "node", "id": "node/pve1", "name": "pve1", "ip": "192.168.1.11", "local": 1, "nodeid": 1, "online": 1, "level": ""},
        {"type": "node", "id": "node/pve2", "name": "pve2", "ip": "192.168.1.12", "local": 0, "nodeid": 2, "online": 1, "level": ""},
        {"type": "node", "id": "node/pve3", "name": "pve3", "ip": "192.168.1.13", "local": 0, "nodeid": 3, "online": 0, "level": ""}
    ])
}

#[tokio::test]
async fn test_list_nodes_success() {
    let mock_server = MockServer::start().await;
    let client = create_authenticated_client(&mock_server).await;
    mount_get(&mock_server, "/cluster/status", cluster_status()).await;

    let nodes = client.list_nodes().await.unwrap();
    assert_eq!(nodes.len(), 3);

    let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["pve1", "pve2", "pve3"]);

    assert_eq!(nodes[0].role, NodeRole::Local);
    assert!(nodes[0].online);
    assert_eq!(nodes[0].ring0_addr.as_deref(), Some("192.168.1.11"));
    assert_eq!(nodes[1].role, NodeRole::Remote);
    assert!(!nodes[2].online);
    assert!(nodes.iter().all(|n| n.external.is_none()));
}

#[tokio::test]
async fn test_list_nodes_standalone() {
    let mock_server = MockServer::start().await;
    let client = create_authenticated_client(&mock_server).await;
    mount_get(
        &mock_server,
        "/cluster/status",
        serde_json::json!([
            {"type": "node", "id": "node/pve", "name": "pve", "ip": "10.0.0.5", "local": 1, "online": 1}
        ]),
    )
    .await;

    let nodes = client.list_nodes().await.unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].name, "pve");
}

#[tokio::test]
async fn test_cluster_info_prefers_corosync_addresses() {
    let mock_server = MockServer::start().await;
    let client = create_authenticated_client(&mock_server).await;
    mount_get(&mock_server, "/cluster/status", cluster_status()).await;
    mount_get(
        &mock_server,
        "/cluster/config/nodes",
        serde_json::json!([
            {"node": "pve1", "name": "pve1", "nodeid": "1", "quorum_votes": "1", "ring0_addr": "10.10.10.11"},
            {"node": "pve2", "name": "pve2", "nodeid": "2", "quorum_votes": "1", "ring0_addr": "10.10.10.12"},
            {"node": "pve3", "name": "pve3", "nodeid": "3", "quorum_votes": "1"}
        ]),
    )
    .await;

    let info = client.get_cluster_info().await.unwrap();
    assert_eq!(info.name, "prod");
    assert!(info.quorate);
    assert_eq!(info.version, Some(12));
    assert_eq!(info.nodes[0].ring0_addr.as_deref(), Some("10.10.10.11"));
    assert_eq!(info.nodes[1].ring0_addr.as_deref(), Some("10.10.10.12"));
    // no ring0_addr in the corosync entry, the status address stays
    assert_eq!(info.nodes[2].ring0_addr.as_deref(), Some("192.168.1.13"));
}

#[tokio::test]
async fn test_cluster_info_without_config_access() {
    let mock_server = MockServer::start().await;
    let client = create_authenticated_client(&mock_server).await;
    mount_get(&mock_server, "/cluster/status", cluster_status()).await;
    mount_status(&mock_server, "/cluster/config/nodes", 403).await;

    let info = client.get_cluster_info().await.unwrap();
    assert_eq!(info.nodes.len(), 3);
    assert_eq!(info.nodes[0].ring0_addr.as_deref(), Some("192.168.1.11"));
}

#[tokio::test]
async fn test_cluster_info_status_failure() {
    let mock_server = MockServer::start().await;
    let client = create_authenticated_client(&mock_server).await;
    mount_status(&mock_server, "/cluster/status", 500).await;

    let result = client.get_cluster_info().await;
    assert!(matches!(result, Err(ApiError::Unreachable(_))));
}

#[tokio::test]
async fn test_node_network() {
    let mock_server = MockServer::start().await;
    let client = create_authenticated_client(&mock_server).await;
    mount_get(
        &mock_server,
        "/nodes/pve1/network",
        serde_json::json!([
            {"iface": "eno1", "type": "eth", "active": 1, "families": ["inet"], "method": "manual"},
            {"iface": "vmbr0", "type": "bridge", "active": 1, "families": ["inet"], "address": "192.168.1.11", "cidr": "192.168.1.11/24", "gateway": "192.168.1.1", "netmask": "24"},
            {"iface": "vmbr1", "type": "bridge", "active": 1, "families": ["inet", "inet6"], "address": "203.0.113.11", "cidr": "203.0.113.11/27", "gateway": "203.0.113.1"}
        ]),
    )
    .await;

    let interfaces = client.get_node_network("pve1").await.unwrap();
    assert_eq!(interfaces.len(), 3);
    assert!(interfaces[0].address.is_none());

    let external = crate::core::domain::model::network::select_external_address(&interfaces)
        .unwrap();
    assert_eq!(external.address, "203.0.113.11");
    assert_eq!(external.cidr.as_deref(), Some("203.0.113.11/27"));
    assert_eq!(external.gateway.as_deref(), Some("203.0.113.1"));
}
