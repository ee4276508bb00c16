use crate::{
    ApiError, GuestType, PveApi,
    tests::support::{create_authenticated_client, mount_get, mount_status},
};
use wiremock::MockServer;

#[tokio::test]
async fn test_list_guests_merges_and_sorts() {
    let mock_server = MockServer::start().await;
    let client = create_authenticated_client(&mock_server).await;

    mount_get(
        &mock_server,
        "/nodes/pve1/qemu",
        serde_json::json!([
            {"vmid": 120, "name": "db01", "status": "running", "maxdisk": 34359738368_i64},
            {"vmid": 100, "name": "web01", "status": "stopped", "template": 0}
        ]),
    )
    .await;
    mount_get(
        &mock_server,
        "/nodes/pve1/lxc",
        serde_json::json!([
            {"vmid": "110", "name": "proxy", "status": "running", "type": "lxc"},
            {"vmid": "130", "name": "", "status": "stopped", "type": "lxc"}
        ]),
    )
    .await;

    let guests = client.list_guests("pve1").await.unwrap();
    let summary: Vec<(u32, GuestType)> = guests.iter().map(|g| (g.vmid, g.guest_type)).collect();
    assert_eq!(
        summary,
        vec![
            (100, GuestType::Qemu),
            (110, GuestType::Lxc),
            (120, GuestType::Qemu),
            (130, GuestType::Lxc)
        ]
    );
    assert!(guests.iter().all(|g| g.node == "pve1"));
    assert_eq!(guests[1].name.as_deref(), Some("proxy"));
    assert_eq!(guests[3].name, None);
    assert_eq!(guests[3].display_name(), "");
}

#[tokio::test]
async fn test_list_guests_lxc_failure_fails_node() {
    let mock_server = MockServer::start().await;
    let client = create_authenticated_client(&mock_server).await;
    mount_get(&mock_server, "/nodes/pve1/qemu", serde_json::json!([])).await;
    mount_status(&mock_server, "/nodes/pve1/lxc", 595).await;

    let result = client.list_guests("pve1").await;
    assert!(matches!(result, Err(ApiError::Unreachable(_))));
}

#[tokio::test]
async fn test_storage_status() {
    let mock_server = MockServer::start().await;
    let client = create_authenticated_client(&mock_server).await;

    mount_get(
        &mock_server,
        "/nodes/pve1/storage",
        serde_json::json!([
            {"storage": "local", "type": "dir", "total": 100_u64 << 30, "used": 40_u64 << 30, "avail": 60_u64 << 30, "active": 1, "enabled": 1, "shared": 0, "content": "iso,backup"},
            {"storage": "ceph", "type": "rbd", "total": 1_u64 << 40, "used": 1_u64 << 39, "avail": 1_u64 << 39, "active": 1, "shared": 1},
            {"storage": "offsite", "type": "pbs", "active": 0, "enabled": 0}
        ]),
    )
    .await;

    let storages = client.get_storage_status("pve1").await.unwrap();
    assert_eq!(storages.len(), 3);

    let local = &storages[0];
    assert_eq!(local.node, "pve1");
    assert_eq!(local.storage_type, "dir");
    assert_eq!(local.total, 100 << 30);
    assert_eq!(local.available, 60 << 30);
    assert_eq!(local.usage_percent(), (40.0, 60.0));

    let ceph = &storages[1];
    assert!(ceph.shared);
    assert!(ceph.enabled);

    let offsite = &storages[2];
    assert!(!offsite.active);
    assert!(!offsite.enabled);
    assert_eq!(offsite.total, 0);
    assert_eq!(offsite.usage_percent(), (0.0, 0.0));
}

#[tokio::test]
async fn test_storage_status_unauthorized() {
    let mock_server = MockServer::start().await;
    let client = create_authenticated_client(&mock_server).await;
    mount_status(&mock_server, "/nodes/pve1/storage", 403).await;

    let result = client.get_storage_status("pve1").await;
    assert!(matches!(result, Err(ApiError::Unauthorized(_))));
}
