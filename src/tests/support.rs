//! Shared fixtures: a mock Proxmox VE endpoint and an authenticated client.

use crate::{
    ApiClient, ClientConfig, ProxmoxHost, ProxmoxPassword, ProxmoxPort, ProxmoxRealm, ProxmoxUrl,
    ProxmoxUsername,
    core::domain::{
        model::{
            proxmox_auth::ProxmoxAuth,
            proxmox_connection::{ProxmoxConnection, ProxmoxCredentials},
        },
        value_object::{ProxmoxCSRFToken, ProxmoxTicket},
    },
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub fn create_test_connection(server_url: &str) -> ProxmoxConnection {
    let host = ProxmoxHost::new_unchecked("127.0.0.1".to_string());
    let port = ProxmoxPort::new_unchecked(8006);
    let credentials = ProxmoxCredentials::Password {
        username: ProxmoxUsername::new_unchecked("testuser".to_string()),
        password: ProxmoxPassword::new_unchecked("testpass".to_string()),
        realm: ProxmoxRealm::new_unchecked("pam".to_string()),
    };
    let url = ProxmoxUrl::new_unchecked(server_url.to_string() + "/");
    ProxmoxConnection::new(host, port, credentials, false, url)
}

pub async fn create_authenticated_client(mock_server: &MockServer) -> ApiClient {
    let connection = create_test_connection(&mock_server.uri());
    let client = ApiClient::new(connection, ClientConfig::default()).unwrap();

    let ticket = ProxmoxTicket::new_unchecked("PVE:testuser@pam:4EEC61E2::sig".to_string());
    let csrf = ProxmoxCSRFToken::new_unchecked("4EEC61E2:token".to_string());
    client.set_auth(ProxmoxAuth::new(ticket, Some(csrf))).await;
    client
}

/// Answers `GET /api2/json{api_path}` with `{"data": data}`.
pub async fn mount_get(mock_server: &MockServer, api_path: &str, data: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api2/json{}", api_path)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
        .mount(mock_server)
        .await;
}

/// Answers `GET /api2/json{api_path}` with a bare status code.
pub async fn mount_status(mock_server: &MockServer, api_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/api2/json{}", api_path)))
        .respond_with(ResponseTemplate::new(status))
        .mount(mock_server)
        .await;
}

/// A two node cluster `lab`.
///
/// `pve01` runs VM 100 (`scsi0` 10 GiB, `scsi1` 5 GiB, a CD-ROM on `ide2`)
/// and container 101 (`rootfs` 8 GiB). `pve02` has no guests.
pub async fn mount_pve01_dataset(mock_server: &MockServer) {
    mount_get(
        mock_server,
        "/cluster/status",
        json!([
            {"type": "cluster", "id": "cluster", "name": "lab", "nodes": 2, "quorate": 1, "version": 4},
            {"type": "node", "id": "node/pve01", "name": "pve01", "ip": "192.168.10.11", "local": 1, "nodeid": 1, "online": 1},
            {"type": "node", "id": "node/pve02", "name": "pve02", "ip": "192.168.10.12", "local": 0, "nodeid": 2, "online": 1}
        ]),
    )
    .await;
    mount_get(
        mock_server,
        "/cluster/config/nodes",
        json!([
            {"node": "pve01", "name": "pve01", "nodeid": "1", "quorum_votes": "1", "ring0_addr": "10.10.10.11"},
            {"node": "pve02", "name": "pve02", "nodeid": "2", "quorum_votes": "1", "ring0_addr": "10.10.10.12"}
        ]),
    )
    .await;

    mount_get(
        mock_server,
        "/nodes/pve01/qemu",
        json!([{"vmid": 100, "name": "web01", "status": "running"}]),
    )
    .await;
    mount_get(
        mock_server,
        "/nodes/pve01/lxc",
        json!([{"vmid": "101", "name": "dns01", "status": "running", "type": "lxc"}]),
    )
    .await;
    mount_get(mock_server, "/nodes/pve02/qemu", json!([])).await;
    mount_get(mock_server, "/nodes/pve02/lxc", json!([])).await;

    mount_get(
        mock_server,
        "/nodes/pve01/qemu/100/config",
        json!({
            "name": "web01",
            "memory": 4096,
            "scsihw": "virtio-scsi-single",
            "scsi0": "local-lvm:vm-100-disk-0,iothread=1,size=10G",
            "scsi1": "local-lvm:vm-100-disk-1,size=5G",
            "ide2": "local:iso/debian-12.iso,media=cdrom,size=628M",
            "digest": "0a1b2c"
        }),
    )
    .await;
    mount_get(
        mock_server,
        "/nodes/pve01/lxc/101/config",
        json!({
            "hostname": "dns01",
            "rootfs": "local-lvm:vm-101-disk-0,size=8G",
            "memory": 512
        }),
    )
    .await;

    for node in ["pve01", "pve02"] {
        mount_get(
            mock_server,
            &format!("/nodes/{}/storage", node),
            json!([
                {"storage": "local", "type": "dir", "total": 100_000_000_000_u64, "used": 25_000_000_000_u64, "avail": 75_000_000_000_u64, "active": 1, "enabled": 1, "shared": 0, "content": "iso,vztmpl,backup"},
                {"storage": "local-lvm", "type": "lvmthin", "total": 400_000_000_000_u64, "used": 100_000_000_000_u64, "avail": 300_000_000_000_u64, "active": 1, "enabled": 1, "shared": 0},
                {"storage": "nfs-backup", "type": "nfs", "active": 0, "enabled": 1, "shared": 1}
            ]),
        )
        .await;
    }
}
