use crate::{
    ApiError, Guest, GuestType, PveApi,
    core::application::collector::disk_records,
    tests::support::{create_authenticated_client, mount_get},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn guest(vmid: u32, guest_type: GuestType) -> Guest {
    Guest {
        vmid,
        guest_type,
        node: "pve1".to_string(),
        name: Some("test-guest".to_string()),
    }
}

#[tokio::test]
async fn test_qemu_config() {
    let mock_server = MockServer::start().await;
    let client = create_authenticated_client(&mock_server).await;

    mount_get(
        &mock_server,
        "/nodes/pve1/qemu/100/config",
        serde_json::json!({
            "name": "test-vm",
            "memory": 2048,
            "sockets": 1,
            "cores": 4,
            "agent": 1,
            "boot": "order=scsi0;ide2;net0",
            "scsihw": "virtio-scsi-pci",
            "scsi0": "local-lvm:vm-100-disk-0,cache=writeback,discard=on,size=32G",
            "virtio1": "ceph:vm-100-disk-1,size=1.5T",
            "sata0": "local:100/vm-100-disk-2.qcow2,size=20G",
            "ide2": "local:iso/ubuntu-22.04.iso,media=cdrom",
            "efidisk0": "local-lvm:vm-100-disk-3,efitype=4m,size=4M",
            "unused0": "local-lvm:vm-100-disk-9",
            "net0": "virtio=AA:BB:CC:DD:EE:FF,bridge=vmbr0"
        }),
    )
    .await;

    let qemu = guest(100, GuestType::Qemu);
    let config = client.get_guest_config(&qemu).await.unwrap();
    assert!(config.entries().any(|entry| entry == ("memory", "2048")));
    assert!(config.entries().any(|entry| entry == ("cores", "4")));

    let records = disk_records(&qemu, &config);
    let slots: Vec<&str> = records.iter().map(|r| r.slot.as_str()).collect();
    assert_eq!(slots, vec!["sata0", "scsi0", "virtio1"]);

    let sata = &records[0];
    assert_eq!(sata.storage, "local");
    assert_eq!(sata.volume, "100/vm-100-disk-2.qcow2");
    assert_eq!(sata.format.as_deref(), Some("qcow2"));

    let virtio = &records[2];
    assert_eq!(virtio.storage, "ceph");
    assert_eq!(virtio.size.raw(), "1.5T");
    assert_eq!(virtio.size.bytes(), 3 * (1_u64 << 39));
}

#[tokio::test]
async fn test_lxc_config() {
    let mock_server = MockServer::start().await;
    let client = create_authenticated_client(&mock_server).await;

    mount_get(
        &mock_server,
        "/nodes/pve1/lxc/200/config",
        serde_json::json!({
            "hostname": "ct200",
            "arch": "amd64",
            "ostype": "debian",
            "rootfs": "local-zfs:subvol-200-disk-0,size=8G",
            "mp0": "local-zfs:subvol-200-disk-1,mp=/srv/data,backup=1,size=100G",
            "mp1": "/mnt/pve/share,mp=/mnt/share",
            "unprivileged": 1
        }),
    )
    .await;

    let container = guest(200, GuestType::Lxc);
    let config = client.get_guest_config(&container).await.unwrap();
    assert!(config.entries().any(|entry| entry == ("unprivileged", "1")));

    let records = disk_records(&container, &config);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].slot, "rootfs");
    assert_eq!(records[0].volume, "subvol-200-disk-0");
    assert_eq!(records[1].slot, "mp0");
    assert_eq!(records[1].size.bytes(), 100 << 30);
    assert!(records.iter().all(|r| r.guest_type == GuestType::Lxc));
}

#[tokio::test]
async fn test_config_malformed_body() {
    let mock_server = MockServer::start().await;
    let client = create_authenticated_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve1/qemu/300/config"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": ["not", "a", "map"]})),
        )
        .mount(&mock_server)
        .await;

    let result = client.get_guest_config(&guest(300, GuestType::Qemu)).await;
    assert!(matches!(result, Err(ApiError::MalformedResponse(_))));
}
