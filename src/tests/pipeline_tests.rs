use crate::{
    Filter, InventoryError, OutputFormat, PveApi, RenderOptions, RunConfig, View, run,
    tests::support::{create_authenticated_client, mount_get, mount_pve01_dataset},
};
use serde_json::Value;
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn config(view: View, format: OutputFormat) -> RunConfig {
    RunConfig {
        view,
        output: RenderOptions {
            format,
            ..Default::default()
        },
        workers: Some(2),
        ..Default::default()
    }
}

async fn run_against(mock_server: &MockServer, config: &RunConfig) -> Result<String, InventoryError> {
    let client = create_authenticated_client(mock_server).await;
    let api: Arc<dyn PveApi> = Arc::new(client);
    run(api, config).await
}

fn json_rows(output: &str) -> Vec<Value> {
    match serde_json::from_str(output).unwrap() {
        Value::Array(rows) => rows,
        other => panic!("expected an array, got {}", other),
    }
}

#[tokio::test]
async fn test_total_per_vm_json() {
    let mock_server = MockServer::start().await;
    mount_pve01_dataset(&mock_server).await;

    let output = run_against(&mock_server, &config(View::TotalPerVm, OutputFormat::Json))
        .await
        .unwrap();
    let rows = json_rows(&output);
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0]["cluster"], "lab");
    assert_eq!(rows[0]["vmid"], 100);
    assert_eq!(rows[0]["vmname"], "web01");
    assert_eq!(rows[0]["total_size_mb"], 15360);
    assert_eq!(rows[1]["vmid"], 101);
    assert_eq!(rows[1]["total_size_mb"], 8192);

    let keys: Vec<&str> = rows[0]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["cluster", "node", "vmid", "vmname", "total_size_mb"]);
}

#[tokio::test]
async fn test_total_per_node() {
    let mock_server = MockServer::start().await;
    mount_pve01_dataset(&mock_server).await;

    let output = run_against(&mock_server, &config(View::TotalPerNode, OutputFormat::Json))
        .await
        .unwrap();
    let rows = json_rows(&output);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["node"], "pve01");
    assert_eq!(rows[0]["total_size_mb"], 23552);
}

#[tokio::test]
async fn test_filter_without_match() {
    let mock_server = MockServer::start().await;
    mount_pve01_dataset(&mock_server).await;

    let mut config = config(View::Disks, OutputFormat::Table);
    config.filter = Filter::parse(Some("100"), Some("pve02")).unwrap();

    let error = run_against(&mock_server, &config).await.unwrap_err();
    assert!(matches!(error, InventoryError::EmptyResult(_)));
    assert_eq!(error.exit_code(), 3);
}

#[tokio::test]
async fn test_csv_without_header() {
    let mock_server = MockServer::start().await;
    mount_pve01_dataset(&mock_server).await;

    let mut config = config(View::Disks, OutputFormat::Csv);
    config.output.no_header = true;

    let output = run_against(&mock_server, &config).await.unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "lab,pve01,100,web01,qemu,local-lvm,vm-100-disk-0,,10G,10240"
    );
    assert!(lines.iter().all(|line| !line.contains("cdrom") && !line.contains("iso")));
}

#[tokio::test]
async fn test_formats_agree() {
    let mock_server = MockServer::start().await;
    mount_pve01_dataset(&mock_server).await;

    let mut csv_config = config(View::Disks, OutputFormat::Csv);
    csv_config.output.delimiter = ';';
    let csv = run_against(&mock_server, &csv_config).await.unwrap();
    let json = run_against(&mock_server, &config(View::Disks, OutputFormat::Json))
        .await
        .unwrap();
    let table = run_against(&mock_server, &config(View::Disks, OutputFormat::Table))
        .await
        .unwrap();

    let from_csv: Vec<(String, String, String)> = csv
        .lines()
        .skip(1)
        .map(|line| {
            let fields: Vec<&str> = line.split(';').collect();
            (fields[2].to_string(), fields[6].to_string(), fields[8].to_string())
        })
        .collect();
    let from_json: Vec<(String, String, String)> = json_rows(&json)
        .iter()
        .map(|row| {
            (
                row["vmid"].to_string(),
                row["vmdisk"].as_str().unwrap().to_string(),
                row["size"].as_str().unwrap().to_string(),
            )
        })
        .collect();

    assert_eq!(from_csv, from_json);
    assert_eq!(
        from_csv,
        vec![
            ("100".to_string(), "vm-100-disk-0".to_string(), "10G".to_string()),
            ("100".to_string(), "vm-100-disk-1".to_string(), "5G".to_string()),
            ("101".to_string(), "vm-101-disk-0".to_string(), "8G".to_string()),
        ]
    );

    let table_lines: Vec<&str> = table.lines().collect();
    assert_eq!(table_lines.len(), 2 + from_csv.len());
    assert!(table_lines[1].chars().all(|c| c == '-' || c == ' '));
    for ((vmid, volume, size), line) in from_csv.iter().zip(&table_lines[2..]) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(fields[2], vmid);
        assert!(fields.contains(&volume.as_str()));
        assert!(fields.contains(&size.as_str()));
    }
}

#[tokio::test]
async fn test_list_storages_percentages() {
    let mock_server = MockServer::start().await;
    mount_pve01_dataset(&mock_server).await;

    let output = run_against(&mock_server, &config(View::ListStorages, OutputFormat::Json))
        .await
        .unwrap();
    let rows = json_rows(&output);
    assert_eq!(rows.len(), 6);

    for row in &rows {
        let used = row["used_pct"].as_f64().unwrap();
        let available = row["available_pct"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&used));
        assert!((0.0..=100.0).contains(&available));
        assert!(used + available <= 100.0);
    }

    let local = rows.iter().find(|row| row["storage"] == "local").unwrap();
    assert_eq!(local["used_pct"].as_f64(), Some(25.0));
    assert_eq!(local["available_pct"].as_f64(), Some(75.0));

    let nfs = rows.iter().find(|row| row["storage"] == "nfs-backup").unwrap();
    assert_eq!(nfs["total_mb"], 0);
    assert_eq!(nfs["used_pct"].as_f64(), Some(0.0));
    assert_eq!(nfs["available_pct"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_list_nodes_ring0() {
    let mock_server = MockServer::start().await;
    mount_pve01_dataset(&mock_server).await;

    let mut config = config(View::ListNodes, OutputFormat::Csv);
    config.filter = Filter::parse(None, Some("pve02")).unwrap();

    let output = run_against(&mock_server, &config).await.unwrap();
    assert_eq!(output, "cluster,node,online,ring0_addr\nlab,pve02,true,10.10.10.12\n");
}

#[tokio::test]
async fn test_partial_node_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve02/qemu"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_pve01_dataset(&mock_server).await;

    let output = run_against(&mock_server, &config(View::TotalPerVm, OutputFormat::Json))
        .await
        .unwrap();
    let rows = json_rows(&output);
    let vmids: Vec<u64> = rows.iter().filter_map(|row| row["vmid"].as_u64()).collect();
    assert_eq!(vmids, vec![100, 101]);
}

#[tokio::test]
async fn test_all_guest_configs_failed() {
    let mock_server = MockServer::start().await;
    for config_path in [
        "/api2/json/nodes/pve01/qemu/100/config",
        "/api2/json/nodes/pve01/lxc/101/config",
    ] {
        Mock::given(method("GET"))
            .and(path(config_path))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .mount(&mock_server)
            .await;
    }
    mount_pve01_dataset(&mock_server).await;

    let error = run_against(&mock_server, &config(View::TotalPerVm, OutputFormat::Json))
        .await
        .unwrap_err();
    assert!(matches!(error, InventoryError::Collection(_)));
    assert_eq!(error.exit_code(), 1);
}

#[tokio::test]
async fn test_empty_cluster_without_filter() {
    let mock_server = MockServer::start().await;
    mount_get(
        &mock_server,
        "/cluster/status",
        serde_json::json!([
            {"type": "node", "id": "node/pve", "name": "pve", "ip": "10.0.0.5", "local": 1, "online": 1}
        ]),
    )
    .await;
    mount_get(&mock_server, "/nodes/pve/qemu", serde_json::json!([])).await;
    mount_get(&mock_server, "/nodes/pve/lxc", serde_json::json!([])).await;
    mount_get(&mock_server, "/nodes/pve/storage", serde_json::json!([])).await;

    let output = run_against(&mock_server, &config(View::Disks, OutputFormat::Json))
        .await
        .unwrap();
    assert_eq!(output.trim(), "[]");
}
