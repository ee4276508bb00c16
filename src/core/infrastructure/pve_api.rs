//! Read-only Proxmox VE queries used by the inventory collector.

use crate::core::{
    domain::{
        error::ApiResult,
        model::{
            cluster::{ClusterConfigNode, ClusterInfo, ClusterNode, ClusterStatusEntry},
            guest::{Guest, GuestConfig, GuestListItem, GuestType},
            network::NetworkInterface,
            storage::{StorageListItem, StorageStatus},
        },
    },
    infrastructure::api_client::ApiClient,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

/// The API surface the collector depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PveApi: Send + Sync {
    /// Cluster members in listing order.
    async fn list_nodes(&self) -> ApiResult<Vec<ClusterNode>>;

    /// QEMU and LXC guests of one node, ascending by VMID.
    async fn list_guests(&self, node: &str) -> ApiResult<Vec<Guest>>;

    async fn get_guest_config(&self, guest: &Guest) -> ApiResult<GuestConfig>;

    async fn get_storage_status(&self, node: &str) -> ApiResult<Vec<StorageStatus>>;

    /// Cluster identity with ring 0 addresses from the corosync node list when readable.
    async fn get_cluster_info(&self) -> ApiResult<ClusterInfo>;

    async fn get_node_network(&self, node: &str) -> ApiResult<Vec<NetworkInterface>>;
}

#[async_trait]
impl PveApi for ApiClient {
    async fn list_nodes(&self) -> ApiResult<Vec<ClusterNode>> {
        let entries: Vec<ClusterStatusEntry> = self.get("/cluster/status").await?;
        Ok(ClusterInfo::from_status(entries).nodes)
    }

    async fn list_guests(&self, node: &str) -> ApiResult<Vec<Guest>> {
        let mut guests = Vec::new();
        for guest_type in [GuestType::Qemu, GuestType::Lxc] {
            let items: Vec<GuestListItem> = self
                .get(&format!("/nodes/{}/{}", node, guest_type.as_str()))
                .await?;
            guests.extend(
                items
                    .into_iter()
                    .map(|item| Guest::from_list_item(node, guest_type, item)),
            );
        }
        guests.sort_by_key(|guest| guest.vmid);
        Ok(guests)
    }

    async fn get_guest_config(&self, guest: &Guest) -> ApiResult<GuestConfig> {
        let raw: BTreeMap<String, serde_json::Value> = self
            .get(&format!(
                "/nodes/{}/{}/{}/config",
                guest.node,
                guest.guest_type.as_str(),
                guest.vmid
            ))
            .await?;
        Ok(GuestConfig::from_json(raw))
    }

    async fn get_storage_status(&self, node: &str) -> ApiResult<Vec<StorageStatus>> {
        let items: Vec<StorageListItem> = self.get(&format!("/nodes/{}/storage", node)).await?;
        Ok(items
            .into_iter()
            .map(|item| StorageStatus::from_list_item(node, item))
            .collect())
    }

    async fn get_cluster_info(&self) -> ApiResult<ClusterInfo> {
        let entries: Vec<ClusterStatusEntry> = self.get("/cluster/status").await?;
        let mut info = ClusterInfo::from_status(entries);

        match self
            .get::<Vec<ClusterConfigNode>>("/cluster/config/nodes")
            .await
        {
            Ok(ring0) => info.apply_ring0(&ring0),
            Err(e) => debug!(error = %e, "corosync node list unavailable, keeping status addresses"),
        }

        Ok(info)
    }

    async fn get_node_network(&self, node: &str) -> ApiResult<Vec<NetworkInterface>> {
        self.get(&format!("/nodes/{}/network", node)).await
    }
}
