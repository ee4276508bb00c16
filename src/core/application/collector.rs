//! Inventory collection: bounded parallel fan-out over nodes and guests.

use crate::core::{
    application::{
        config::{View, effective_workers},
        filter::Filter,
    },
    domain::{
        error::{ApiError, ApiResult, InventoryError, InventoryResult},
        model::{
            cluster::{ClusterNode, STANDALONE_CLUSTER},
            disk_record::{DiskRecord, compare_slots, is_disk_slot},
            guest::{Guest, GuestConfig},
            inventory::{CollectWarning, Inventory, WarningScope},
            network::{NetworkInterface, select_external_address},
            storage::StorageStatus,
        },
    },
    infrastructure::{corosync::CorosyncConfig, pve_api::PveApi},
};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

/// Which fetches a view needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectPlan {
    /// Guest lists per node.
    pub guests: bool,
    /// Guest configurations parsed into disk records.
    pub disks: bool,
    /// Storage status per node.
    pub storages: bool,
    /// Network interfaces per node.
    pub networks: bool,
}

impl CollectPlan {
    pub fn for_view(view: View) -> Self {
        match view {
            View::Disks | View::TotalPerVm | View::TotalPerNode | View::VmPerStorage => Self {
                guests: true,
                disks: true,
                storages: true,
                networks: false,
            },
            View::ListNodes => Self::default(),
            View::ListVmids => Self {
                guests: true,
                ..Self::default()
            },
            View::ListStorages => Self {
                storages: true,
                ..Self::default()
            },
            View::ClusterInfo => Self {
                networks: true,
                ..Self::default()
            },
        }
    }

    fn needs_nodes(&self) -> bool {
        self.guests || self.storages
    }
}

/// Runs `task` over `items` with at most `workers` tasks in flight.
///
/// Slot `i` holds the result for `items[i]`; a panicked task leaves its
/// slot empty.
pub(crate) async fn fan_out<I, T, F, Fut>(items: Vec<I>, workers: usize, task: F) -> Vec<Option<T>>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(items.len()).collect();
    let mut join_set = JoinSet::new();
    let workers = workers.max(1);

    for (index, item) in items.into_iter().enumerate() {
        if join_set.len() >= workers {
            if let Some(joined) = join_set.join_next().await {
                store(&mut slots, joined);
            }
        }
        let future = task(item);
        join_set.spawn(async move { (index, future.await) });
    }

    while let Some(joined) = join_set.join_next().await {
        store(&mut slots, joined);
    }

    slots
}

fn store<T>(slots: &mut [Option<T>], joined: Result<(usize, T), JoinError>) {
    match joined {
        Ok((index, value)) => slots[index] = Some(value),
        Err(e) => warn!(error = %e, "worker task failed"),
    }
}

fn aborted() -> ApiError {
    ApiError::Unreachable("worker task aborted".to_string())
}

struct NodeFetch {
    guests: Option<ApiResult<Vec<Guest>>>,
    storages: Option<ApiResult<Vec<StorageStatus>>>,
}

/// Gathers an [`Inventory`] through a [`PveApi`].
pub struct Collector {
    api: Arc<dyn PveApi>,
    workers: Option<usize>,
    corosync_conf: Option<PathBuf>,
}

impl Collector {
    pub fn new(api: Arc<dyn PveApi>) -> Self {
        Self {
            api,
            workers: None,
            corosync_conf: None,
        }
    }

    /// Fixes the worker pool size instead of the adaptive default.
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    /// Local corosync configuration used to complete cluster info.
    pub fn with_corosync_conf(mut self, path: Option<PathBuf>) -> Self {
        self.corosync_conf = path;
        self
    }

    /// Collects what `plan` asks for.
    ///
    /// Guests and nodes excluded by `filter` are not fetched; the filter
    /// must still be applied to the result.
    ///
    /// # Errors
    /// `InventoryError::Collection` if the cluster cannot be listed or every
    /// targeted node failed.
    pub async fn collect(&self, plan: CollectPlan, filter: &Filter) -> InventoryResult<Inventory> {
        let cluster = self
            .api
            .get_cluster_info()
            .await
            .map_err(|e| InventoryError::Collection(format!("cannot list cluster nodes: {}", e)))?;
        info!(
            cluster = %cluster.name,
            nodes = cluster.nodes.len(),
            quorate = cluster.quorate,
            "cluster listed"
        );

        let mut inventory = Inventory {
            cluster_name: cluster.name,
            nodes: cluster.nodes,
            ..Default::default()
        };

        if plan.needs_nodes() {
            self.collect_nodes(plan, filter, &mut inventory).await?;
        }
        if plan.networks {
            self.collect_networks(filter, &mut inventory).await;
            self.complete_from_corosync(&mut inventory).await;
        }

        Ok(inventory)
    }

    async fn collect_nodes(
        &self,
        plan: CollectPlan,
        filter: &Filter,
        inventory: &mut Inventory,
    ) -> InventoryResult<()> {
        let mut targets = Vec::new();
        for node in inventory.nodes.iter().filter(|node| filter.admits_node(&node.name)) {
            if node.online {
                targets.push(node.name.clone());
            } else {
                warn!(node = %node.name, "node is offline, skipping");
                inventory.warnings.push(CollectWarning {
                    scope: WarningScope::Node(node.name.clone()),
                    error: ApiError::Unreachable("node is offline".to_string()),
                });
            }
        }
        let skipped_offline = inventory.warnings.len();

        let workers = effective_workers(self.workers, targets.len());
        info!(nodes = targets.len(), workers, "fetching node data");

        let api = Arc::clone(&self.api);
        let fetched = fan_out(targets.clone(), workers, move |node| {
            let api = Arc::clone(&api);
            async move {
                let (guests, storages) = tokio::join!(
                    async {
                        if plan.guests {
                            Some(api.list_guests(&node).await)
                        } else {
                            None
                        }
                    },
                    async {
                        if plan.storages {
                            Some(api.get_storage_status(&node).await)
                        } else {
                            None
                        }
                    }
                );
                NodeFetch { guests, storages }
            }
        })
        .await;

        let mut storage_names: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (node, slot) in targets.iter().zip(fetched) {
            let NodeFetch { guests, storages } = slot.unwrap_or_else(|| NodeFetch {
                guests: plan.guests.then(|| Err(aborted())),
                storages: plan.storages.then(|| Err(aborted())),
            });

            let storages = match storages {
                Some(Ok(storages)) => Some(storages),
                Some(Err(e)) if plan.disks => {
                    warn!(node = %node, error = %e, "storage status unavailable, disks are not checked against it");
                    None
                }
                Some(Err(e)) => {
                    self.node_failed(inventory, node, e);
                    continue;
                }
                None => None,
            };

            let mut guests = match guests {
                Some(Ok(guests)) => guests,
                Some(Err(e)) => {
                    self.node_failed(inventory, node, e);
                    continue;
                }
                None => Vec::new(),
            };

            if let Some(mut storages) = storages {
                storages.sort_by(|a, b| a.storage.cmp(&b.storage));
                storage_names.insert(
                    node.clone(),
                    storages.iter().map(|s| s.storage.clone()).collect(),
                );
                inventory.storages.extend(storages);
            }
            guests.sort_by_key(|guest| guest.vmid);
            inventory.guests.extend(guests);
        }

        let failed = inventory.warnings.len() - skipped_offline;
        if !targets.is_empty() && failed == targets.len() {
            return Err(InventoryError::Collection(format!(
                "all {} nodes failed",
                targets.len()
            )));
        }

        if plan.disks {
            self.collect_disks(filter, &storage_names, inventory).await?;
        }

        Ok(())
    }

    fn node_failed(&self, inventory: &mut Inventory, node: &str, error: ApiError) {
        warn!(node = %node, error = %error, "skipping node");
        inventory.warnings.push(CollectWarning {
            scope: WarningScope::Node(node.to_string()),
            error,
        });
    }

    async fn collect_disks(
        &self,
        filter: &Filter,
        storage_names: &HashMap<String, BTreeSet<String>>,
        inventory: &mut Inventory,
    ) -> InventoryResult<()> {
        let targets: Vec<Guest> = filter
            .matching_guests(inventory)
            .into_iter()
            .cloned()
            .collect();
        let workers = effective_workers(self.workers, targets.len());
        info!(guests = targets.len(), workers, "fetching guest configurations");

        let api = Arc::clone(&self.api);
        let configs = fan_out(targets.clone(), workers, move |guest| {
            let api = Arc::clone(&api);
            async move { api.get_guest_config(&guest).await }
        })
        .await;

        let mut fetched = 0;
        for (guest, config) in targets.iter().zip(configs) {
            match config.unwrap_or_else(|| Err(aborted())) {
                Ok(config) => {
                    fetched += 1;
                    let records = disk_records(guest, &config);
                    let known = storage_names.get(&guest.node);
                    inventory.disks.extend(records.into_iter().filter(|record| {
                        let exists = known.is_none_or(|names| names.contains(&record.storage));
                        if !exists {
                            warn!(
                                vmid = record.vmid,
                                slot = %record.slot,
                                storage = %record.storage,
                                node = %record.node,
                                "disk references a storage unknown to its node, dropping"
                            );
                        }
                        exists
                    }));
                }
                Err(e) => {
                    warn!(vmid = guest.vmid, node = %guest.node, error = %e, "cannot read guest configuration");
                    inventory.warnings.push(CollectWarning {
                        scope: WarningScope::Guest {
                            node: guest.node.clone(),
                            guest_type: guest.guest_type,
                            vmid: guest.vmid,
                        },
                        error: e,
                    });
                }
            }
        }

        if !targets.is_empty() && fetched == 0 {
            return Err(InventoryError::Collection(format!(
                "all {} guest configurations failed",
                targets.len()
            )));
        }
        Ok(())
    }

    async fn collect_networks(&self, filter: &Filter, inventory: &mut Inventory) {
        let targets: Vec<String> = inventory
            .nodes
            .iter()
            .filter(|node| filter.admits_node(&node.name))
            .map(|node| node.name.clone())
            .collect();
        let workers = effective_workers(self.workers, targets.len());
        info!(nodes = targets.len(), workers, "fetching node networks");

        let api = Arc::clone(&self.api);
        let networks = fan_out(targets.clone(), workers, move |node| {
            let api = Arc::clone(&api);
            async move { api.get_node_network(&node).await }
        })
        .await;

        for (name, network) in targets.iter().zip(networks) {
            let interfaces: Vec<NetworkInterface> = match network.unwrap_or_else(|| Err(aborted())) {
                Ok(interfaces) => interfaces,
                Err(e) => {
                    warn!(node = %name, error = %e, "cannot read network configuration");
                    inventory.warnings.push(CollectWarning {
                        scope: WarningScope::Node(name.clone()),
                        error: e,
                    });
                    continue;
                }
            };
            if let Some(node) = inventory.nodes.iter_mut().find(|node| &node.name == name) {
                node.external = select_external_address(&interfaces);
            }
        }
    }

    /// Fills gaps left by the API from the local corosync configuration.
    async fn complete_from_corosync(&self, inventory: &mut Inventory) {
        let corosync = match &self.corosync_conf {
            Some(path) => CorosyncConfig::load(path).await,
            None => None,
        };

        if let Some(corosync) = corosync {
            if inventory.cluster_name == STANDALONE_CLUSTER {
                if let Some(name) = corosync.cluster_name {
                    inventory.cluster_name = name;
                }
            }
            for node in &mut inventory.nodes {
                if node.ring0_addr.is_none() {
                    node.ring0_addr = corosync.ring0.get(&node.name).cloned();
                }
            }
        }

        for node in &mut inventory.nodes {
            fill_ring0_from_external(node);
        }
    }
}

fn fill_ring0_from_external(node: &mut ClusterNode) {
    if node.ring0_addr.is_none() {
        node.ring0_addr = node.external.as_ref().map(|ext| ext.address.clone());
    }
}

/// Parses the disk slots of one guest configuration, in slot order.
///
/// Entries that are not storage backed disks are skipped.
pub fn disk_records(guest: &Guest, config: &GuestConfig) -> Vec<DiskRecord> {
    let mut records: Vec<DiskRecord> = config
        .entries()
        .filter(|(key, _)| is_disk_slot(guest.guest_type, key))
        .filter_map(|(key, value)| match DiskRecord::parse(guest, key, value) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(vmid = guest.vmid, slot = key, reason = %e, "not a disk");
                None
            }
        })
        .collect();
    records.sort_by(|a, b| compare_slots(&a.slot, &b.slot));
    records
}
