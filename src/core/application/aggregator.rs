//! Builds the rows of each view from a collected inventory.

use crate::core::{
    application::{
        config::View,
        filter::Filter,
        render::{Cell, RowSet},
    },
    domain::model::{disk_record::DiskRecord, inventory::Inventory},
};
use std::collections::HashMap;

pub const DISK_COLUMNS: [&str; 10] = [
    "cluster", "node", "vmid", "vmname", "type", "storage", "vmdisk", "format", "size", "size_mb",
];
pub const TOTAL_PER_VM_COLUMNS: [&str; 5] = ["cluster", "node", "vmid", "vmname", "total_size_mb"];
pub const TOTAL_PER_NODE_COLUMNS: [&str; 3] = ["cluster", "node", "total_size_mb"];
pub const VM_PER_STORAGE_COLUMNS: [&str; 6] =
    ["cluster", "node", "vmid", "vmname", "storage", "size_mb"];
pub const LIST_NODES_COLUMNS: [&str; 4] = ["cluster", "node", "online", "ring0_addr"];
pub const LIST_VMIDS_COLUMNS: [&str; 5] = ["cluster", "node", "vmid", "type", "vmname"];
pub const LIST_STORAGES_COLUMNS: [&str; 9] = [
    "cluster",
    "node",
    "storage",
    "type",
    "total_mb",
    "used_mb",
    "available_mb",
    "used_pct",
    "available_pct",
];
pub const CLUSTER_INFO_COLUMNS: [&str; 6] = [
    "cluster",
    "node",
    "cluster_ip",
    "external_ip",
    "external_cidr",
    "external_gw",
];

/// Rows of `view` over the part of `inventory` admitted by `filter`.
pub fn build(view: View, inventory: &Inventory, filter: &Filter) -> RowSet {
    match view {
        View::Disks => disks(inventory, &filter.apply(inventory)),
        View::TotalPerVm => total_per_vm(inventory, &filter.apply(inventory)),
        View::TotalPerNode => total_per_node(inventory, &filter.apply(inventory)),
        View::VmPerStorage => vm_per_storage(inventory, &filter.apply(inventory)),
        View::ListNodes => list_nodes(inventory, filter),
        View::ListVmids => list_vmids(inventory, filter),
        View::ListStorages => list_storages(inventory, filter),
        View::ClusterInfo => cluster_info(inventory, filter),
    }
}

/// Sum of all record sizes in bytes.
pub fn grand_total(records: &[&DiskRecord]) -> u64 {
    records
        .iter()
        .fold(0, |total: u64, record| total.saturating_add(record.size.bytes()))
}

/// Groups records by `key` in order of first appearance, summing sizes.
fn group_by<'a, K, F>(records: &[&'a DiskRecord], key: F) -> Vec<(&'a DiskRecord, u64)>
where
    K: Eq + std::hash::Hash,
    F: Fn(&'a DiskRecord) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(&DiskRecord, u64)> = Vec::new();
    for &record in records {
        let slot = *index.entry(key(record)).or_insert_with(|| {
            groups.push((record, 0));
            groups.len() - 1
        });
        groups[slot].1 = groups[slot].1.saturating_add(record.size.bytes());
    }
    groups
}

fn disks(inventory: &Inventory, records: &[&DiskRecord]) -> RowSet {
    let mut rows = RowSet::new(&DISK_COLUMNS);
    for record in records {
        rows.push(vec![
            inventory.cluster_name.as_str().into(),
            record.node.as_str().into(),
            Cell::Integer(record.vmid.into()),
            record.guest_name().into(),
            record.guest_type.as_str().into(),
            record.storage.as_str().into(),
            record.volume.as_str().into(),
            Cell::optional(record.format.as_deref()),
            record.size.raw().into(),
            Cell::Size(record.size.bytes()),
        ]);
    }
    rows
}

fn total_per_vm(inventory: &Inventory, records: &[&DiskRecord]) -> RowSet {
    let mut rows = RowSet::new(&TOTAL_PER_VM_COLUMNS);
    for (record, total) in group_by(records, |record| record.vmid) {
        rows.push(vec![
            inventory.cluster_name.as_str().into(),
            record.node.as_str().into(),
            Cell::Integer(record.vmid.into()),
            record.guest_name().into(),
            Cell::Size(total),
        ]);
    }
    rows
}

fn total_per_node(inventory: &Inventory, records: &[&DiskRecord]) -> RowSet {
    let mut rows = RowSet::new(&TOTAL_PER_NODE_COLUMNS);
    for (record, total) in group_by(records, |record| record.node.as_str()) {
        rows.push(vec![
            inventory.cluster_name.as_str().into(),
            record.node.as_str().into(),
            Cell::Size(total),
        ]);
    }
    rows
}

fn vm_per_storage(inventory: &Inventory, records: &[&DiskRecord]) -> RowSet {
    let mut groups = group_by(records, |record| (record.vmid, record.storage.as_str()));
    // guests keep their order, storages of one guest are sorted by name
    let vm_order: HashMap<u32, usize> = group_by(records, |record| record.vmid)
        .iter()
        .enumerate()
        .map(|(position, (record, _))| (record.vmid, position))
        .collect();
    groups.sort_by(|(a, _), (b, _)| {
        vm_order[&a.vmid]
            .cmp(&vm_order[&b.vmid])
            .then_with(|| a.storage.cmp(&b.storage))
    });

    let mut rows = RowSet::new(&VM_PER_STORAGE_COLUMNS);
    for (record, total) in groups {
        rows.push(vec![
            inventory.cluster_name.as_str().into(),
            record.node.as_str().into(),
            Cell::Integer(record.vmid.into()),
            record.guest_name().into(),
            record.storage.as_str().into(),
            Cell::Size(total),
        ]);
    }
    rows
}

fn list_nodes(inventory: &Inventory, filter: &Filter) -> RowSet {
    let mut rows = RowSet::new(&LIST_NODES_COLUMNS);
    for node in inventory.nodes.iter().filter(|node| filter.admits_node(&node.name)) {
        rows.push(vec![
            inventory.cluster_name.as_str().into(),
            node.name.as_str().into(),
            Cell::Flag(node.online),
            Cell::optional(node.ring0_addr.as_deref()),
        ]);
    }
    rows
}

fn list_vmids(inventory: &Inventory, filter: &Filter) -> RowSet {
    let mut rows = RowSet::new(&LIST_VMIDS_COLUMNS);
    for guest in filter.matching_guests(inventory) {
        rows.push(vec![
            inventory.cluster_name.as_str().into(),
            guest.node.as_str().into(),
            Cell::Integer(guest.vmid.into()),
            guest.guest_type.as_str().into(),
            guest.display_name().into(),
        ]);
    }
    rows
}

fn list_storages(inventory: &Inventory, filter: &Filter) -> RowSet {
    let mut rows = RowSet::new(&LIST_STORAGES_COLUMNS);
    for storage in inventory
        .storages
        .iter()
        .filter(|storage| filter.admits_node(&storage.node))
    {
        let (used_pct, available_pct) = storage.usage_percent();
        rows.push(vec![
            inventory.cluster_name.as_str().into(),
            storage.node.as_str().into(),
            storage.storage.as_str().into(),
            storage.storage_type.as_str().into(),
            Cell::Size(storage.total),
            Cell::Size(storage.used),
            Cell::Size(storage.available),
            Cell::Percent(used_pct),
            Cell::Percent(available_pct),
        ]);
    }
    rows
}

fn cluster_info(inventory: &Inventory, filter: &Filter) -> RowSet {
    let mut rows = RowSet::new(&CLUSTER_INFO_COLUMNS);
    for node in inventory.nodes.iter().filter(|node| filter.admits_node(&node.name)) {
        let external = node.external.as_ref();
        rows.push(vec![
            inventory.cluster_name.as_str().into(),
            node.name.as_str().into(),
            Cell::optional(node.ring0_addr.as_deref()),
            Cell::optional(external.map(|e| e.address.as_str())),
            Cell::optional(external.and_then(|e| e.cidr.as_deref())),
            Cell::optional(external.and_then(|e| e.gateway.as_deref())),
        ]);
    }
    rows
}
