//! VMID and node allow-lists.

use crate::core::domain::{
    error::{InventoryError, InventoryResult},
    model::{disk_record::DiskRecord, guest::Guest, inventory::Inventory},
};
use std::collections::BTreeSet;

/// A projection over the inventory. Absent lists admit everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub vmids: Option<BTreeSet<u32>>,
    pub nodes: Option<BTreeSet<String>>,
}

impl Filter {
    /// Builds a filter from the comma separated `--vmid` and `--node` values.
    ///
    /// Blank items are ignored and a list with no items is treated as absent.
    ///
    /// # Errors
    /// `InventoryError::Argument` if a VMID is not a number.
    pub fn parse(vmids: Option<&str>, nodes: Option<&str>) -> InventoryResult<Self> {
        let vmids = vmids
            .map(|list| {
                split_list(list)
                    .map(|item| {
                        item.parse::<u32>().map_err(|_| {
                            InventoryError::Argument(format!("invalid VMID '{}'", item))
                        })
                    })
                    .collect::<InventoryResult<BTreeSet<u32>>>()
            })
            .transpose()?
            .filter(|set| !set.is_empty());

        let nodes = nodes
            .map(|list| split_list(list).map(str::to_string).collect::<BTreeSet<_>>())
            .filter(|set| !set.is_empty());

        Ok(Self { vmids, nodes })
    }

    /// Returns `true` if no list is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vmids.is_none() && self.nodes.is_none()
    }

    #[must_use]
    pub fn admits_node(&self, node: &str) -> bool {
        self.nodes.as_ref().is_none_or(|nodes| nodes.contains(node))
    }

    #[must_use]
    pub fn admits_vmid(&self, vmid: u32) -> bool {
        self.vmids.as_ref().is_none_or(|vmids| vmids.contains(&vmid))
    }

    #[must_use]
    pub fn admits_guest(&self, guest: &Guest) -> bool {
        self.admits_vmid(guest.vmid) && self.admits_node(&guest.node)
    }

    #[must_use]
    pub fn admits_record(&self, record: &DiskRecord) -> bool {
        self.admits_vmid(record.vmid) && self.admits_node(&record.node)
    }

    /// Disk records passing both lists, in inventory order.
    pub fn apply<'a>(&self, inventory: &'a Inventory) -> Vec<&'a DiskRecord> {
        inventory
            .disks
            .iter()
            .filter(|record| self.admits_record(record))
            .collect()
    }

    /// Guests passing both lists, in inventory order.
    pub fn matching_guests<'a>(&self, inventory: &'a Inventory) -> Vec<&'a Guest> {
        inventory
            .guests
            .iter()
            .filter(|guest| self.admits_guest(guest))
            .collect()
    }

    /// Human readable description for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        let join = |items: Vec<String>| items.join(",");
        match (&self.vmids, &self.nodes) {
            (None, None) => "no filter".to_string(),
            (Some(vmids), None) => {
                format!("vmid {}", join(vmids.iter().map(u32::to_string).collect()))
            }
            (None, Some(nodes)) => format!("node {}", join(nodes.iter().cloned().collect())),
            (Some(vmids), Some(nodes)) => format!(
                "vmid {} on node {}",
                join(vmids.iter().map(u32::to_string).collect()),
                join(nodes.iter().cloned().collect())
            ),
        }
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|item| !item.is_empty())
}
