//! Domain model for storage pools from the `/nodes/{node}/storage` endpoint.

use crate::core::domain::value_object::serde_helpers::int_bool;
use serde::{Deserialize, Serialize};

/// An item of `/nodes/{node}/storage`.
///
/// Inactive storages report no capacity; missing numbers default to 0.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageListItem {
    /// Storage identifier (e.g. `local`, `ceph-rbd`).
    pub storage: String,
    /// Storage plugin type (e.g. `dir`, `zfspool`, `lvmthin`, `rbd`).
    #[serde(rename = "type", default)]
    pub storage_type: String,
    /// Total capacity in bytes.
    #[serde(default)]
    pub total: u64,
    /// Used space in bytes.
    #[serde(default)]
    pub used: u64,
    /// Available space in bytes.
    #[serde(default)]
    pub avail: u64,
    #[serde(default, deserialize_with = "int_bool::deserialize")]
    pub active: bool,
    #[serde(default = "enabled_by_default", deserialize_with = "int_bool::deserialize")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "int_bool::deserialize")]
    pub shared: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Capacity of one storage pool as seen from one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStatus {
    pub node: String,
    pub storage: String,
    pub storage_type: String,
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub active: bool,
    pub enabled: bool,
    pub shared: bool,
}

impl StorageStatus {
    /// Creates a status entry for `node` from a listing item.
    pub fn from_list_item(node: &str, item: StorageListItem) -> Self {
        Self {
            node: node.to_string(),
            storage: item.storage,
            storage_type: item.storage_type,
            total: item.total,
            used: item.used,
            available: item.avail,
            active: item.active,
            enabled: item.enabled,
            shared: item.shared,
        }
    }

    /// Used and available space in percent of the total.
    ///
    /// Both values lie in `[0, 100]` and never sum above 100; a storage
    /// reporting no capacity yields `(0.0, 0.0)`.
    #[must_use]
    pub fn usage_percent(&self) -> (f64, f64) {
        if self.total == 0 {
            return (0.0, 0.0);
        }
        let percent = |part: u64| (part as f64 * 100.0 / self.total as f64).clamp(0.0, 100.0);
        let used = percent(self.used);
        let available = percent(self.available).min(100.0 - used);
        (used, available)
    }
}
