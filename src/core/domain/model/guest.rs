//! Domain models for guests (QEMU virtual machines and LXC containers).

use crate::core::domain::value_object::serde_helpers::vmid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The kind of guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestType {
    /// A QEMU/KVM virtual machine.
    Qemu,
    /// An LXC container.
    Lxc,
}

impl GuestType {
    /// Path segment used by the API (`/nodes/{node}/{qemu|lxc}`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GuestType::Qemu => "qemu",
            GuestType::Lxc => "lxc",
        }
    }
}

impl fmt::Display for GuestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An item of `/nodes/{node}/qemu` or `/nodes/{node}/lxc`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GuestListItem {
    /// The guest identifier (number for QEMU, sometimes a string for LXC).
    #[serde(deserialize_with = "vmid::deserialize")]
    pub vmid: u32,
    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A guest as seen by the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Guest {
    pub vmid: u32,
    pub guest_type: GuestType,
    /// Node the guest is currently assigned to.
    pub node: String,
    pub name: Option<String>,
}

impl Guest {
    /// Creates a guest from a node listing entry.
    pub fn from_list_item(node: &str, guest_type: GuestType, item: GuestListItem) -> Self {
        Self {
            vmid: item.vmid,
            guest_type,
            node: node.to_string(),
            name: item.name.filter(|name| !name.is_empty()),
        }
    }

    /// Display name, empty when the guest has none.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// A guest configuration from `/nodes/{node}/{qemu|lxc}/{vmid}/config`.
///
/// Values are kept as strings. The collector only inspects disk slots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuestConfig(BTreeMap<String, String>);

impl GuestConfig {
    /// Builds a configuration from the raw JSON object returned by the API.
    pub fn from_json(raw: BTreeMap<String, serde_json::Value>) -> Self {
        Self(
            raw.into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        serde_json::Value::String(text) => text,
                        other => other.to_string(),
                    };
                    (key, value)
                })
                .collect(),
        )
    }

    /// Iterates over all `(key, value)` entries.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for GuestConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
