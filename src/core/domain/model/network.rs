//! Domain model for node network interfaces from `/nodes/{node}/network`.

use crate::core::domain::{
    model::cluster::ExternalAddress, value_object::serde_helpers::int_bool,
};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// A network interface of a node.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NetworkInterface {
    /// Interface name (e.g. `vmbr0`).
    pub iface: String,
    #[serde(default, deserialize_with = "int_bool::deserialize")]
    pub active: bool,
    /// Address families configured on the interface (`inet`, `inet6`).
    #[serde(default)]
    pub families: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
}

fn is_private(address: &str) -> bool {
    match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => ip.is_private() || ip.is_loopback() || ip.is_link_local(),
        Ok(IpAddr::V6(ip)) => ip.is_loopback() || (ip.segments()[0] & 0xfe00) == 0xfc00,
        Err(_) => false,
    }
}

/// Picks the node's externally reachable address.
///
/// Candidates are active IPv4 interfaces with both an address and a gateway.
/// The first candidate wins unless a later one is public while it is private.
#[must_use]
pub fn select_external_address(interfaces: &[NetworkInterface]) -> Option<ExternalAddress> {
    let mut best: Option<&NetworkInterface> = None;

    for iface in interfaces {
        if !iface.active || !iface.families.iter().any(|family| family == "inet") {
            continue;
        }
        let (Some(address), Some(_)) = (&iface.address, &iface.gateway) else {
            continue;
        };
        best = match best {
            None => Some(iface),
            Some(current)
                if current.address.as_deref().is_some_and(is_private) && !is_private(address) =>
            {
                Some(iface)
            }
            keep => keep,
        };
    }

    best.and_then(|iface| {
        Some(ExternalAddress {
            address: iface.address.clone()?,
            cidr: iface.cidr.clone(),
            gateway: iface.gateway.clone(),
        })
    })
}
