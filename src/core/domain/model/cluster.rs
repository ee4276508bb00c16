//! Domain models for cluster topology.
//!
//! `/cluster/status` returns a heterogeneous list tagged by `type`: one
//! `cluster` entry (absent on a standalone node) and one `node` entry per
//! member. `/cluster/config/nodes` adds the corosync ring addresses.

use crate::core::domain::value_object::serde_helpers::int_bool;
use serde::{Deserialize, Serialize};

/// Cluster name reported when the node is not part of a cluster.
pub const STANDALONE_CLUSTER: &str = "standalone";

/// An entry of the `/cluster/status` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClusterStatusEntry {
    /// The cluster itself.
    Cluster(ClusterStatusCluster),
    /// A member node.
    Node(ClusterStatusNode),
    /// Anything else (e.g. a quorum device).
    #[serde(other)]
    Other,
}

/// The `cluster` entry of `/cluster/status`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClusterStatusCluster {
    /// Cluster name.
    pub name: String,
    /// Whether the cluster currently has quorum.
    #[serde(default, deserialize_with = "int_bool::deserialize")]
    pub quorate: bool,
    /// Corosync configuration version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

/// A `node` entry of `/cluster/status`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClusterStatusNode {
    /// Node name.
    pub name: String,
    /// Address the node name resolves to inside the cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Set on the node that answered the request.
    #[serde(default, deserialize_with = "int_bool::deserialize")]
    pub local: bool,
    /// Whether the node is currently online.
    #[serde(default, deserialize_with = "int_bool::deserialize")]
    pub online: bool,
    /// Corosync node id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodeid: Option<u32>,
}

/// An entry of `/cluster/config/nodes`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClusterConfigNode {
    /// Node name.
    pub node: String,
    /// Corosync ring 0 address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ring0_addr: Option<String>,
}

/// Role of a node relative to the API endpoint that was queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// The node serving the API.
    Local,
    /// Any other member.
    Remote,
}

/// The node's address outside the cluster network.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExternalAddress {
    pub address: String,
    pub cidr: Option<String>,
    pub gateway: Option<String>,
}

/// A member of the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterNode {
    pub name: String,
    pub role: NodeRole,
    pub online: bool,
    /// Corosync ring 0 address, when known.
    pub ring0_addr: Option<String>,
    /// Externally reachable address, only resolved for cluster info.
    pub external: Option<ExternalAddress>,
}

impl From<ClusterStatusNode> for ClusterNode {
    fn from(entry: ClusterStatusNode) -> Self {
        Self {
            name: entry.name,
            role: if entry.local {
                NodeRole::Local
            } else {
                NodeRole::Remote
            },
            online: entry.online,
            ring0_addr: entry.ip,
            external: None,
        }
    }
}

/// Cluster identity and membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterInfo {
    /// Cluster name, [`STANDALONE_CLUSTER`] for a single node.
    pub name: String,
    pub quorate: bool,
    pub version: Option<u64>,
    /// Member nodes in listing order.
    pub nodes: Vec<ClusterNode>,
}

impl ClusterInfo {
    /// Builds the cluster identity from the raw `/cluster/status` entries.
    pub fn from_status(entries: Vec<ClusterStatusEntry>) -> Self {
        let mut name = STANDALONE_CLUSTER.to_string();
        let mut quorate = true;
        let mut version = None;
        let mut nodes = Vec::new();

        for entry in entries {
            match entry {
                ClusterStatusEntry::Cluster(cluster) => {
                    name = cluster.name;
                    quorate = cluster.quorate;
                    version = cluster.version;
                }
                ClusterStatusEntry::Node(node) => nodes.push(ClusterNode::from(node)),
                ClusterStatusEntry::Other => {}
            }
        }

        Self {
            name,
            quorate,
            version,
            nodes,
        }
    }

    /// Overrides ring 0 addresses with the ones from the corosync configuration.
    pub fn apply_ring0(&mut self, ring0: &[ClusterConfigNode]) {
        for node in &mut self.nodes {
            if let Some(addr) = ring0
                .iter()
                .find(|entry| entry.node == node.name)
                .and_then(|entry| entry.ring0_addr.clone())
            {
                node.ring0_addr = Some(addr);
            }
        }
    }
}
