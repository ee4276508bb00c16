//! The result of one collection run.

use crate::core::domain::{
    error::ApiError,
    model::{
        cluster::ClusterNode,
        disk_record::DiskRecord,
        guest::{Guest, GuestType},
        storage::StorageStatus,
    },
};
use std::fmt;

/// What a collection warning refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningScope {
    /// A whole node was skipped.
    Node(String),
    /// One guest's configuration could not be read.
    Guest {
        node: String,
        guest_type: GuestType,
        vmid: u32,
    },
}

impl fmt::Display for WarningScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningScope::Node(node) => write!(f, "node {}", node),
            WarningScope::Guest {
                node,
                guest_type,
                vmid,
            } => write!(f, "{} {} on {}", guest_type, vmid, node),
        }
    }
}

/// A recoverable failure recorded during collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectWarning {
    pub scope: WarningScope,
    pub error: ApiError,
}

impl fmt::Display for CollectWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.scope, self.error)
    }
}

/// Everything collected in one run.
///
/// Nodes keep cluster-listing order, guests are grouped by node in that
/// order and sorted by VMID, disks follow their guest and slot order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Inventory {
    pub cluster_name: String,
    pub nodes: Vec<ClusterNode>,
    pub guests: Vec<Guest>,
    pub disks: Vec<DiskRecord>,
    pub storages: Vec<StorageStatus>,
    pub warnings: Vec<CollectWarning>,
}

impl Inventory {
    /// Names of nodes that were skipped entirely.
    pub fn failed_nodes(&self) -> impl Iterator<Item = &str> {
        self.warnings.iter().filter_map(|warning| match &warning.scope {
            WarningScope::Node(node) => Some(node.as_str()),
            WarningScope::Guest { .. } => None,
        })
    }
}
