//! Local `corosync.conf` reader, the fallback source of ring 0 addresses.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Default location on a Proxmox VE node.
pub const DEFAULT_COROSYNC_CONF: &str = "/etc/corosync/corosync.conf";

/// What the inventory needs from `corosync.conf`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorosyncConfig {
    pub cluster_name: Option<String>,
    /// Node name to ring 0 address.
    pub ring0: BTreeMap<String, String>,
}

impl CorosyncConfig {
    /// Parses the relevant keys of a corosync configuration.
    ///
    /// Only `cluster_name`, `name` and `ring0_addr` are read; a `ring0_addr`
    /// belongs to the closest preceding `name`.
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();
        let mut current_node: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "cluster_name" => config.cluster_name = Some(value.to_string()),
                "name" => current_node = Some(value.to_string()),
                "ring0_addr" => {
                    if let Some(node) = &current_node {
                        config.ring0.insert(node.clone(), value.to_string());
                    }
                }
                _ => {}
            }
        }

        config
    }

    /// Reads and parses the file at `path`.
    ///
    /// A missing file yields `None` silently, any other read error is logged.
    pub async fn load(path: &Path) -> Option<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Some(Self::parse(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no corosync configuration");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read corosync configuration");
                None
            }
        }
    }
}
