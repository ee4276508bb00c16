//! Settings of a single inventory run.

use crate::core::application::filter::Filter;
use std::path::PathBuf;

/// Upper bound of the adaptive worker pool.
pub const MAX_DEFAULT_WORKERS: usize = 8;

/// What the run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// One row per disk.
    #[default]
    Disks,
    TotalPerVm,
    TotalPerNode,
    VmPerStorage,
    ListNodes,
    ListVmids,
    ListStorages,
    ClusterInfo,
}

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// How rows are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// Suppress the header line (table and CSV).
    pub no_header: bool,
    /// Human readable sizes in table mode.
    pub human: bool,
    /// CSV field separator.
    pub delimiter: char,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            no_header: false,
            human: false,
            delimiter: ',',
        }
    }
}

/// Everything the pipeline needs besides the API client.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub view: View,
    pub filter: Filter,
    pub output: RenderOptions,
    /// Explicit worker count, adaptive when `None`.
    pub workers: Option<usize>,
    /// Local corosync configuration consulted by the cluster-info view.
    pub corosync_conf: Option<PathBuf>,
}

/// Number of concurrent tasks for a phase with `tasks` work items.
///
/// An explicit value wins; otherwise `min(8, tasks)`. Never below 1.
#[must_use]
pub fn effective_workers(requested: Option<usize>, tasks: usize) -> usize {
    requested
        .unwrap_or_else(|| tasks.min(MAX_DEFAULT_WORKERS))
        .max(1)
}
