//! Collect, filter, aggregate and render in one call.

use crate::core::{
    application::{
        aggregator,
        collector::{CollectPlan, Collector},
        config::RunConfig,
        render::render,
    },
    domain::error::{InventoryError, InventoryResult},
    infrastructure::pve_api::PveApi,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Runs one inventory and returns the rendered output.
///
/// Per-node and per-guest failures are logged and do not fail the run.
///
/// # Errors
/// Fatal collection failures, or `InventoryError::EmptyResult` when a filter
/// is set and nothing matched it.
pub async fn run(api: Arc<dyn PveApi>, config: &RunConfig) -> InventoryResult<String> {
    let inventory = Collector::new(api)
        .with_workers(config.workers)
        .with_corosync_conf(config.corosync_conf.clone())
        .collect(CollectPlan::for_view(config.view), &config.filter)
        .await?;

    if !inventory.warnings.is_empty() {
        warn!(
            warnings = inventory.warnings.len(),
            "inventory is incomplete"
        );
    }

    let rows = aggregator::build(config.view, &inventory, &config.filter);
    info!(view = ?config.view, rows = rows.rows.len(), "rendering");

    if rows.is_empty() && !config.filter.is_empty() {
        return Err(InventoryError::EmptyResult(config.filter.describe()));
    }

    render(&rows, &config.output)
}
