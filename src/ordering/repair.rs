//! Order repair pass.
//!
//! Renumbers one owner's whole task set so that every quadrant holds the dense
//! sequence `0..n`. Tasks are ranked by creation time, never by their current
//! `order`, so the result does not depend on how damaged the input is.

use super::{OrderUpdate, dense_updates, dispatch};
use crate::error::OrderResult;
use crate::quadrant::Quadrant;
use crate::store::TaskStore;
use crate::types::Task;
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of a repair pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    /// Tasks inspected.
    pub scanned: usize,
    /// Tasks whose `order` was rewritten.
    pub updated: usize,
    /// Tasks whose rewrite failed; they keep their previous `order`.
    pub failed: Vec<String>,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Compute the updates that make every quadrant dense, ranked by `created_at`.
pub fn plan_repair(tasks: &[Task]) -> Vec<OrderUpdate> {
    let mut updates = Vec::new();
    for quadrant in Quadrant::ALL {
        let mut members: Vec<&Task> = tasks.iter().filter(|t| t.quadrant() == quadrant).collect();
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        updates.extend(dense_updates(members));
    }
    updates
}

/// Repair one owner's `order` values.
///
/// Only fetching the task set can fail the pass. Individual update failures
/// are reported in [`RepairReport::failed`] and the caller decides whether to
/// run the pass again.
pub async fn repair_order<S>(store: &S, owner_id: &str) -> OrderResult<RepairReport>
where
    S: TaskStore + ?Sized,
{
    let tasks = store.list_tasks(owner_id).await?;
    let updates = plan_repair(&tasks);

    if updates.is_empty() {
        info!(owner = %owner_id, scanned = tasks.len(), "Order values already consistent");
        return Ok(RepairReport {
            scanned: tasks.len(),
            ..Default::default()
        });
    }

    let report = dispatch(store, owner_id, &updates).await;
    let failed = report.failed_ids();
    if failed.is_empty() {
        info!(owner = %owner_id, scanned = tasks.len(), updated = report.applied.len(), "Order values repaired");
    } else {
        warn!(
            owner = %owner_id,
            updated = report.applied.len(),
            failed = failed.len(),
            "Order repair finished with failures"
        );
    }

    Ok(RepairReport {
        scanned: tasks.len(),
        updated: report.applied.len(),
        failed,
    })
}
