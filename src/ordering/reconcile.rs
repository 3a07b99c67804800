//! Drag-and-drop reconciliation.
//!
//! Two gestures exist. Dropping a task on a quadrant container rewrites the
//! task's flags and nothing else. Dropping a task on another task in the same
//! quadrant splices it into that position and renumbers the quadrant densely,
//! writing only the rows whose rank actually changed.
//!
//! A container drop keeps the task's old `order`, which may collide with a
//! task already in the destination quadrant. That collision is left for
//! [`super::repair_order`] to clean up.

use super::{OrderUpdate, dense_updates, dispatch, quadrant_sequence};
use crate::error::{OrderError, OrderResult};
use crate::quadrant::Quadrant;
use crate::store::TaskStore;
use crate::types::{Task, TaskPatch};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Why a reorder did nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum SkipReason {
    /// The task was dropped on itself.
    SameTask,
    /// The dragged task or the drop target is gone from the owner's task set.
    TaskMissing { task_id: String },
}

/// Planned effect of a same-quadrant drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderPlan {
    Apply {
        quadrant: Quadrant,
        updates: Vec<OrderUpdate>,
    },
    Skip(SkipReason),
}

/// Result of a same-quadrant reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReorderOutcome {
    Applied {
        quadrant: Quadrant,
        updates: Vec<OrderUpdate>,
    },
    Skipped(SkipReason),
}

/// Result of a quadrant-container drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "task", rename_all = "camelCase")]
pub enum MoveOutcome {
    /// Flags were rewritten.
    Moved(Task),
    /// The task already lived in the target quadrant; nothing was written.
    Unchanged(Task),
}

impl MoveOutcome {
    pub fn task(&self) -> &Task {
        match self {
            MoveOutcome::Moved(task) | MoveOutcome::Unchanged(task) => task,
        }
    }
}

/// Compute the updates for dropping `active_id` onto `over_id`.
///
/// Missing tasks and self-drops are soft skips. Tasks in different quadrants
/// are rejected with [`crate::error::ErrorCode::UnsupportedReorder`].
pub fn plan_reorder(tasks: &[Task], active_id: &str, over_id: &str) -> OrderResult<ReorderPlan> {
    if active_id == over_id {
        return Ok(ReorderPlan::Skip(SkipReason::SameTask));
    }

    let find = |id: &str| tasks.iter().find(|t| t.id == id);
    let Some(active) = find(active_id) else {
        return Ok(ReorderPlan::Skip(SkipReason::TaskMissing {
            task_id: active_id.to_string(),
        }));
    };
    let Some(over) = find(over_id) else {
        return Ok(ReorderPlan::Skip(SkipReason::TaskMissing {
            task_id: over_id.to_string(),
        }));
    };

    let quadrant = active.quadrant();
    if over.quadrant() != quadrant {
        return Err(OrderError::unsupported_reorder(quadrant, over.quadrant()));
    }

    let mut sequence = quadrant_sequence(tasks, quadrant);
    let from = sequence.iter().position(|t| t.id == active_id);
    let to = sequence.iter().position(|t| t.id == over_id);
    let (Some(from), Some(to)) = (from, to) else {
        // Both were found above and share the quadrant, so this is unreachable
        // unless ids are duplicated in the snapshot.
        return Ok(ReorderPlan::Skip(SkipReason::TaskMissing {
            task_id: active_id.to_string(),
        }));
    };

    let moved = sequence.remove(from);
    sequence.insert(to, moved);

    Ok(ReorderPlan::Apply {
        quadrant,
        updates: dense_updates(sequence),
    })
}

/// Drop `active_id` onto `over_id` within one quadrant.
///
/// Every planned update is issued concurrently and awaited before returning.
/// If any of them fails the whole operation fails with `PartialWrite`; the
/// updates that did land are not rolled back.
pub async fn reorder_within_quadrant<S>(
    store: &S,
    owner_id: &str,
    active_id: &str,
    over_id: &str,
) -> OrderResult<ReorderOutcome>
where
    S: TaskStore + ?Sized,
{
    let tasks = store.list_tasks(owner_id).await?;

    let (quadrant, updates) = match plan_reorder(&tasks, active_id, over_id)? {
        ReorderPlan::Apply { quadrant, updates } => (quadrant, updates),
        ReorderPlan::Skip(reason) => {
            warn!(owner = %owner_id, active = %active_id, over = %over_id, ?reason, "Reorder skipped");
            return Ok(ReorderOutcome::Skipped(reason));
        }
    };

    debug!(owner = %owner_id, %quadrant, updates = updates.len(), "Dispatching reorder");
    let report = dispatch(store, owner_id, &updates).await;
    if !report.failed.is_empty() {
        return Err(OrderError::partial_write(updates.len(), &report.failed_ids()));
    }

    info!(owner = %owner_id, %quadrant, updated = updates.len(), "Tasks reordered");
    Ok(ReorderOutcome::Applied { quadrant, updates })
}

/// Drop a task onto a quadrant container: rewrite its flags, keep its order.
pub async fn move_to_quadrant<S>(
    store: &S,
    owner_id: &str,
    task_id: &str,
    target: Quadrant,
) -> OrderResult<MoveOutcome>
where
    S: TaskStore + ?Sized,
{
    let task = store
        .get_task(task_id, owner_id)
        .await?
        .ok_or_else(|| OrderError::task_not_found(task_id))?;

    if task.quadrant() == target {
        debug!(owner = %owner_id, task = %task_id, %target, "Task already in quadrant");
        return Ok(MoveOutcome::Unchanged(task));
    }

    let from = task.quadrant();
    let moved = store
        .update_task(task_id, owner_id, TaskPatch::quadrant(target))
        .await?;

    info!(owner = %owner_id, task = %task_id, %from, to = %target, order = moved.order, "Task moved to quadrant");
    Ok(MoveOutcome::Moved(moved))
}
