//! Quadrant-scoped ordering: drag-and-drop reconciliation and order repair.
//!
//! Both halves work the same way: a pure planning step computes the list of
//! [`OrderUpdate`]s from a snapshot of the owner's tasks, then [`dispatch`]
//! issues one store update per entry concurrently and waits for all of them.
//! No transaction spans the updates.

pub mod reconcile;
pub mod repair;

use crate::quadrant::Quadrant;
use crate::store::{StoreError, TaskStore};
use crate::types::{Task, TaskPatch};
use futures::future::join_all;
use serde::Serialize;

pub use reconcile::{
    MoveOutcome, ReorderOutcome, ReorderPlan, SkipReason, move_to_quadrant, plan_reorder,
    reorder_within_quadrant,
};
pub use repair::{RepairReport, plan_repair, repair_order};

/// One planned `order` rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub task_id: String,
    pub from: i64,
    pub to: i64,
}

/// Result of issuing a batch of updates.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub applied: Vec<Task>,
    pub failed: Vec<(String, StoreError)>,
}

impl DispatchReport {
    pub fn failed_ids(&self) -> Vec<String> {
        self.failed.iter().map(|(id, _)| id.clone()).collect()
    }
}

/// The owner's tasks in one quadrant, ascending by current `order`.
///
/// Ties (duplicate orders) fall back to creation time, then id, so that the
/// same snapshot always yields the same sequence.
pub fn quadrant_sequence(tasks: &[Task], quadrant: Quadrant) -> Vec<&Task> {
    let mut members: Vec<&Task> = tasks.iter().filter(|t| t.quadrant() == quadrant).collect();
    members.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then(a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    members
}

/// Number a sequence densely from zero and keep only entries whose value moves.
pub fn dense_updates<'a>(sequence: impl IntoIterator<Item = &'a Task>) -> Vec<OrderUpdate> {
    sequence
        .into_iter()
        .enumerate()
        .filter_map(|(index, task)| {
            let to = index as i64;
            (task.order != to).then(|| OrderUpdate {
                task_id: task.id.clone(),
                from: task.order,
                to,
            })
        })
        .collect()
}

/// Issue every update at once and wait for all of them.
///
/// Failures are collected, never short-circuited: every update is attempted
/// before this returns.
pub async fn dispatch<S>(store: &S, owner_id: &str, updates: &[OrderUpdate]) -> DispatchReport
where
    S: TaskStore + ?Sized,
{
    let pending = updates.iter().map(|update| async move {
        let result = store
            .update_task(&update.task_id, owner_id, TaskPatch::order(update.to))
            .await;
        (update.task_id.clone(), result)
    });

    let mut report = DispatchReport::default();
    for (task_id, result) in join_all(pending).await {
        match result {
            Ok(task) => report.applied.push(task),
            Err(err) => {
                tracing::warn!(task = %task_id, error = %err, "Order update failed");
                report.failed.push((task_id, err));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, order: i64, created_at: i64) -> Task {
        Task {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            title: id.to_string(),
            description: None,
            is_urgent: false,
            is_important: true,
            order,
            completed: false,
            due_date: None,
            list_id: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn sequence_breaks_duplicate_orders_by_creation() {
        let tasks = vec![task("late", 1, 50), task("early", 1, 10), task("first", 0, 99)];
        let ids: Vec<&str> = quadrant_sequence(&tasks, Quadrant::Schedule)
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["first", "early", "late"]);
        assert!(quadrant_sequence(&tasks, Quadrant::DoFirst).is_empty());
    }

    #[test]
    fn dense_updates_skip_unchanged() {
        let tasks = vec![task("a", 0, 1), task("b", 5, 2), task("c", 2, 3)];
        let updates = dense_updates(&tasks);
        assert_eq!(
            updates,
            vec![OrderUpdate {
                task_id: "b".into(),
                from: 5,
                to: 1,
            }]
        );
    }
}
