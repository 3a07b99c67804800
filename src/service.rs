//! Owner-scoped task operations shared by the HTTP API and the CLI.

use crate::drag::DropAction;
use crate::error::{OrderError, OrderResult};
use crate::ordering::{self, MoveOutcome, RepairReport, ReorderOutcome};
use crate::quadrant::Quadrant;
use crate::store::TaskStore;
use crate::types::{MAX_ORDER, NewTask, Task, TaskPatch, TaskQuery, sort_for_display};
use serde::Serialize;
use tracing::{debug, info};

/// Result of applying a finished drag gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "camelCase")]
pub enum DropOutcome {
    Cancelled,
    Moved(MoveOutcome),
    Reordered(ReorderOutcome),
}

/// Task operations over any [`TaskStore`].
pub struct TaskService<S> {
    store: S,
}

fn require_owner(owner_id: &str) -> OrderResult<()> {
    if owner_id.trim().is_empty() {
        return Err(OrderError::missing_owner());
    }
    Ok(())
}

impl<S: TaskStore> TaskService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a task at the end of its quadrant.
    pub async fn create(&self, owner_id: &str, new: NewTask) -> OrderResult<Task> {
        require_owner(owner_id)?;
        if new.title.trim().is_empty() {
            return Err(OrderError::missing_field("title"));
        }

        let quadrant = new.quadrant();
        let order = self.store.next_order(owner_id, quadrant).await?;
        let task = self.store.create_task(owner_id, new, order).await?;

        info!(owner = %owner_id, task = %task.id, %quadrant, order, "Task created");
        Ok(task)
    }

    /// Filtered listing.
    pub async fn list(&self, owner_id: &str, query: &TaskQuery) -> OrderResult<Vec<Task>> {
        require_owner(owner_id)?;
        Ok(self.store.query_tasks(owner_id, query).await?)
    }

    /// Every task of the owner in matrix display order.
    pub async fn ordered(&self, owner_id: &str) -> OrderResult<Vec<Task>> {
        require_owner(owner_id)?;
        let mut tasks = self.store.list_tasks(owner_id).await?;
        sort_for_display(&mut tasks);
        Ok(tasks)
    }

    pub async fn get(&self, owner_id: &str, task_id: &str) -> OrderResult<Task> {
        require_owner(owner_id)?;
        self.store
            .get_task(task_id, owner_id)
            .await?
            .ok_or_else(|| OrderError::task_not_found(task_id))
    }

    /// Direct edit. Changing the flags here moves the task between quadrants
    /// without touching `order`, same as a container drop.
    pub async fn update(&self, owner_id: &str, task_id: &str, patch: TaskPatch) -> OrderResult<Task> {
        require_owner(owner_id)?;
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(OrderError::invalid_value("title", "title must not be empty"));
        }
        if let Some(order) = patch.order {
            if order < 0 {
                return Err(OrderError::invalid_value("order", "order must not be negative"));
            }
            if order > MAX_ORDER {
                return Err(OrderError::invalid_value(
                    "order",
                    &format!("order must not exceed {}", MAX_ORDER),
                ));
            }
        }
        let task = self.store.update_task(task_id, owner_id, patch).await?;
        debug!(owner = %owner_id, task = %task_id, "Task updated");
        Ok(task)
    }

    /// Flip the completion flag.
    pub async fn toggle_complete(&self, owner_id: &str, task_id: &str) -> OrderResult<Task> {
        let current = self.get(owner_id, task_id).await?;
        let patch = TaskPatch {
            completed: Some(!current.completed),
            ..Default::default()
        };
        Ok(self.store.update_task(task_id, owner_id, patch).await?)
    }

    /// Delete a task. Siblings keep their `order`; gaps stay until a repair.
    pub async fn delete(&self, owner_id: &str, task_id: &str) -> OrderResult<()> {
        require_owner(owner_id)?;
        self.store.delete_task(task_id, owner_id).await?;
        info!(owner = %owner_id, task = %task_id, "Task deleted");
        Ok(())
    }

    pub async fn move_to_quadrant(
        &self,
        owner_id: &str,
        task_id: &str,
        quadrant: Quadrant,
    ) -> OrderResult<MoveOutcome> {
        require_owner(owner_id)?;
        ordering::move_to_quadrant(&self.store, owner_id, task_id, quadrant).await
    }

    pub async fn reorder(
        &self,
        owner_id: &str,
        active_id: &str,
        over_id: &str,
    ) -> OrderResult<ReorderOutcome> {
        require_owner(owner_id)?;
        ordering::reorder_within_quadrant(&self.store, owner_id, active_id, over_id).await
    }

    /// Apply the action produced by the end of a drag gesture.
    pub async fn apply_drop(&self, owner_id: &str, action: DropAction) -> OrderResult<DropOutcome> {
        match action {
            DropAction::Cancelled => Ok(DropOutcome::Cancelled),
            DropAction::MoveToQuadrant { task_id, quadrant } => self
                .move_to_quadrant(owner_id, &task_id, quadrant)
                .await
                .map(DropOutcome::Moved),
            DropAction::Reorder { active_id, over_id } => self
                .reorder(owner_id, &active_id, &over_id)
                .await
                .map(DropOutcome::Reordered),
        }
    }

    /// Renumber every quadrant of the owner densely by creation time.
    pub async fn repair(&self, owner_id: &str) -> OrderResult<RepairReport> {
        require_owner(owner_id)?;
        ordering::repair_order(&self.store, owner_id).await
    }
}
