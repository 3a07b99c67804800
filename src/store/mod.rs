//! Storage contract consumed by the ordering logic.
//!
//! Every call is scoped to one owner. A task that exists but belongs to a
//! different owner is reported exactly like a task that does not exist.

pub mod memory;

use crate::error::OrderError;
use crate::quadrant::Quadrant;
use crate::types::{NewTask, Task, TaskPatch, TaskQuery};
use async_trait::async_trait;
use std::sync::Arc;

pub use memory::MemoryStore;

/// Errors surfaced by a task store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No task with this id is owned by the requesting owner.
    #[error("task not found: {task_id}")]
    NotFound { task_id: String },
    /// The quadrant already holds the largest representable `order`.
    #[error("no order left after {max} in {quadrant}")]
    OrderExhausted { quadrant: Quadrant, max: i64 },
    /// The backing store failed.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn not_found(task_id: impl Into<String>) -> Self {
        StoreError::NotFound {
            task_id: task_id.into(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.into())
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { task_id } => OrderError::task_not_found(&task_id),
            StoreError::OrderExhausted { quadrant, .. } => OrderError::order_exhausted(quadrant),
            StoreError::Backend(err) => OrderError::database(err),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Owner-scoped task persistence.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks owned by `owner_id`, unfiltered, in unspecified order.
    async fn list_tasks(&self, owner_id: &str) -> StoreResult<Vec<Task>>;

    /// One task, if it exists and is owned by `owner_id`.
    async fn get_task(&self, task_id: &str, owner_id: &str) -> StoreResult<Option<Task>>;

    /// Apply only the provided fields and return the updated record.
    async fn update_task(
        &self,
        task_id: &str,
        owner_id: &str,
        patch: TaskPatch,
    ) -> StoreResult<Task>;

    /// Insert a task at the given `order`. Callers compute the placement.
    async fn create_task(&self, owner_id: &str, task: NewTask, order: i64) -> StoreResult<Task>;

    /// Remove a task. Surviving siblings keep their `order`.
    async fn delete_task(&self, task_id: &str, owner_id: &str) -> StoreResult<()>;

    /// Placement for a new task: one past the highest `order` in the owner's
    /// quadrant, or 0 when the quadrant is empty.
    async fn next_order(&self, owner_id: &str, quadrant: Quadrant) -> StoreResult<i64> {
        let tasks = self.list_tasks(owner_id).await?;
        next_order_in(&tasks, quadrant)
    }

    /// Filtered, sorted, paged listing. Stores with a query engine override this.
    async fn query_tasks(&self, owner_id: &str, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let tasks = self.list_tasks(owner_id).await?;
        Ok(query.apply(tasks))
    }
}

#[async_trait]
impl<S: TaskStore + ?Sized> TaskStore for Arc<S> {
    async fn list_tasks(&self, owner_id: &str) -> StoreResult<Vec<Task>> {
        (**self).list_tasks(owner_id).await
    }

    async fn get_task(&self, task_id: &str, owner_id: &str) -> StoreResult<Option<Task>> {
        (**self).get_task(task_id, owner_id).await
    }

    async fn update_task(
        &self,
        task_id: &str,
        owner_id: &str,
        patch: TaskPatch,
    ) -> StoreResult<Task> {
        (**self).update_task(task_id, owner_id, patch).await
    }

    async fn create_task(&self, owner_id: &str, task: NewTask, order: i64) -> StoreResult<Task> {
        (**self).create_task(owner_id, task, order).await
    }

    async fn delete_task(&self, task_id: &str, owner_id: &str) -> StoreResult<()> {
        (**self).delete_task(task_id, owner_id).await
    }

    async fn next_order(&self, owner_id: &str, quadrant: Quadrant) -> StoreResult<i64> {
        (**self).next_order(owner_id, quadrant).await
    }

    async fn query_tasks(&self, owner_id: &str, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        (**self).query_tasks(owner_id, query).await
    }
}

/// Placement after the current maximum `order` of a quadrant, or 0 when empty.
pub fn order_after(max: Option<i64>, quadrant: Quadrant) -> StoreResult<i64> {
    match max {
        None => Ok(0),
        Some(max) => max
            .checked_add(1)
            .ok_or(StoreError::OrderExhausted { quadrant, max }),
    }
}

/// Append-to-end placement computed over an already-fetched task set.
pub fn next_order_in(tasks: &[Task], quadrant: Quadrant) -> StoreResult<i64> {
    let max = tasks
        .iter()
        .filter(|t| t.quadrant() == quadrant)
        .map(|t| t.order)
        .max();
    order_after(max, quadrant)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, quadrant: Quadrant, order: i64) -> Task {
        let (is_urgent, is_important) = quadrant.flags();
        Task {
            id: id.to_string(),
            owner_id: "alice".to_string(),
            title: id.to_string(),
            description: None,
            is_urgent,
            is_important,
            order,
            completed: false,
            due_date: None,
            list_id: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn next_order_is_per_quadrant() {
        let tasks = vec![
            task("a", Quadrant::DoFirst, 3),
            task("b", Quadrant::DoFirst, 1),
            task("c", Quadrant::Schedule, 8),
        ];
        assert_eq!(next_order_in(&tasks, Quadrant::DoFirst).unwrap(), 4);
        assert_eq!(next_order_in(&tasks, Quadrant::Schedule).unwrap(), 9);
        assert_eq!(next_order_in(&tasks, Quadrant::Eliminate).unwrap(), 0);
    }

    #[test]
    fn next_order_at_i64_max_is_exhausted() {
        let tasks = vec![task("a", Quadrant::Delegate, i64::MAX)];
        let err = next_order_in(&tasks, Quadrant::Delegate).unwrap_err();
        assert!(matches!(
            err,
            StoreError::OrderExhausted {
                quadrant: Quadrant::Delegate,
                max: i64::MAX
            }
        ));
        assert_eq!(next_order_in(&tasks, Quadrant::DoFirst).unwrap(), 0);
    }
}
