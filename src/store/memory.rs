//! In-memory task store.

use super::{StoreError, StoreResult, TaskStore};
use crate::db::now_ms;
use crate::types::{NewTask, Task, TaskPatch};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Task store backed by a map in process memory.
///
/// Useful for tests and for embedding the ordering logic without SQLite.
#[derive(Default)]
pub struct MemoryStore {
    tasks: Mutex<BTreeMap<String, Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with fully-formed tasks, keeping their ids and orders.
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let store = Self::new();
        {
            let mut map = store.tasks.lock().unwrap();
            for task in tasks {
                map.insert(task.id.clone(), task);
            }
        }
        store
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self, owner_id: &str) -> StoreResult<Vec<Task>> {
        let map = self.tasks.lock().unwrap();
        Ok(map
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_task(&self, task_id: &str, owner_id: &str) -> StoreResult<Option<Task>> {
        let map = self.tasks.lock().unwrap();
        Ok(map
            .get(task_id)
            .filter(|t| t.owner_id == owner_id)
            .cloned())
    }

    async fn update_task(
        &self,
        task_id: &str,
        owner_id: &str,
        patch: TaskPatch,
    ) -> StoreResult<Task> {
        let mut map = self.tasks.lock().unwrap();
        let task = map
            .get_mut(task_id)
            .filter(|t| t.owner_id == owner_id)
            .ok_or_else(|| StoreError::not_found(task_id))?;
        patch.apply_to(task);
        task.updated_at = now_ms();
        Ok(task.clone())
    }

    async fn create_task(&self, owner_id: &str, new: NewTask, order: i64) -> StoreResult<Task> {
        let now = now_ms();
        let task = Task {
            id: Uuid::now_v7().to_string(),
            owner_id: owner_id.to_string(),
            title: new.title,
            description: new.description,
            is_urgent: new.is_urgent,
            is_important: new.is_important,
            order,
            completed: new.completed,
            due_date: new.due_date,
            list_id: new.list_id,
            created_at: now,
            updated_at: now,
        };
        self.tasks
            .lock()
            .unwrap()
            .insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn delete_task(&self, task_id: &str, owner_id: &str) -> StoreResult<()> {
        let mut map = self.tasks.lock().unwrap();
        match map.get(task_id) {
            Some(task) if task.owner_id == owner_id => {
                map.remove(task_id);
                Ok(())
            }
            _ => Err(StoreError::not_found(task_id)),
        }
    }
}
