//! Task CRUD and the SQLite implementation of [`TaskStore`].

use super::{Database, FOLD_CASE_FN, now_ms};
use crate::quadrant::Quadrant;
use crate::store::{StoreError, StoreResult, TaskStore, order_after};
use crate::types::{NewTask, SortBy, SortOrder, Task, TaskPatch, TaskQuery};
use anyhow::Result;
use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, Row, params, params_from_iter};
use uuid::Uuid;

/// Build an ORDER BY clause from the query's sort settings.
/// Incomplete tasks always come first; newest first breaks remaining ties.
fn build_order_clause(sort_by: SortBy, sort_order: SortOrder) -> String {
    let dir = match sort_order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };

    match sort_by {
        SortBy::Order => format!("completed ASC, \"order\" {}, created_at DESC", dir),
        SortBy::DueDate => format!(
            "completed ASC, due_date IS NULL, due_date {}, created_at DESC",
            dir
        ),
        SortBy::CreatedAt => format!("completed ASC, created_at {}", dir),
    }
}

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        is_urgent: row.get("is_urgent")?,
        is_important: row.get("is_important")?,
        order: row.get("order")?,
        completed: row.get("completed")?,
        due_date: row.get("due_date")?,
        list_id: row.get("list_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get an owned task using an existing connection.
fn get_task_internal(conn: &Connection, task_id: &str, owner_id: &str) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1 AND owner_id = ?2")?;

    let result = stmt.query_row(params![task_id, owner_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Insert a task at an explicit `order`.
    pub fn insert_task(&self, owner_id: &str, new: NewTask, order: i64) -> Result<Task> {
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

        self.insert_task_record(&task)?;
        Ok(task)
    }

    /// Insert a fully-formed task, keeping its id, order and timestamps.
    /// Used to seed fixtures.
    pub fn insert_task_record(&self, task: &Task) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, owner_id, title, description, is_urgent, is_important,
                    \"order\", completed, due_date, list_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    task.id,
                    task.owner_id,
                    task.title,
                    task.description,
                    task.is_urgent,
                    task.is_important,
                    task.order,
                    task.completed,
                    task.due_date,
                    task.list_id,
                    task.created_at,
                    task.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Get a task if it exists and belongs to the owner.
    pub fn load_task(&self, task_id: &str, owner_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id, owner_id))
    }

    /// All tasks of one owner, in creation order.
    pub fn load_tasks(&self, owner_id: &str) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM tasks WHERE owner_id = ?1 ORDER BY created_at, id")?;
            let tasks = stmt
                .query_map(params![owner_id], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Apply a patch. Returns `None` when the owner has no such task.
    pub fn patch_task(&self, task_id: &str, owner_id: &str, patch: &TaskPatch) -> Result<Option<Task>> {
        let now = now_ms();

        self.with_conn(|conn| {
            let Some(mut task) = get_task_internal(conn, task_id, owner_id)? else {
                return Ok(None);
            };

            patch.apply_to(&mut task);
            task.updated_at = now;

            conn.execute(
                "UPDATE tasks SET title = ?1, description = ?2, is_urgent = ?3, is_important = ?4,
                    \"order\" = ?5, completed = ?6, due_date = ?7, list_id = ?8, updated_at = ?9
                 WHERE id = ?10 AND owner_id = ?11",
                params![
                    task.title,
                    task.description,
                    task.is_urgent,
                    task.is_important,
                    task.order,
                    task.completed,
                    task.due_date,
                    task.list_id,
                    task.updated_at,
                    task_id,
                    owner_id,
                ],
            )?;

            Ok(Some(task))
        })
    }

    /// Delete a task. Returns false when the owner has no such task.
    pub fn remove_task(&self, task_id: &str, owner_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM tasks WHERE id = ?1 AND owner_id = ?2",
                params![task_id, owner_id],
            )?;
            Ok(deleted > 0)
        })
    }

    /// Highest order in the owner's quadrant, `None` when it is empty.
    pub fn max_order_for(&self, owner_id: &str, quadrant: Quadrant) -> Result<Option<i64>> {
        let (is_urgent, is_important) = quadrant.flags();
        self.with_conn(|conn| {
            let max: Option<i64> = conn.query_row(
                "SELECT MAX(\"order\") FROM tasks
                 WHERE owner_id = ?1 AND is_urgent = ?2 AND is_important = ?3",
                params![owner_id, is_urgent, is_important],
                |row| row.get(0),
            )?;
            Ok(max)
        })
    }

    /// Filtered, sorted, paged listing in SQL.
    pub fn select_tasks(&self, owner_id: &str, query: &TaskQuery) -> Result<Vec<Task>> {
        let mut sql = String::from("SELECT * FROM tasks WHERE owner_id = ?");
        let mut values: Vec<SqlValue> = vec![SqlValue::Text(owner_id.to_string())];

        if let Some(quadrant) = query.quadrant {
            let (is_urgent, is_important) = quadrant.flags();
            sql.push_str(" AND is_urgent = ? AND is_important = ?");
            values.push(SqlValue::Integer(is_urgent as i64));
            values.push(SqlValue::Integer(is_important as i64));
        }

        if let Some(completed) = query.completed {
            sql.push_str(" AND completed = ?");
            values.push(SqlValue::Integer(completed as i64));
        }

        if let Some((start, end)) = query.due_between {
            sql.push_str(" AND due_date IS NOT NULL AND due_date >= ? AND due_date <= ?");
            values.push(SqlValue::Integer(start));
            values.push(SqlValue::Integer(end));
        }

        if let Some(ref search) = query.search {
            let needle = search.to_lowercase();
            sql.push_str(&format!(
                " AND (instr({f}(title), ?) > 0 OR instr({f}(COALESCE(description, '')), ?) > 0)",
                f = FOLD_CASE_FN
            ));
            values.push(SqlValue::Text(needle.clone()));
            values.push(SqlValue::Text(needle));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(&build_order_clause(query.sort_by, query.sort_order));
        sql.push_str(" LIMIT ? OFFSET ?");
        values.push(SqlValue::Integer(query.limit as i64));
        values.push(SqlValue::Integer(query.offset as i64));

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_from_iter(values.iter()), parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }
}

/// Run a blocking database call off the async executor.
async fn blocking<F, T>(f: F) -> StoreResult<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Backend(e.into()))?
        .map_err(StoreError::Backend)
}

#[async_trait]
impl TaskStore for Database {
    async fn list_tasks(&self, owner_id: &str) -> StoreResult<Vec<Task>> {
        let db = self.clone();
        let owner_id = owner_id.to_string();
        blocking(move || db.load_tasks(&owner_id)).await
    }

    async fn get_task(&self, task_id: &str, owner_id: &str) -> StoreResult<Option<Task>> {
        let db = self.clone();
        let (task_id, owner_id) = (task_id.to_string(), owner_id.to_string());
        blocking(move || db.load_task(&task_id, &owner_id)).await
    }

    async fn update_task(
        &self,
        task_id: &str,
        owner_id: &str,
        patch: TaskPatch,
    ) -> StoreResult<Task> {
        let db = self.clone();
        let (id, owner_id) = (task_id.to_string(), owner_id.to_string());
        blocking(move || db.patch_task(&id, &owner_id, &patch))
            .await?
            .ok_or_else(|| StoreError::not_found(task_id))
    }

    async fn create_task(&self, owner_id: &str, task: NewTask, order: i64) -> StoreResult<Task> {
        let db = self.clone();
        let owner_id = owner_id.to_string();
        blocking(move || db.insert_task(&owner_id, task, order)).await
    }

    async fn delete_task(&self, task_id: &str, owner_id: &str) -> StoreResult<()> {
        let db = self.clone();
        let (id, owner_id) = (task_id.to_string(), owner_id.to_string());
        if blocking(move || db.remove_task(&id, &owner_id)).await? {
            Ok(())
        } else {
            Err(StoreError::not_found(task_id))
        }
    }

    async fn next_order(&self, owner_id: &str, quadrant: Quadrant) -> StoreResult<i64> {
        let db = self.clone();
        let owner_id = owner_id.to_string();
        let max = blocking(move || db.max_order_for(&owner_id, quadrant)).await?;
        order_after(max, quadrant)
    }

    async fn query_tasks(&self, owner_id: &str, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let db = self.clone();
        let owner_id = owner_id.to_string();
        let query = query.clone();
        blocking(move || db.select_tasks(&owner_id, &query)).await
    }
}
