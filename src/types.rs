//! Core types for quadrant-tasks.

use crate::quadrant::{Quadrant, classify};
use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Default page size for task listings.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest `order` a direct edit may set. Integers above this lose precision
/// in JSON clients that parse numbers as doubles.
pub const MAX_ORDER: i64 = (1 << 53) - 1;

/// A task in the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_urgent: bool,
    pub is_important: bool,
    /// Rank within the owner's tasks in the same quadrant.
    pub order: i64,
    pub completed: bool,
    /// Epoch milliseconds.
    pub due_date: Option<i64>,
    pub list_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    /// Quadrant this task currently belongs to.
    pub fn quadrant(&self) -> Quadrant {
        classify(self.is_urgent, self.is_important)
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_urgent: bool,
    pub is_important: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<i64>,
    #[serde(default)]
    pub list_id: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, quadrant: Quadrant) -> Self {
        let (is_urgent, is_important) = quadrant.flags();
        Self {
            title: title.into(),
            is_urgent,
            is_important,
            ..Default::default()
        }
    }

    pub fn quadrant(&self) -> Quadrant {
        classify(self.is_urgent, self.is_important)
    }
}

/// Partial update. Only fields that are `Some` are written.
///
/// For nullable columns the inner option distinguishes "clear" (`Some(None)`)
/// from "leave alone" (`None`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_urgent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_important: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub list_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl TaskPatch {
    /// Patch that only rewrites `order`.
    pub fn order(order: i64) -> Self {
        Self {
            order: Some(order),
            ..Default::default()
        }
    }

    /// Patch that only rewrites the two quadrant flags.
    pub fn quadrant(quadrant: Quadrant) -> Self {
        let (is_urgent, is_important) = quadrant.flags();
        Self {
            is_urgent: Some(is_urgent),
            is_important: Some(is_important),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the provided fields to a task in place.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(ref description) = self.description {
            task.description = description.clone();
        }
        if let Some(is_urgent) = self.is_urgent {
            task.is_urgent = is_urgent;
        }
        if let Some(is_important) = self.is_important {
            task.is_important = is_important;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(ref list_id) = self.list_id {
            task.list_id = list_id.clone();
        }
        if let Some(order) = self.order {
            task.order = order;
        }
    }
}

/// Present-but-null deserializes to `Some(None)`; absent stays `None`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Sort key for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    Order,
    DueDate,
    CreatedAt,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "order" => Ok(SortBy::Order),
            "duedate" | "due_date" | "due-date" => Ok(SortBy::DueDate),
            "createdat" | "created_at" | "created-at" => Ok(SortBy::CreatedAt),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

/// Sort direction for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Filter and paging options for listing an owner's tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    /// Case-insensitive substring over title and description.
    pub search: Option<String>,
    pub quadrant: Option<Quadrant>,
    pub completed: Option<bool>,
    /// Only tasks due within this local-day window `[start, end]` (epoch ms).
    pub due_between: Option<(i64, i64)>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub limit: usize,
    pub offset: usize,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            search: None,
            quadrant: None,
            completed: None,
            due_between: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl TaskQuery {
    /// Whether a task passes every filter of this query.
    pub fn matches(&self, task: &Task) -> bool {
        if self.quadrant.is_some_and(|q| task.quadrant() != q) {
            return false;
        }
        if self.completed.is_some_and(|c| task.completed != c) {
            return false;
        }
        if let Some((start, end)) = self.due_between {
            match task.due_date {
                Some(due) if due >= start && due <= end => {}
                _ => return false,
            }
        }
        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&needle);
            let in_description = task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }

    /// Listing comparator: incomplete tasks first, then the requested key,
    /// then newest first as the final tie-break.
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let by_status = a.completed.cmp(&b.completed);
        if by_status != Ordering::Equal {
            return by_status;
        }
        let by_key = match self.sort_by {
            SortBy::Order => self.sort_order.apply(a.order.cmp(&b.order)),
            SortBy::CreatedAt => self.sort_order.apply(a.created_at.cmp(&b.created_at)),
            // Missing due dates sort last in either direction.
            SortBy::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => self.sort_order.apply(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        if by_key != Ordering::Equal || self.sort_by == SortBy::CreatedAt {
            return by_key;
        }
        b.created_at.cmp(&a.created_at)
    }

    /// Filter, sort and page a task set in memory.
    pub fn apply(&self, tasks: Vec<Task>) -> Vec<Task> {
        let mut selected: Vec<Task> = tasks.into_iter().filter(|t| self.matches(t)).collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}

/// Epoch-millisecond bounds `[start, end]` of the local calendar day holding `now`.
pub fn local_day_bounds(now: DateTime<Local>) -> (i64, i64) {
    let date = now.date_naive();
    let start = date
        .and_hms_opt(0, 0, 0)
        .and_then(|dt| dt.and_local_timezone(Local).earliest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| now.timestamp_millis());
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .and_then(|dt| dt.and_local_timezone(Local).latest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| now.timestamp_millis());
    (start, end)
}

/// Sort tasks the way the matrix view renders them: incomplete first, then
/// ascending `order`, then newest first.
pub fn sort_for_display(tasks: &mut [Task]) {
    let query = TaskQuery::default();
    tasks.sort_by(|a, b| query.compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, order: i64, created_at: i64) -> Task {
        Task {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            title: format!("Task {}", id),
            description: None,
            is_urgent: true,
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
    fn completed_tasks_sort_last_regardless_of_order() {
        let mut done = task("a", 0, 1);
        done.completed = true;
        let mut tasks = vec![done, task("b", 7, 2), task("c", 3, 3)];
        sort_for_display(&mut tasks);
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn equal_order_breaks_ties_newest_first() {
        let mut tasks = vec![task("old", 1, 10), task("new", 1, 20)];
        sort_for_display(&mut tasks);
        assert_eq!(tasks[0].id, "new");
    }

    #[test]
    fn due_date_sort_puts_missing_last() {
        let mut a = task("a", 0, 1);
        a.due_date = Some(500);
        let b = task("b", 1, 2);
        let mut c = task("c", 2, 3);
        c.due_date = Some(100);
        let query = TaskQuery {
            sort_by: SortBy::DueDate,
            sort_order: SortOrder::Desc,
            ..Default::default()
        };
        let ids: Vec<String> = query.apply(vec![a, b, c]).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn search_matches_title_and_description() {
        let mut t = task("x", 0, 1);
        t.description = Some("Call the Dentist".to_string());
        let query = TaskQuery {
            search: Some("dentist".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&t));
        let query = TaskQuery {
            search: Some("plumber".to_string()),
            ..Default::default()
        };
        assert!(!query.matches(&t));
    }

    #[test]
    fn quadrant_filter_uses_classifier() {
        let mut t = task("x", 0, 1);
        t.is_urgent = false;
        let schedule = TaskQuery {
            quadrant: Some(Quadrant::Schedule),
            ..Default::default()
        };
        let do_first = TaskQuery {
            quadrant: Some(Quadrant::DoFirst),
            ..Default::default()
        };
        assert!(schedule.matches(&t));
        assert!(!do_first.matches(&t));
    }

    #[test]
    fn patch_applies_only_provided_fields() {
        let mut t = task("x", 4, 1);
        let patch = TaskPatch {
            description: Some(Some("notes".to_string())),
            ..TaskPatch::quadrant(Quadrant::Eliminate)
        };
        patch.apply_to(&mut t);
        assert_eq!(t.order, 4);
        assert_eq!(t.quadrant(), Quadrant::Eliminate);
        assert_eq!(t.description.as_deref(), Some("notes"));
        assert_eq!(t.title, "Task x");
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: TaskPatch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.due_date, None);
        let patch: TaskPatch = serde_json::from_str(r#"{"order": 3}"#).unwrap();
        assert_eq!(patch, TaskPatch::order(3));
    }

    #[test]
    fn day_bounds_contain_now() {
        let now = Local::now();
        let (start, end) = local_day_bounds(now);
        assert!(start <= now.timestamp_millis());
        assert!(now.timestamp_millis() <= end);
        assert!(end - start < 25 * 60 * 60 * 1000);
    }

    #[test]
    fn paging_applies_after_sort() {
        let tasks = (0..5).map(|i| task(&i.to_string(), i, i)).collect();
        let query = TaskQuery {
            limit: 2,
            offset: 1,
            ..Default::default()
        };
        let ids: Vec<String> = query.apply(tasks).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
