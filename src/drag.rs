//! Drag gesture state.
//!
//! A gesture is an explicit value threaded through the start, over and end
//! callbacks. Each step consumes the previous [`DragSession`] and returns the
//! next one; ending the gesture yields a [`DropAction`] for the reconciler.
//! The session only mirrors the client's last fetch and is never used as the
//! source of truth for a write.

use crate::quadrant::Quadrant;
use crate::types::Task;
use serde::{Deserialize, Serialize};

/// What a dragged card is hovering over or was dropped on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum DropTarget {
    /// A quadrant container (`quadrant-N`).
    Quadrant(Quadrant),
    /// Another task card.
    Task(String),
}

impl DropTarget {
    /// Interpret a droppable id: `quadrant-N` is a container, anything else a task.
    pub fn parse(id: &str) -> Self {
        match Quadrant::from_container_id(id) {
            Some(quadrant) => DropTarget::Quadrant(quadrant),
            None => DropTarget::Task(id.to_string()),
        }
    }
}

/// The write a finished gesture asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum DropAction {
    /// Dropped outside any target, or back onto itself.
    Cancelled,
    /// Dropped on a quadrant container.
    MoveToQuadrant { task_id: String, quadrant: Quadrant },
    /// Dropped on another task card.
    Reorder { active_id: String, over_id: String },
}

impl DropAction {
    /// Resolve a drop from raw ids, as delivered by a drag-end event.
    pub fn resolve(active_id: &str, over_id: Option<&str>) -> Self {
        Self::for_target(active_id.to_string(), over_id.map(DropTarget::parse))
    }

    fn for_target(active_id: String, target: Option<DropTarget>) -> Self {
        match target {
            None => DropAction::Cancelled,
            Some(DropTarget::Quadrant(quadrant)) => DropAction::MoveToQuadrant {
                task_id: active_id,
                quadrant,
            },
            Some(DropTarget::Task(over_id)) if over_id == active_id => DropAction::Cancelled,
            Some(DropTarget::Task(over_id)) => DropAction::Reorder { active_id, over_id },
        }
    }
}

/// An in-flight drag gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragSession {
    /// Copy of the dragged task, for rendering the drag overlay.
    active: Task,
    /// Last target reported by a drag-over callback.
    hovering: Option<DropTarget>,
}

impl DragSession {
    /// Begin dragging `active_id`. Returns `None` if the snapshot does not
    /// contain that task.
    pub fn start(snapshot: &[Task], active_id: &str) -> Option<Self> {
        snapshot
            .iter()
            .find(|t| t.id == active_id)
            .map(|task| DragSession {
                active: task.clone(),
                hovering: None,
            })
    }

    pub fn active(&self) -> &Task {
        &self.active
    }

    pub fn hovering(&self) -> Option<&DropTarget> {
        self.hovering.as_ref()
    }

    /// Record the current hover target.
    pub fn over(self, target: Option<DropTarget>) -> Self {
        DragSession {
            hovering: target,
            ..self
        }
    }

    /// Finish the gesture. An explicit drop target wins over the last hover.
    pub fn end(self, dropped_on: Option<DropTarget>) -> DropAction {
        DropAction::for_target(self.active.id, dropped_on.or(self.hovering))
    }

    /// Abandon the gesture (escape key, pointer cancel).
    pub fn cancel(self) -> DropAction {
        DropAction::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Vec<Task> {
        ["a", "b"]
            .iter()
            .enumerate()
            .map(|(i, id)| Task {
                id: id.to_string(),
                owner_id: "owner".to_string(),
                title: id.to_string(),
                description: None,
                is_urgent: true,
                is_important: true,
                order: i as i64,
                completed: false,
                due_date: None,
                list_id: None,
                created_at: i as i64,
                updated_at: i as i64,
            })
            .collect()
    }

    #[test]
    fn parse_distinguishes_containers_from_tasks() {
        assert_eq!(
            DropTarget::parse("quadrant-2"),
            DropTarget::Quadrant(Quadrant::Schedule)
        );
        assert_eq!(DropTarget::parse("b"), DropTarget::Task("b".to_string()));
    }

    #[test]
    fn start_requires_task_in_snapshot() {
        assert!(DragSession::start(&snapshot(), "zzz").is_none());
        let session = DragSession::start(&snapshot(), "a").unwrap();
        assert_eq!(session.active().id, "a");
        assert!(session.hovering().is_none());
    }

    #[test]
    fn end_falls_back_to_last_hover() {
        let session = DragSession::start(&snapshot(), "a")
            .unwrap()
            .over(Some(DropTarget::parse("quadrant-4")));
        assert_eq!(
            session.end(None),
            DropAction::MoveToQuadrant {
                task_id: "a".to_string(),
                quadrant: Quadrant::Eliminate
            }
        );
    }

    #[test]
    fn explicit_drop_wins_and_self_drop_cancels() {
        let session = DragSession::start(&snapshot(), "a")
            .unwrap()
            .over(Some(DropTarget::parse("quadrant-4")));
        assert_eq!(
            session.clone().end(Some(DropTarget::parse("b"))),
            DropAction::Reorder {
                active_id: "a".to_string(),
                over_id: "b".to_string()
            }
        );
        assert_eq!(session.end(Some(DropTarget::parse("a"))), DropAction::Cancelled);
    }

    #[test]
    fn resolve_from_raw_ids() {
        assert_eq!(DropAction::resolve("a", None), DropAction::Cancelled);
        assert_eq!(
            DropAction::resolve("a", Some("quadrant-1")),
            DropAction::MoveToQuadrant {
                task_id: "a".to_string(),
                quadrant: Quadrant::DoFirst
            }
        );
        assert_eq!(
            DropAction::resolve("a", Some("b")),
            DropAction::Reorder {
                active_id: "a".to_string(),
                over_id: "b".to_string()
            }
        );
    }
}
