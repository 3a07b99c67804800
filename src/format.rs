//! Output formatting utilities for markdown and JSON.

use crate::ordering::RepairReport;
use crate::quadrant::Quadrant;
use crate::types::Task;
use chrono::{DateTime, Local, TimeZone};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

fn format_due(due_ms: i64) -> String {
    Local
        .timestamp_millis_opt(due_ms)
        .single()
        .map(|dt: DateTime<Local>| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| due_ms.to_string())
}

/// Format a single task as markdown.
pub fn format_task_markdown(task: &Task) -> String {
    let mut md = String::new();

    md.push_str(&format!("## Task: {}\n", task.title));
    md.push_str(&format!("- **id**: `{}`\n", task.id));
    md.push_str(&format!("- **quadrant**: {}\n", task.quadrant()));
    md.push_str(&format!("- **order**: {}\n", task.order));
    md.push_str(&format!("- **completed**: {}\n", task.completed));

    if let Some(due) = task.due_date {
        md.push_str(&format!("- **due**: {}\n", format_due(due)));
    }

    if let Some(ref list_id) = task.list_id {
        md.push_str(&format!("- **list**: `{}`\n", list_id));
    }

    if let Some(ref desc) = task.description {
        md.push_str("\n### Description\n");
        md.push_str(desc);
        md.push('\n');
    }

    md
}

/// Format a task in short form for lists.
fn format_task_short(task: &Task) -> String {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let due = task
        .due_date
        .map(|d| format!(" (due {})", format_due(d)))
        .unwrap_or_default();

    format!(
        "- {} {}. {} `{}`{}\n",
        check,
        task.order,
        task.title,
        &task.id[..8.min(task.id.len())],
        due,
    )
}

/// Format tasks as a matrix: one section per quadrant, in the order given.
///
/// Callers pass tasks already sorted (see [`crate::types::sort_for_display`]);
/// grouping keeps that order within each quadrant. Empty quadrants are shown.
pub fn format_matrix_markdown(tasks: &[Task]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Tasks ({})\n\n", tasks.len()));

    for quadrant in Quadrant::ALL {
        let members: Vec<&Task> = tasks.iter().filter(|t| t.quadrant() == quadrant).collect();
        md.push_str(&format!("## {} ({})\n\n", quadrant, members.len()));
        if members.is_empty() {
            md.push_str("_empty_\n");
        }
        for task in members {
            md.push_str(&format_task_short(task));
        }
        md.push('\n');
    }

    md
}

/// Format the result of a repair pass.
pub fn format_repair_markdown(report: &RepairReport) -> String {
    let mut md = format!(
        "Repaired order values: {} of {} tasks updated\n",
        report.updated, report.scanned
    );
    if !report.failed.is_empty() {
        md.push_str(&format!("Failed ({}):\n", report.failed.len()));
        for id in &report.failed {
            md.push_str(&format!("- `{}`\n", id));
        }
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, quadrant: Quadrant, order: i64) -> Task {
        let (is_urgent, is_important) = quadrant.flags();
        Task {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            title: format!("Title {}", id),
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
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("md"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::from_str("yaml"), None);
    }

    #[test]
    fn test_matrix_groups_by_quadrant() {
        let tasks = vec![
            task("a", Quadrant::Schedule, 0),
            task("b", Quadrant::DoFirst, 0),
            task("c", Quadrant::DoFirst, 1),
        ];
        let md = format_matrix_markdown(&tasks);
        let q1 = md.find("## Q1").unwrap();
        let q2 = md.find("## Q2").unwrap();
        let b = md.find("Title b").unwrap();
        let c = md.find("Title c").unwrap();
        let a = md.find("Title a").unwrap();
        assert!(q1 < b && b < c && c < q2 && q2 < a);
        assert!(md.contains("_empty_"));
    }

    #[test]
    fn test_task_markdown_fields() {
        let mut t = task("abcdef123456", Quadrant::Eliminate, 3);
        t.description = Some("details".to_string());
        let md = format_task_markdown(&t);
        assert!(md.contains("`abcdef123456`"));
        assert!(md.contains("- **order**: 3"));
        assert!(md.contains("### Description\ndetails"));
    }

    #[test]
    fn test_repair_markdown_lists_failures() {
        let report = RepairReport {
            scanned: 4,
            updated: 2,
            failed: vec!["t1".to_string()],
        };
        let md = format_repair_markdown(&report);
        assert!(md.contains("2 of 4"));
        assert!(md.contains("`t1`"));
    }
}
