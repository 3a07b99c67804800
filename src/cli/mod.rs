//! CLI command definitions for quadrant-tasks
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::quadrant::Quadrant;
use crate::types::{SortBy, SortOrder};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

/// Parse a `YYYY-MM-DD` due date into epoch milliseconds at local midnight.
pub fn parse_due_date(s: &str) -> Result<i64, String> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid due date '{}': {}", s, e))?;
    date.and_hms_opt(0, 0, 0)
        .and_then(|dt| dt.and_local_timezone(Local).earliest())
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| format!("due date '{}' does not exist in the local timezone", s))
}

/// Eisenhower-matrix task manager
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Owner whose tasks are read and written
    #[arg(short, long, global = true, env = "QUADRANT_TASKS_OWNER", default_value = "local")]
    pub owner: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Output format: markdown (default) or json
    #[arg(short, long, default_value = "markdown", global = true)]
    pub format: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API (default if no subcommand given)
    Serve(ServeArgs),

    /// List tasks as a matrix
    List(ListArgs),

    /// Add a task at the end of its quadrant
    Add(AddArgs),

    /// Edit task fields
    Edit(EditArgs),

    /// Move a task to another quadrant (flags only, order kept)
    Move {
        /// Task id
        task_id: String,
        /// Target quadrant: 1-4, q1-q4, quadrant-N or a name
        quadrant: Quadrant,
    },

    /// Drop one task onto another within the same quadrant
    Reorder {
        /// Task being dragged
        active_id: String,
        /// Task it is dropped on
        over_id: String,
    },

    /// Toggle a task's completion
    Toggle {
        /// Task id
        task_id: String,
    },

    /// Delete a task
    Delete {
        /// Task id
        task_id: String,
    },

    /// Renumber every quadrant densely by creation time
    Repair,
}

/// Arguments for `serve`.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Bind address (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (overrides config)
    #[arg(long)]
    pub port: Option<u16>,
}

/// Arguments for `list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive search over title and description
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only this quadrant
    #[arg(short, long)]
    pub quadrant: Option<Quadrant>,

    /// Only completed (true) or open (false) tasks
    #[arg(long)]
    pub completed: Option<bool>,

    /// Only tasks due today
    #[arg(long)]
    pub today: bool,

    /// Sort key: order, dueDate, createdAt
    #[arg(long)]
    pub sort_by: Option<SortBy>,

    /// Sort direction: asc, desc
    #[arg(long)]
    pub sort_order: Option<SortOrder>,

    /// Maximum number of tasks
    #[arg(long)]
    pub limit: Option<usize>,

    /// Number of tasks to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

/// Arguments for `add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task title
    pub title: String,

    /// Quadrant: 1-4, q1-q4, quadrant-N or a name
    #[arg(short, long, default_value = "1")]
    pub quadrant: Quadrant,

    /// Description
    #[arg(long)]
    pub description: Option<String>,

    /// Due date (YYYY-MM-DD, local time)
    #[arg(long)]
    pub due: Option<String>,

    /// List id
    #[arg(long)]
    pub list: Option<String>,
}

/// Arguments for `edit`.
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Task id
    pub task_id: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New description (empty string clears it)
    #[arg(long)]
    pub description: Option<String>,

    /// New due date (YYYY-MM-DD, empty string clears it)
    #[arg(long)]
    pub due: Option<String>,

    /// New list id (empty string clears it)
    #[arg(long)]
    pub list: Option<String>,

    /// Set the order directly (0 or greater)
    #[arg(long)]
    pub order: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move() {
        let cli = Cli::try_parse_from(["quadrant-tasks", "--owner", "alice", "move", "t1", "q3"]).unwrap();
        assert_eq!(cli.owner, "alice");
        match cli.command {
            Some(Command::Move { task_id, quadrant }) => {
                assert_eq!(task_id, "t1");
                assert_eq!(quadrant, Quadrant::Delegate);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_list_filters() {
        let cli = Cli::try_parse_from([
            "quadrant-tasks",
            "list",
            "--quadrant",
            "2",
            "--sort-by",
            "dueDate",
            "--sort-order",
            "desc",
            "--today",
        ])
        .unwrap();
        match cli.command {
            Some(Command::List(args)) => {
                assert_eq!(args.quadrant, Some(Quadrant::Schedule));
                assert_eq!(args.sort_by, Some(SortBy::DueDate));
                assert_eq!(args.sort_order, Some(SortOrder::Desc));
                assert!(args.today);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_due_date() {
        let ms = parse_due_date("2024-03-15").unwrap();
        let back = chrono::DateTime::from_timestamp_millis(ms)
            .unwrap()
            .with_timezone(&Local)
            .date_naive();
        assert_eq!(back, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(parse_due_date("15/03/2024").is_err());
    }

    #[test]
    fn test_no_subcommand_defaults() {
        let cli = Cli::try_parse_from(["quadrant-tasks"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
        assert_eq!(cli.format, "markdown");
    }
}
