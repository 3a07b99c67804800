//! quadrant-tasks
//!
//! Eisenhower-matrix task manager: HTTP API and command-line client over a
//! local SQLite database.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use quadrant_tasks::cli::{AddArgs, Cli, Command, EditArgs, ListArgs, ServeArgs, parse_due_date};
use quadrant_tasks::config::Config;
use quadrant_tasks::db::Database;
use quadrant_tasks::format::{
    OutputFormat, format_matrix_markdown, format_repair_markdown, format_task_markdown,
};
use quadrant_tasks::logging::{LogTarget, init_logging};
use quadrant_tasks::ordering::{MoveOutcome, ReorderOutcome};
use quadrant_tasks::server::{AppState, start_server};
use quadrant_tasks::service::TaskService;
use quadrant_tasks::store::TaskStore;
use quadrant_tasks::types::{NewTask, TaskPatch, TaskQuery, local_day_bounds};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

type Service = TaskService<Arc<dyn TaskStore>>;

/// Print a serializable value as JSON, or the markdown rendering.
fn emit<T: Serialize>(format: OutputFormat, value: &T, markdown: impl FnOnce() -> String) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Markdown => print!("{}", markdown()),
    }
    Ok(())
}

/// Empty string clears a nullable field.
fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| if v.is_empty() { None } else { Some(v) })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let target: LogTarget = cli.log.parse()?;
    init_logging(&target, cli.verbose)?;

    let format = OutputFormat::from_str(&cli.format)
        .ok_or_else(|| anyhow::anyhow!("unknown output format: {}", cli.format))?;

    let mut config = Config::resolve(cli.config.as_deref().map(Path::new))?;
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    config.ensure_db_dir()?;

    let db = Database::open(&config.server.db_path)?;
    info!(path = %config.server.db_path.display(), "Database opened");
    let store: Arc<dyn TaskStore> = Arc::new(db);
    let service = Arc::new(TaskService::new(store));

    let owner = cli.owner.as_str();

    match cli.command {
        Some(Command::Serve(args)) => run_server(config, service, args).await?,
        None => run_server(config, service, ServeArgs::default()).await?,
        Some(Command::List(args)) => run_list(&config, &service, owner, args, format).await?,
        Some(Command::Add(args)) => run_add(&service, owner, args, format).await?,
        Some(Command::Edit(args)) => run_edit(&service, owner, args, format).await?,
        Some(Command::Move { task_id, quadrant }) => {
            let outcome = service.move_to_quadrant(owner, &task_id, quadrant).await?;
            emit(format, &outcome, || match &outcome {
                MoveOutcome::Moved(task) => {
                    format!("Moved to {}\n\n{}", quadrant, format_task_markdown(task))
                }
                MoveOutcome::Unchanged(task) => format!("Already in {}: {}\n", quadrant, task.title),
            })?;
        }
        Some(Command::Reorder { active_id, over_id }) => {
            let outcome = service.reorder(owner, &active_id, &over_id).await?;
            emit(format, &outcome, || match &outcome {
                ReorderOutcome::Applied { quadrant, updates } => {
                    format!("Reordered {}: {} tasks updated\n", quadrant, updates.len())
                }
                ReorderOutcome::Skipped(reason) => format!("Nothing to do: {:?}\n", reason),
            })?;
        }
        Some(Command::Toggle { task_id }) => {
            let task = service.toggle_complete(owner, &task_id).await?;
            emit(format, &task, || format_task_markdown(&task))?;
        }
        Some(Command::Delete { task_id }) => {
            service.delete(owner, &task_id).await?;
            emit(format, &serde_json::json!({ "deleted": &task_id }), || {
                format!("Deleted `{}`\n", task_id)
            })?;
        }
        Some(Command::Repair) => {
            let report = service.repair(owner).await?;
            emit(format, &report, || format_repair_markdown(&report))?;
        }
    }

    Ok(())
}

async fn run_server(config: Config, service: Arc<Service>, args: ServeArgs) -> Result<()> {
    let mut server_config = config.server.clone();
    if let Some(host) = args.host {
        server_config.host = host;
    }
    if let Some(port) = args.port {
        server_config.port = port;
    }

    let state = AppState::new(service, config.listing.clone());
    let (shutdown_tx, addr) = start_server(state, &server_config).await?;
    println!("Listening on http://{}", addr);

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received");
    let _ = shutdown_tx.send(());
    Ok(())
}

async fn run_list(
    config: &Config,
    service: &Service,
    owner: &str,
    args: ListArgs,
    format: OutputFormat,
) -> Result<()> {
    let query = TaskQuery {
        search: args.search,
        quadrant: args.quadrant,
        completed: args.completed,
        due_between: args.today.then(|| local_day_bounds(Local::now())),
        sort_by: args.sort_by.unwrap_or(config.listing.sort_by),
        sort_order: args.sort_order.unwrap_or(config.listing.sort_order),
        limit: args.limit.unwrap_or(config.listing.page_size),
        offset: args.offset,
    };
    let tasks = service.list(owner, &query).await?;
    emit(format, &tasks, || format_matrix_markdown(&tasks))
}

async fn run_add(service: &Service, owner: &str, args: AddArgs, format: OutputFormat) -> Result<()> {
    let mut new = NewTask::new(args.title, args.quadrant);
    new.description = args.description;
    new.list_id = args.list;
    new.due_date = args
        .due
        .as_deref()
        .map(parse_due_date)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let task = service.create(owner, new).await?;
    emit(format, &task, || format_task_markdown(&task))
}

async fn run_edit(service: &Service, owner: &str, args: EditArgs, format: OutputFormat) -> Result<()> {
    let due_date = match args.due.as_deref() {
        None => None,
        Some("") => Some(None),
        Some(s) => Some(Some(parse_due_date(s).map_err(anyhow::Error::msg)?)),
    };
    let patch = TaskPatch {
        title: args.title,
        description: clearable(args.description),
        due_date,
        list_id: clearable(args.list),
        order: args.order,
        ..Default::default()
    };
    if patch.is_empty() {
        anyhow::bail!("nothing to edit: pass at least one field");
    }

    let task = service.update(owner, &args.task_id, patch).await?;
    emit(format, &task, || format_task_markdown(&task))
}
