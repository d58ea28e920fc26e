use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use taskboard_core::engine::{DropEvent, Engine, EngineError, LoadSource, Outcome};
use taskboard_core::store::StoreError;
use taskboard_core::types::{Priority, TaskId};
use taskboard_core::view_model::ViewModel;

use crate::config::{default_config_path, load_config, URL_ENV};
use crate::log_bridge;
use crate::rest::RestStore;

#[derive(Debug, Parser)]
#[command(name = "taskboard", version, about = "Kanban task board client")]
pub struct Cli {
    /// Config file (default: <config dir>/taskboard/client.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL; takes precedence over the config file and TASKBOARD_URL
    #[arg(long, global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print every column with its tasks
    Board,
    /// Create a task (status is always todo)
    AddTask {
        title: String,
        /// Target column id (default: first column)
        column: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        assignee: String,
        #[arg(long)]
        priority: Option<Priority>,
    },
    /// Create a column; its id is derived from the title
    AddColumn { title: String },
    RenameColumn { id: String, title: String },
    /// Delete a column and move its tasks back to todo
    DeleteColumn {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    DuplicateColumn { id: String },
    /// Move a task to a column
    Move {
        task_id: TaskId,
        column: String,
        /// Position within the target column
        #[arg(long, default_value_t = 0)]
        position: usize,
    },
    /// Reorder columns; listed ids go first, in the given order
    Reorder {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    DeleteTask {
        id: TaskId,
        #[arg(long)]
        yes: bool,
    },
    /// Task counts per built-in status
    Counts,
    /// Create the built-in columns if the backend has none
    InitColumns,
    /// Print the tail of the client log file
    Logs {
        #[arg(long, default_value_t = 50)]
        lines: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("Backend unreachable at {0}")]
    Offline(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to read log file: {0}")]
    Io(#[from] io::Error),
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Logs { lines } = cli.command {
        let path = log_bridge::log_file_path();
        for line in log_bridge::tail_lines(&path, lines)? {
            println!("{}", line);
        }
        return Ok(());
    }

    let path = cli.config.unwrap_or_else(default_config_path);
    let config = load_config(&path)
        .with_url_override(std::env::var(URL_ENV).ok())
        .with_url_override(cli.url);
    let store = Arc::new(RestStore::new(&config.base_url, config.timeout())?);
    let mut engine = Engine::with_store(store).with_options(config.engine_options());

    let mut stdout = io::stdout();
    let result = execute(&mut engine, cli.command, &config.base_url, &mut stdout).await;
    engine.settle_background().await;
    if let Some(message) = engine.view().error() {
        eprintln!("{}", message);
    }
    result
}

/// Load the board and run one command against it.
pub async fn execute(
    engine: &mut Engine,
    command: Command,
    base_url: &str,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let (columns, tasks) = engine.load_board().await;
    if let Command::Board = command {
        if tasks? == LoadSource::Fallback {
            writeln!(out, "(backend unreachable, showing demo tasks)")?;
        }
        columns?;
        write!(out, "{}", render_board(engine.view()))?;
        return Ok(());
    }
    if tasks? == LoadSource::Fallback || columns? == LoadSource::Fallback {
        return Err(CliError::Offline(base_url.to_string()));
    }

    let outcome = match command {
        Command::Board | Command::Logs { .. } => Outcome::Skipped,
        Command::AddTask {
            title,
            column,
            description,
            assignee,
            priority,
        } => {
            let draft = engine.open_add_task_modal();
            draft.title = title;
            draft.description = description;
            draft.assignee = assignee;
            if let Some(priority) = priority {
                draft.priority = priority;
            }
            if let Some(column) = column {
                draft.column_id = column;
            }
            engine.submit_add_task_modal().await?
        }
        Command::AddColumn { title } => {
            *engine.open_add_column_modal() = title;
            engine.submit_add_column_modal().await?
        }
        Command::RenameColumn { id, title } => {
            require_column(engine.view(), &id)?;
            engine.rename_column(&id, &title).await?
        }
        Command::DeleteColumn { id, yes } => {
            require_column(engine.view(), &id)?;
            engine.open_column_menu(&id, 0.0, 0.0);
            engine.delete_selected_column(confirmation(yes)).await?
        }
        Command::DuplicateColumn { id } => {
            require_column(engine.view(), &id)?;
            engine.open_column_menu(&id, 0.0, 0.0);
            engine.duplicate_selected_column().await?
        }
        Command::Move {
            task_id,
            column,
            position,
        } => {
            let event = drop_event(engine.view(), task_id, &column, position)?;
            engine.drop_task(event).await?
        }
        Command::Reorder { ids } => reorder(engine, &ids).await?,
        Command::DeleteTask { id, yes } => {
            if engine.view().task(id).is_none() {
                return Err(CliError::Usage(format!("No task with id {}", id)));
            }
            engine.delete_task(id, confirmation(yes)).await?
        }
        Command::Counts => {
            for (status, count) in engine.status_counts().await? {
                writeln!(out, "{:<6} {}", status, count)?;
            }
            Outcome::Applied
        }
        Command::InitColumns => engine.initialize_default_columns().await?,
    };

    match outcome {
        Outcome::Applied => {}
        Outcome::Skipped => writeln!(out, "Nothing to do.")?,
        Outcome::Cancelled => writeln!(out, "Cancelled.")?,
    }
    Ok(())
}

fn require_column(view: &ViewModel, id: &str) -> Result<(), CliError> {
    match view.column(id) {
        Some(_) => Ok(()),
        None => Err(CliError::Usage(format!("No column with id {}", id))),
    }
}

/// Express "move task to column" as the drop a user would make.
fn drop_event(
    view: &ViewModel,
    task_id: TaskId,
    column: &str,
    position: usize,
) -> Result<DropEvent, CliError> {
    require_column(view, column)?;
    let task = view
        .task(task_id)
        .ok_or_else(|| CliError::Usage(format!("No task with id {}", task_id)))?;
    let lane = task.lane().to_string();
    let index = view
        .tasks_by_column(&lane)
        .iter()
        .position(|t| t.id == Some(task_id))
        .unwrap_or_default();
    Ok(DropEvent::between(&lane, column, index, position))
}

/// Bring the listed columns to the front, in order, one header drag at a time.
async fn reorder(engine: &mut Engine, ids: &[String]) -> Result<Outcome, CliError> {
    let mut outcome = Outcome::Skipped;
    for (target, id) in ids.iter().enumerate() {
        let current = engine
            .view()
            .columns()
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| CliError::Usage(format!("No column with id {}", id)))?;
        if engine.reorder_columns(current, target).await? == Outcome::Applied {
            outcome = Outcome::Applied;
        }
    }
    Ok(outcome)
}

fn confirmation(yes: bool) -> impl FnOnce(&str) -> bool {
    move |prompt| yes || ask(prompt)
}

fn ask(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

pub fn render_board(view: &ViewModel) -> String {
    let mut out = String::new();
    for column in view.columns() {
        let tasks = view.tasks_by_column(&column.id);
        out.push_str(&format!("{} ({}) [{}]\n", column.title, column.id, tasks.len()));
        for task in tasks {
            let id = task.id.map_or_else(|| "-".to_string(), |id| id.to_string());
            out.push_str(&format!("  #{} [{}] {}", id, task.priority, task.title));
            if !task.assignee.is_empty() {
                out.push_str(&format!(" @{}", task.assignee));
            }
            if let Some(due) = task.due_date {
                out.push_str(&format!(" (due {})", due));
            }
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_core::engine::Engine;
    use taskboard_core::store::memory::MemoryStore;
    use taskboard_core::types::{Status, Task};

    fn task(id: TaskId, title: &str, lane: &str) -> Task {
        Task {
            id: Some(id),
            title: title.to_string(),
            description: String::new(),
            assignee: String::new(),
            priority: Priority::Medium,
            status: Status::from_lane(lane).unwrap_or(Status::Todo),
            due_date: None,
            created_at: None,
            updated_at: None,
            column_id: Some(lane.to_string()),
        }
    }

    async fn engine_with(tasks: Vec<Task>) -> (MemoryStore, Engine) {
        let store = MemoryStore::with_default_columns();
        for t in tasks {
            store.seed_task(t);
        }
        let engine = Engine::with_store(Arc::new(store.clone()));
        (store, engine)
    }

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["taskboard", "add-task", "Write docs", "doing", "--priority", "alta"])
            .unwrap();
        match cli.command {
            Command::AddTask { title, column, priority, .. } => {
                assert_eq!(title, "Write docs");
                assert_eq!(column.as_deref(), Some("doing"));
                assert_eq!(priority, Some(Priority::High));
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from(["taskboard", "--url", "http://x", "delete-column", "done", "--yes"])
            .unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://x"));
        assert!(matches!(cli.command, Command::DeleteColumn { yes: true, .. }));
        assert!(Cli::try_parse_from(["taskboard", "reorder"]).is_err());
    }

    #[tokio::test]
    async fn test_board_output() {
        let mut ana = task(1, "Plan sprint", "todo");
        ana.assignee = "Ana".to_string();
        let (_store, mut engine) = engine_with(vec![ana, task(2, "Ship", "done")]).await;

        let mut out = Vec::new();
        execute(&mut engine, Command::Board, "mem://", &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "To Do (todo) [1]\n  #1 [medium] Plan sprint @Ana\nIn Progress (doing) [0]\nDone (done) [1]\n  #2 [medium] Ship\n"
        );
    }

    #[tokio::test]
    async fn test_move_and_reorder_commands() {
        let (store, mut engine) =
            engine_with(vec![task(1, "A", "todo"), task(2, "B", "doing")]).await;
        let mut out = Vec::new();

        let move_cmd = Command::Move {
            task_id: 1,
            column: "done".to_string(),
            position: 0,
        };
        execute(&mut engine, move_cmd, "mem://", &mut out).await.unwrap();
        assert_eq!(store.task(1).unwrap().status, Status::Done);

        let reorder_cmd = Command::Reorder {
            ids: vec!["done".to_string(), "todo".to_string()],
        };
        execute(&mut engine, reorder_cmd, "mem://", &mut out).await.unwrap();
        let order: Vec<_> = store.columns().into_iter().map(|c| c.column_id).collect();
        assert_eq!(order, vec!["done", "todo", "doing"]);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_usage_errors() {
        let (_store, mut engine) = engine_with(Vec::new()).await;
        let mut out = Vec::new();
        let err = execute(
            &mut engine,
            Command::DeleteTask { id: 9, yes: true },
            "mem://",
            &mut out,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));

        let err = execute(
            &mut engine,
            Command::Reorder {
                ids: vec!["nope".to_string()],
            },
            "mem://",
            &mut out,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[tokio::test]
    async fn test_mutations_refused_when_offline() {
        let (store, mut engine) = engine_with(Vec::new()).await;
        store.set_offline(true);
        let mut out = Vec::new();
        let err = execute(
            &mut engine,
            Command::AddColumn {
                title: "Review".to_string(),
            },
            "http://localhost:8080",
            &mut out,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Offline(_)));

        let mut out = Vec::new();
        execute(&mut engine, Command::Board, "http://localhost:8080", &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("(backend unreachable, showing demo tasks)\n"));
        assert!(text.contains("#1 [high] Build login component @João"));
    }
}
