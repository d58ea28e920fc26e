use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backing-store identifier of a persisted task.
pub type TaskId = i64;

/// Backing-store identifier of a persisted column.
pub type ColumnDbId = i64;

/// Lane every task falls back to when its own lane disappears.
pub const DEFAULT_LANE: &str = "todo";

/// Prefix the drag-and-drop layer puts in front of a column id.
pub const CONTAINER_PREFIX: &str = "column-";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Upper-cased form the remote store expects.
    pub fn as_wire(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl FromStr for Priority {
    type Err = ParseLaneValueError;

    /// Case-insensitive. The Portuguese names older backends emit
    /// (`BAIXA`, `MEDIA`, `ALTA`) are accepted as aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "baixa" => Ok(Priority::Low),
            "medium" | "media" => Ok(Priority::Medium),
            "high" | "alta" => Ok(Priority::High),
            _ => Err(ParseLaneValueError::Priority(s.to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Legacy lane tracker. Only the three built-in lanes have a status;
/// custom columns are tracked by `Task::column_id` alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Todo,
    Doing,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::Doing, Status::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::Doing => "doing",
            Status::Done => "done",
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Status::Todo => "TODO",
            Status::Doing => "DOING",
            Status::Done => "DONE",
        }
    }

    /// Map a lane id onto a status. Exact match only: `"Done"` is a custom
    /// column, not the built-in lane.
    pub fn from_lane(lane: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.as_str() == lane)
    }
}

impl FromStr for Status {
    type Err = ParseLaneValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todo" => Ok(Status::Todo),
            "doing" => Ok(Status::Doing),
            "done" => Ok(Status::Done),
            _ => Err(ParseLaneValueError::Status(s.to_string())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseLaneValueError {
    #[error("Unknown priority: {0}")]
    Priority(String),
    #[error("Unknown status: {0}")]
    Status(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Absent until the store has persisted the task.
    pub id: Option<TaskId>,
    pub title: String,
    pub description: String,
    pub assignee: String,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<NaiveDate>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    /// General lane pointer. Tasks created before column support have none
    /// and live in the lane named by their status.
    pub column_id: Option<String>,
}

impl Task {
    /// The lane this task is displayed in.
    pub fn lane(&self) -> &str {
        match self.column_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => self.status.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Local slug, unique within the board.
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_id: Option<ColumnDbId>,
}

impl Column {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            db_id: None,
        }
    }

    /// Container id the drag-and-drop layer uses for this column.
    pub fn container_id(&self) -> String {
        container_id(&self.id)
    }
}

pub fn container_id(column_id: &str) -> String {
    format!("{}{}", CONTAINER_PREFIX, column_id)
}

/// Resolve a drop container back to its column id. An empty remainder
/// resolves to the default lane.
pub fn column_id_from_container(container: &str) -> String {
    let id = container.strip_prefix(CONTAINER_PREFIX).unwrap_or(container);
    if id.is_empty() {
        DEFAULT_LANE.to_string()
    } else {
        id.to_string()
    }
}

/// Form state for a task that has not been sent to the store yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub assignee: String,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<NaiveDate>,
    pub column_id: String,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            assignee: String::new(),
            priority: Priority::Medium,
            status: Status::Todo,
            due_date: None,
            column_id: DEFAULT_LANE.to_string(),
        }
    }
}

impl TaskDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn in_column(mut self, column_id: impl Into<String>) -> Self {
        self.column_id = column_id.into();
        self
    }
}

/// The three built-in lanes, used when the column store is unreachable.
pub fn default_columns() -> Vec<Column> {
    vec![
        Column::new("todo", "To Do"),
        Column::new("doing", "In Progress"),
        Column::new("done", "Done"),
    ]
}

/// Example tasks shown when the task store is unreachable so the board
/// stays usable.
pub fn demo_tasks() -> Vec<Task> {
    let created_at = Some(chrono::Local::now().naive_local());
    let demo = |id: TaskId,
                title: &str,
                description: &str,
                assignee: &str,
                priority: Priority,
                status: Status,
                due: (i32, u32, u32)| Task {
        id: Some(id),
        title: title.to_string(),
        description: description.to_string(),
        assignee: assignee.to_string(),
        priority,
        status,
        due_date: NaiveDate::from_ymd_opt(due.0, due.1, due.2),
        created_at,
        updated_at: None,
        column_id: None,
    };
    vec![
        demo(
            1,
            "Build login component",
            "Create the user authentication screen",
            "João",
            Priority::High,
            Status::Todo,
            (2025, 8, 30),
        ),
        demo(
            2,
            "Set up database",
            "MySQL setup with Spring Boot",
            "Maria",
            Priority::Medium,
            Status::Doing,
            (2025, 8, 28),
        ),
        demo(
            3,
            "API documentation",
            "Document every endpoint",
            "Pedro",
            Priority::Low,
            Status::Done,
            (2025, 8, 27),
        ),
    ]
}
