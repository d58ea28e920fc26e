//! Records exchanged with the remote task and column stores.
//!
//! The stores speak upper-case enum names and may omit `columnId` for
//! tasks created before column support existed. `TaskRecord::into_task`
//! is the single place where that legacy shape is normalized into the
//! lane model the rest of the crate uses.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::{Column, ColumnDbId, Priority, Status, Task, TaskDraft, TaskId};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub column_id: Option<String>,
}

impl TaskRecord {
    /// Normalize a store record: lowercase priority/status, parse dates,
    /// and default a missing or empty `columnId` to the lowercase status.
    pub fn into_task(self) -> Task {
        let priority = match self.priority.as_deref() {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                log::warn!("[taskboard.wire] {} on task {:?}, using medium", e, self.id);
                Priority::Medium
            }),
            None => Priority::Medium,
        };
        let status = match self.status.as_deref() {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                log::warn!("[taskboard.wire] {} on task {:?}, using todo", e, self.id);
                Status::Todo
            }),
            None => Status::Todo,
        };
        let column_id = match self.column_id {
            Some(id) if !id.is_empty() => id,
            _ => status.as_str().to_string(),
        };

        Task {
            id: self.id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            assignee: self.assignee.unwrap_or_default(),
            priority,
            status,
            due_date: self.due_date.as_deref().and_then(parse_date),
            created_at: self.created_at.as_deref().and_then(parse_datetime),
            updated_at: self.updated_at.as_deref().and_then(parse_datetime),
            column_id: Some(column_id),
        }
    }

    /// Full-update body for an existing task, enums upper-cased.
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: Some(task.description.clone()),
            assignee: Some(task.assignee.clone()),
            priority: Some(task.priority.as_wire().to_string()),
            status: Some(task.status.as_wire().to_string()),
            due_date: task.due_date.map(format_date),
            created_at: task.created_at.map(format_datetime),
            updated_at: task.updated_at.map(format_datetime),
            column_id: task.column_id.clone(),
        }
    }
}

/// Body of a task creation request. Status is always `TODO`: the store's
/// status is a simplified lane tracker, separate from the column the task
/// is created in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskBody {
    pub title: String,
    pub description: String,
    pub assignee: String,
    pub priority: String,
    pub status: String,
    pub due_date: Option<String>,
    pub column_id: String,
}

impl NewTaskBody {
    pub fn from_draft(draft: &TaskDraft) -> Self {
        let column_id = if draft.column_id.is_empty() {
            crate::types::DEFAULT_LANE.to_string()
        } else {
            draft.column_id.clone()
        };
        Self {
            title: draft.title.clone(),
            description: draft.description.clone(),
            assignee: draft.assignee.clone(),
            priority: draft.priority.as_wire().to_string(),
            status: Status::Todo.as_wire().to_string(),
            due_date: draft.due_date.map(format_date),
            column_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

impl StatusBody {
    pub fn new(status: Status) -> Self {
        Self {
            status: status.as_wire().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ColumnDbId>,
    pub column_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl ColumnRecord {
    pub fn into_column(self) -> Column {
        Column {
            id: self.column_id,
            title: self.title,
            db_id: self.id,
        }
    }
}

/// Body of a column create or update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnBody {
    pub column_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderBody {
    pub column_ids: Vec<String>,
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_datetime(at: NaiveDateTime) -> String {
    at.format(DATETIME_FORMAT).to_string()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // Some serializers send a full timestamp for date-only fields.
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), DATE_FORMAT).ok()
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}
