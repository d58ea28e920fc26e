//! In-memory task and column store.
//!
//! Follows the remote backend's rules so the engine can be driven without
//! a server:
//! - ids are assigned on create, records come back upper-cased
//! - a created task without `columnId` lives in the lane named by its status
//! - status updates mirror the status into `columnId`
//! - moving to a built-in lane sets the status, custom lanes keep it
//! - column slugs are unique, list order is `displayOrder`
//!
//! Every call is recorded, and single operations (or the whole store) can
//! be made to fail.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{ColumnStore, StoreError, StoreResult, TaskStore};
use crate::types::{ColumnDbId, Status, Task, TaskId};
use crate::wire::{ColumnBody, ColumnRecord, NewTaskBody, TaskRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListTasks,
    GetTask,
    ListTasksByStatus,
    ListTasksByColumn,
    ListTasksByAssignee,
    CountTasksByStatus,
    CountTasksByColumn,
    CreateTask,
    UpdateTask,
    UpdateTaskStatus,
    DeleteTask,
    MoveTaskToColumn,
    ListColumns,
    GetColumn,
    CreateColumn,
    UpdateColumn,
    DeleteColumn,
    ReorderColumns,
    InitializeColumns,
}

#[derive(Debug, Clone)]
struct StoredColumn {
    id: ColumnDbId,
    column_id: String,
    title: String,
    display_order: i32,
}

impl StoredColumn {
    fn to_record(&self) -> ColumnRecord {
        ColumnRecord {
            id: Some(self.id),
            column_id: self.column_id.clone(),
            title: self.title.clone(),
            display_order: Some(self.display_order),
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tasks: Vec<Task>,
    columns: Vec<StoredColumn>,
    next_task_id: TaskId,
    next_column_id: ColumnDbId,
    calls: Vec<StoreOp>,
    failing: HashSet<StoreOp>,
    offline: bool,
}

impl MemoryState {
    fn task_mut(&mut self, id: TaskId) -> StoreResult<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == Some(id))
            .ok_or_else(|| StoreError::NotFound(format!("task {}", id)))
    }

    fn allocate_task_id(&mut self) -> TaskId {
        self.next_task_id += 1;
        self.next_task_id
    }

    fn insert_column(&mut self, column_id: &str, title: &str) -> StoreResult<ColumnRecord> {
        if self.columns.iter().any(|c| c.column_id == column_id) {
            return Err(StoreError::Conflict(format!(
                "column id already exists: {}",
                column_id
            )));
        }
        self.next_column_id += 1;
        let display_order = self
            .columns
            .iter()
            .map(|c| c.display_order)
            .max()
            .unwrap_or(0)
            + 1;
        let column = StoredColumn {
            id: self.next_column_id,
            column_id: column_id.to_string(),
            title: title.to_string(),
            display_order,
        };
        let record = column.to_record();
        self.columns.push(column);
        Ok(record)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the three built-in lanes.
    pub fn with_default_columns() -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            for (column_id, title) in DEFAULT_COLUMNS {
                // Fresh store, slugs are distinct.
                let _ = state.insert_column(column_id, title);
            }
        }
        store
    }

    /// Insert a task as if it had been persisted earlier. Keeps a given id,
    /// assigns one otherwise.
    pub fn seed_task(&self, mut task: Task) -> Task {
        let mut state = self.lock();
        match task.id {
            Some(id) => state.next_task_id = state.next_task_id.max(id),
            None => task.id = Some(state.allocate_task_id()),
        }
        state.tasks.push(task.clone());
        task
    }

    pub fn seed_column(&self, column_id: &str, title: &str) -> StoreResult<ColumnRecord> {
        self.lock().insert_column(column_id, title)
    }

    /// Snapshot of stored tasks, in creation order.
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    pub fn task(&self, id: TaskId) -> Option<Task> {
        self.lock().tasks.iter().find(|t| t.id == Some(id)).cloned()
    }

    /// Snapshot of stored columns, in display order.
    pub fn columns(&self) -> Vec<ColumnRecord> {
        sorted_columns(&self.lock())
    }

    pub fn calls(&self) -> Vec<StoreOp> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn fail(&self, op: StoreOp) {
        self.lock().failing.insert(op);
    }

    pub fn heal(&self, op: StoreOp) {
        self.lock().failing.remove(&op);
    }

    /// Fail every operation with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call and apply failure injection.
    fn begin(&self, op: StoreOp) -> StoreResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        state.calls.push(op);
        if state.offline {
            return Err(StoreError::Transport("connection refused".to_string()));
        }
        if state.failing.contains(&op) {
            return Err(StoreError::Status {
                status: 500,
                body: format!("injected failure for {:?}", op),
            });
        }
        Ok(state)
    }
}

const DEFAULT_COLUMNS: [(&str, &str); 3] =
    [("todo", "To Do"), ("doing", "In Progress"), ("done", "Done")];

fn sorted_columns(state: &MemoryState) -> Vec<ColumnRecord> {
    let mut columns: Vec<&StoredColumn> = state.columns.iter().collect();
    columns.sort_by_key(|c| c.display_order);
    columns.into_iter().map(StoredColumn::to_record).collect()
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn bad_request(message: impl Into<String>) -> StoreError {
    StoreError::Status {
        status: 400,
        body: message.into(),
    }
}

fn records<'a>(tasks: impl Iterator<Item = &'a Task>) -> Vec<TaskRecord> {
    tasks.map(TaskRecord::from_task).collect()
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self) -> StoreResult<Vec<TaskRecord>> {
        let state = self.begin(StoreOp::ListTasks)?;
        Ok(records(state.tasks.iter()))
    }

    async fn get_task(&self, id: TaskId) -> StoreResult<TaskRecord> {
        let mut state = self.begin(StoreOp::GetTask)?;
        Ok(TaskRecord::from_task(state.task_mut(id)?))
    }

    async fn list_tasks_by_status(&self, status: Status) -> StoreResult<Vec<TaskRecord>> {
        let state = self.begin(StoreOp::ListTasksByStatus)?;
        Ok(records(state.tasks.iter().filter(|t| t.status == status)))
    }

    async fn list_tasks_by_column(&self, column_id: &str) -> StoreResult<Vec<TaskRecord>> {
        let state = self.begin(StoreOp::ListTasksByColumn)?;
        Ok(records(
            state
                .tasks
                .iter()
                .filter(|t| t.column_id.as_deref() == Some(column_id)),
        ))
    }

    async fn list_tasks_by_assignee(&self, assignee: &str) -> StoreResult<Vec<TaskRecord>> {
        let state = self.begin(StoreOp::ListTasksByAssignee)?;
        Ok(records(state.tasks.iter().filter(|t| t.assignee == assignee)))
    }

    async fn count_tasks_by_status(&self, status: Status) -> StoreResult<u64> {
        let state = self.begin(StoreOp::CountTasksByStatus)?;
        Ok(state.tasks.iter().filter(|t| t.status == status).count() as u64)
    }

    async fn count_tasks_by_column(&self, column_id: &str) -> StoreResult<u64> {
        let state = self.begin(StoreOp::CountTasksByColumn)?;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.column_id.as_deref() == Some(column_id))
            .count() as u64)
    }

    async fn create_task(&self, body: &NewTaskBody) -> StoreResult<TaskRecord> {
        let mut state = self.begin(StoreOp::CreateTask)?;
        if body.title.trim().is_empty() {
            return Err(bad_request("title is required"));
        }
        let priority = body.priority.parse().map_err(|e| bad_request(format!("{}", e)))?;
        let status: Status = body.status.parse().map_err(|e| bad_request(format!("{}", e)))?;
        let column_id = if body.column_id.is_empty() {
            status.as_str().to_string()
        } else {
            body.column_id.clone()
        };
        let created = now();
        let task = Task {
            id: Some(state.allocate_task_id()),
            title: body.title.clone(),
            description: body.description.clone(),
            assignee: body.assignee.clone(),
            priority,
            status,
            due_date: body
                .due_date
                .as_deref()
                .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            created_at: Some(created),
            updated_at: Some(created),
            column_id: Some(column_id),
        };
        let record = TaskRecord::from_task(&task);
        state.tasks.push(task);
        Ok(record)
    }

    async fn update_task(&self, id: TaskId, record: &TaskRecord) -> StoreResult<TaskRecord> {
        let mut state = self.begin(StoreOp::UpdateTask)?;
        let incoming = record.clone().into_task();
        let task = state.task_mut(id)?;
        task.title = incoming.title;
        task.description = incoming.description;
        task.assignee = incoming.assignee;
        task.priority = incoming.priority;
        task.status = incoming.status;
        task.due_date = incoming.due_date;
        if record.column_id.is_some() {
            task.column_id = incoming.column_id;
        }
        task.updated_at = Some(now());
        Ok(TaskRecord::from_task(task))
    }

    async fn update_task_status(&self, id: TaskId, status: Status) -> StoreResult<TaskRecord> {
        let mut state = self.begin(StoreOp::UpdateTaskStatus)?;
        let task = state.task_mut(id)?;
        task.status = status;
        task.column_id = Some(status.as_str().to_string());
        task.updated_at = Some(now());
        Ok(TaskRecord::from_task(task))
    }

    async fn delete_task(&self, id: TaskId) -> StoreResult<()> {
        let mut state = self.begin(StoreOp::DeleteTask)?;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != Some(id));
        if state.tasks.len() == before {
            return Err(StoreError::NotFound(format!("task {}", id)));
        }
        Ok(())
    }

    async fn move_task_to_column(&self, id: TaskId, column_id: &str) -> StoreResult<TaskRecord> {
        let mut state = self.begin(StoreOp::MoveTaskToColumn)?;
        let task = state.task_mut(id)?;
        task.column_id = Some(column_id.to_string());
        if let Some(status) = Status::from_lane(column_id) {
            task.status = status;
        }
        task.updated_at = Some(now());
        Ok(TaskRecord::from_task(task))
    }
}

#[async_trait]
impl ColumnStore for MemoryStore {
    async fn list_columns(&self) -> StoreResult<Vec<ColumnRecord>> {
        let state = self.begin(StoreOp::ListColumns)?;
        Ok(sorted_columns(&state))
    }

    async fn get_column(&self, id: ColumnDbId) -> StoreResult<ColumnRecord> {
        let state = self.begin(StoreOp::GetColumn)?;
        state
            .columns
            .iter()
            .find(|c| c.id == id)
            .map(StoredColumn::to_record)
            .ok_or_else(|| StoreError::NotFound(format!("column {}", id)))
    }

    async fn create_column(&self, body: &ColumnBody) -> StoreResult<ColumnRecord> {
        let mut state = self.begin(StoreOp::CreateColumn)?;
        if body.column_id.is_empty() {
            return Err(bad_request("columnId is required"));
        }
        state.insert_column(&body.column_id, &body.title)
    }

    async fn update_column(&self, id: ColumnDbId, body: &ColumnBody) -> StoreResult<ColumnRecord> {
        let mut state = self.begin(StoreOp::UpdateColumn)?;
        let column = state
            .columns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("column {}", id)))?;
        column.title = body.title.clone();
        Ok(column.to_record())
    }

    async fn delete_column(&self, id: ColumnDbId) -> StoreResult<()> {
        let mut state = self.begin(StoreOp::DeleteColumn)?;
        let before = state.columns.len();
        state.columns.retain(|c| c.id != id);
        if state.columns.len() == before {
            return Err(StoreError::NotFound(format!("column {}", id)));
        }
        Ok(())
    }

    async fn reorder_columns(&self, column_ids: &[String]) -> StoreResult<()> {
        let mut state = self.begin(StoreOp::ReorderColumns)?;
        for (index, column_id) in column_ids.iter().enumerate() {
            if let Some(column) = state.columns.iter_mut().find(|c| &c.column_id == column_id) {
                column.display_order = index as i32 + 1;
            }
        }
        Ok(())
    }

    async fn initialize_default_columns(&self) -> StoreResult<()> {
        let mut state = self.begin(StoreOp::InitializeColumns)?;
        if state.columns.is_empty() {
            for (column_id, title) in DEFAULT_COLUMNS {
                state.insert_column(column_id, title)?;
            }
        }
        Ok(())
    }
}
