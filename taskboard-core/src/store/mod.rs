pub mod memory;

use async_trait::async_trait;

use crate::types::{ColumnDbId, Status, TaskId};
use crate::wire::{ColumnBody, ColumnRecord, NewTaskBody, TaskRecord};

pub type StoreResult<T> = Result<T, StoreError>;

/// Remote task store (`/api/tasks`).
///
/// Records come back in the store's canonical casing; callers normalize
/// them with [`TaskRecord::into_task`].
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_tasks(&self) -> StoreResult<Vec<TaskRecord>>;

    async fn get_task(&self, id: TaskId) -> StoreResult<TaskRecord>;

    async fn list_tasks_by_status(&self, status: Status) -> StoreResult<Vec<TaskRecord>>;

    async fn list_tasks_by_column(&self, column_id: &str) -> StoreResult<Vec<TaskRecord>>;

    async fn list_tasks_by_assignee(&self, assignee: &str) -> StoreResult<Vec<TaskRecord>>;

    async fn count_tasks_by_status(&self, status: Status) -> StoreResult<u64>;

    async fn count_tasks_by_column(&self, column_id: &str) -> StoreResult<u64>;

    async fn create_task(&self, body: &NewTaskBody) -> StoreResult<TaskRecord>;

    /// Replace every editable field of a task.
    async fn update_task(&self, id: TaskId, record: &TaskRecord) -> StoreResult<TaskRecord>;

    /// Set the status. The store mirrors the status into `columnId`.
    async fn update_task_status(&self, id: TaskId, status: Status) -> StoreResult<TaskRecord>;

    async fn delete_task(&self, id: TaskId) -> StoreResult<()>;

    /// Move a task to a column. Built-in lanes also set the status; custom
    /// columns leave it unchanged.
    async fn move_task_to_column(&self, id: TaskId, column_id: &str) -> StoreResult<TaskRecord>;
}

/// Remote column store (`/api/columns`).
#[async_trait]
pub trait ColumnStore: Send + Sync {
    /// Columns in display order.
    async fn list_columns(&self) -> StoreResult<Vec<ColumnRecord>>;

    async fn get_column(&self, id: ColumnDbId) -> StoreResult<ColumnRecord>;

    async fn create_column(&self, body: &ColumnBody) -> StoreResult<ColumnRecord>;

    async fn update_column(&self, id: ColumnDbId, body: &ColumnBody) -> StoreResult<ColumnRecord>;

    async fn delete_column(&self, id: ColumnDbId) -> StoreResult<()>;

    /// Persist the display order. Unknown ids are ignored.
    async fn reorder_columns(&self, column_ids: &[String]) -> StoreResult<()>;

    /// Create the built-in lanes when the store has no columns at all.
    async fn initialize_default_columns(&self) -> StoreResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Store responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Decode error: {0}")]
    Decode(String),
}
