use std::collections::HashSet;

use super::{messages, Engine, EngineResult};
use crate::store::StoreResult;
use crate::types::{default_columns, demo_tasks};
use crate::wire::{ColumnRecord, TaskRecord};

/// Where the data shown after a load came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    /// The store was unreachable and built-in data is shown instead.
    Fallback,
}

impl Engine {
    /// Fetch columns and tasks concurrently and apply each result
    /// independently; one failing does not affect the other.
    pub async fn load_board(&mut self) -> (EngineResult<LoadSource>, EngineResult<LoadSource>) {
        self.view.loading = true;
        self.view.ui.error.clear();
        let (columns, tasks) = tokio::join!(
            self.column_store.list_columns(),
            self.task_store.list_tasks()
        );
        (self.apply_columns(columns), self.apply_tasks(tasks))
    }

    /// A column fetch failure falls back to the built-in lanes without
    /// surfacing an error.
    pub async fn load_columns(&mut self) -> EngineResult<LoadSource> {
        let result = self.column_store.list_columns().await;
        self.apply_columns(result)
    }

    /// A task fetch failure surfaces an error, then shows the demo tasks.
    pub async fn load_tasks(&mut self) -> EngineResult<LoadSource> {
        self.view.loading = true;
        self.view.ui.error.clear();
        let result = self.task_store.list_tasks().await;
        self.apply_tasks(result)
    }

    /// Replace local tasks with the store's list after a failed change.
    /// Unlike [`Engine::load_tasks`] this keeps the error that triggered it,
    /// and a failing fetch leaves local tasks as they are.
    pub(crate) async fn resync_tasks(&mut self) {
        match self.task_store.list_tasks().await {
            Ok(records) => {
                self.view.tasks = records.into_iter().map(TaskRecord::into_task).collect();
                log::info!(
                    "[taskboard.engine.resync] reloaded {} tasks",
                    self.view.tasks.len()
                );
            }
            Err(e) => {
                log::error!("[taskboard.engine.resync] reload failed, keeping local tasks: {}", e);
            }
        }
    }

    fn apply_columns(&mut self, result: StoreResult<Vec<ColumnRecord>>) -> EngineResult<LoadSource> {
        match result {
            Ok(records) => {
                let mut seen = HashSet::new();
                self.view.columns = records
                    .into_iter()
                    .map(ColumnRecord::into_column)
                    .filter(|c| {
                        let fresh = seen.insert(c.id.clone());
                        if !fresh {
                            log::warn!("[taskboard.engine.load] dropping duplicate column id {}", c.id);
                        }
                        fresh
                    })
                    .collect();
                log::info!(
                    "[taskboard.engine.load] loaded {} columns",
                    self.view.columns.len()
                );
                Ok(LoadSource::Remote)
            }
            Err(e) if self.options.fallback_to_default_columns => {
                log::warn!("[taskboard.engine.load] column fetch failed, using defaults: {}", e);
                self.view.columns = default_columns();
                Ok(LoadSource::Fallback)
            }
            Err(e) => Err(self.remote_failure("load_columns", messages::LOAD_COLUMNS, e)),
        }
    }

    fn apply_tasks(&mut self, result: StoreResult<Vec<TaskRecord>>) -> EngineResult<LoadSource> {
        self.view.loading = false;
        match result {
            Ok(records) => {
                self.view.tasks = records.into_iter().map(TaskRecord::into_task).collect();
                log::info!("[taskboard.engine.load] loaded {} tasks", self.view.tasks.len());
                Ok(LoadSource::Remote)
            }
            Err(e) => {
                let err = self.remote_failure("load_tasks", messages::LOAD_TASKS, e);
                if self.options.fallback_to_demo_data {
                    self.view.tasks = demo_tasks();
                    Ok(LoadSource::Fallback)
                } else {
                    Err(err)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine::test_support::*;
    use crate::engine::EngineOptions;
    use crate::store::memory::{MemoryStore, StoreOp};
    use crate::types::{Priority, Status};

    #[tokio::test]
    async fn test_load_normalizes_tasks() {
        let mut legacy = persisted(4, "Legacy", "doing");
        legacy.column_id = None;
        legacy.priority = Priority::High;
        let (_store, engine) = loaded(vec![persisted(1, "A", "todo"), legacy]).await;

        let task = engine.view().task(4).unwrap();
        assert_eq!(task.status, Status::Doing);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.column_id.as_deref(), Some("doing"));
        assert!(!engine.view().is_loading());
        assert!(engine.view().error().is_none());
    }

    #[tokio::test]
    async fn test_task_store_down_shows_demo_tasks() {
        let store = MemoryStore::with_default_columns();
        store.fail(StoreOp::ListTasks);
        let mut engine = Engine::with_store(Arc::new(store));

        let (columns, tasks) = engine.load_board().await;
        assert_eq!(columns.unwrap(), LoadSource::Remote);
        assert_eq!(tasks.unwrap(), LoadSource::Fallback);
        assert_eq!(engine.view().error(), Some(messages::LOAD_TASKS));
        let ids: Vec<_> = engine.view().tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
        assert!(!engine.view().is_loading());
    }

    #[tokio::test]
    async fn test_column_store_down_uses_defaults_silently() {
        let store = MemoryStore::new();
        store.seed_column("backlog", "Backlog").unwrap();
        store.fail(StoreOp::ListColumns);
        let mut engine = Engine::with_store(Arc::new(store));

        assert_eq!(engine.load_columns().await.unwrap(), LoadSource::Fallback);
        let ids: Vec<_> = engine.view().columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["todo", "doing", "done"]);
        assert!(engine.view().error().is_none());
    }

    #[tokio::test]
    async fn test_fallbacks_can_be_disabled() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let mut engine = Engine::with_store(Arc::new(store)).with_options(EngineOptions {
            fallback_to_demo_data: false,
            fallback_to_default_columns: false,
        });

        assert!(engine.load_tasks().await.is_err());
        assert!(engine.view().tasks().is_empty());
        assert!(engine.load_columns().await.is_err());
        assert_eq!(engine.view().error(), Some(messages::LOAD_COLUMNS));
    }

    #[tokio::test]
    async fn test_loaded_columns_keep_db_ids_and_order() {
        let store = MemoryStore::with_default_columns();
        store.seed_column("review", "Review").unwrap();
        let mut engine = Engine::with_store(Arc::new(store));
        engine.load_columns().await.unwrap();

        let columns = engine.view().columns();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[3].id, "review");
        assert_eq!(columns[3].db_id, Some(4));
    }
}
