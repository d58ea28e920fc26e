use std::sync::Arc;

use super::{messages, Engine, EngineError, EngineResult, Outcome};
use crate::slug::{copy_title, slugify};
use crate::store::TaskStore;
use crate::types::{Status, TaskId, DEFAULT_LANE};
use crate::ui::ColumnEdit;
use crate::view_model::move_item;
use crate::wire::{ColumnBody, ColumnRecord, TaskRecord};

/// How a task is pulled out of a deleted lane.
enum Reassignment {
    /// The task lives in the lane: status patch, which the store mirrors
    /// into `columnId`.
    Lane(TaskId),
    /// Only the legacy status names the lane: full update keeping the
    /// task's current column.
    StatusOnly(TaskRecord),
}

impl Engine {
    /// Create a column whose id is the slug of the trimmed title.
    pub async fn add_column(&mut self, title: &str) -> EngineResult {
        let title = title.trim();
        if title.is_empty() {
            return Ok(Outcome::Skipped);
        }
        self.create_column(title, "add_column", messages::CREATE_COLUMN)
            .await
    }

    pub async fn submit_add_column_modal(&mut self) -> EngineResult {
        match self.view.ui.add_column.clone() {
            Some(title) => self.add_column(&title).await,
            None => Ok(Outcome::Skipped),
        }
    }

    /// Create a copy of a column (title plus copy suffix). Tasks are not
    /// copied.
    pub async fn duplicate_column(&mut self, column_id: &str) -> EngineResult {
        let Some(column) = self.view.column(column_id) else {
            return Ok(Outcome::Skipped);
        };
        let title = copy_title(&column.title);
        self.create_column(&title, "duplicate_column", messages::DUPLICATE_COLUMN)
            .await
    }

    /// Duplicate the column selected in the context menu.
    pub async fn duplicate_selected_column(&mut self) -> EngineResult {
        match self.view.ui.selected_column().map(str::to_string) {
            Some(column_id) => self.duplicate_column(&column_id).await,
            None => Ok(Outcome::Skipped),
        }
    }

    async fn create_column(
        &mut self,
        title: &str,
        op: &'static str,
        message: &str,
    ) -> EngineResult {
        let body = ColumnBody {
            column_id: slugify(title),
            title: title.to_string(),
        };
        match self.column_store.create_column(&body).await {
            Ok(record) => {
                let column = record.into_column();
                log::info!(
                    "[taskboard.engine.{}] created column {} ({:?})",
                    op,
                    column.id,
                    column.db_id
                );
                self.view.columns.push(column);
                self.view.ui.add_column = None;
                self.view.ui.close_context_menu();
                Ok(Outcome::Applied)
            }
            Err(e) => Err(self.remote_failure(op, message, e)),
        }
    }

    /// Rename the column held in the edit form.
    ///
    /// A blank title is a no-op. A column without a backing-store id cannot
    /// be renamed durably and is reported as not found.
    pub async fn update_column(&mut self) -> EngineResult {
        let Some(ColumnEdit { column_id, title }) = self.view.ui.edit_column.clone() else {
            return Ok(Outcome::Skipped);
        };
        let title = title.trim();
        if title.is_empty() || column_id.is_empty() {
            return Ok(Outcome::Skipped);
        }
        let Some(db_id) = self.view.column(&column_id).and_then(|c| c.db_id) else {
            log::warn!("[taskboard.engine.update_column] no backing id for column {}", column_id);
            self.view.ui.error.show(messages::COLUMN_NOT_FOUND);
            return Err(EngineError::ColumnNotFound(column_id));
        };

        let body = ColumnBody {
            column_id: column_id.clone(),
            title: title.to_string(),
        };
        match self.column_store.update_column(db_id, &body).await {
            Ok(record) => {
                if let Some(column) = self.view.columns.iter_mut().find(|c| c.id == column_id) {
                    column.title = record.title;
                }
                self.view.ui.edit_column = None;
                Ok(Outcome::Applied)
            }
            Err(e) => Err(self.remote_failure("update_column", messages::UPDATE_COLUMN, e)),
        }
    }

    /// Seed the edit form for `column_id` and submit it.
    pub async fn rename_column(&mut self, column_id: &str, title: &str) -> EngineResult {
        self.view.ui.edit_column = Some(ColumnEdit {
            column_id: column_id.to_string(),
            title: title.to_string(),
        });
        self.update_column().await
    }

    /// Delete a column after the user confirms, then pull its tasks back to
    /// the default lane.
    ///
    /// A task is affected when its lane or its legacy status names the
    /// deleted column. Affected tasks get status `todo` locally right away;
    /// the matching store updates are fired without waiting for them.
    pub async fn delete_column(
        &mut self,
        column_id: &str,
        confirm: impl FnOnce(&str) -> bool,
    ) -> EngineResult {
        let Some(column) = self.view.column(column_id).cloned() else {
            return Ok(Outcome::Skipped);
        };
        let Some(db_id) = column.db_id else {
            log::debug!("[taskboard.engine.delete_column] column {} was never stored", column_id);
            return Ok(Outcome::Skipped);
        };
        if !confirm(&format!("Delete board \"{}\"?", column.title)) {
            return Ok(Outcome::Cancelled);
        }

        if let Err(e) = self.column_store.delete_column(db_id).await {
            return Err(self.remote_failure("delete_column", messages::DELETE_COLUMN, e));
        }

        self.view.columns.retain(|c| c.id != column.id);
        self.view.ui.close_context_menu();

        let mut reassignments = Vec::new();
        for task in self.view.tasks.iter_mut() {
            let in_lane = task.lane() == column.id;
            let status_names_lane = task.status.as_str() == column.id;
            if !in_lane && !status_names_lane {
                continue;
            }
            task.status = Status::Todo;
            if in_lane {
                task.column_id = Some(DEFAULT_LANE.to_string());
            }
            if let Some(id) = task.id {
                reassignments.push(if in_lane {
                    Reassignment::Lane(id)
                } else {
                    Reassignment::StatusOnly(TaskRecord::from_task(task))
                });
            }
        }
        log::info!(
            "[taskboard.engine.delete_column] deleted {}, reassigning {} tasks",
            column.id,
            reassignments.len()
        );
        for reassignment in reassignments {
            self.spawn_reassignment(reassignment);
        }
        Ok(Outcome::Applied)
    }

    /// Delete the column selected in the context menu.
    pub async fn delete_selected_column(
        &mut self,
        confirm: impl FnOnce(&str) -> bool,
    ) -> EngineResult {
        match self.view.ui.selected_column().map(str::to_string) {
            Some(column_id) => self.delete_column(&column_id, confirm).await,
            None => Ok(Outcome::Skipped),
        }
    }

    fn spawn_reassignment(&mut self, reassignment: Reassignment) {
        let store: Arc<dyn TaskStore> = Arc::clone(&self.task_store);
        let handle = tokio::spawn(async move {
            let (id, result) = match reassignment {
                Reassignment::Lane(id) => {
                    (id, store.update_task_status(id, Status::Todo).await.map(drop))
                }
                Reassignment::StatusOnly(record) => {
                    let id = record.id.unwrap_or_default();
                    (id, store.update_task(id, &record).await.map(drop))
                }
            };
            if let Err(e) = result {
                log::warn!(
                    "[taskboard.engine.delete_column] could not reassign task {}: {}",
                    id,
                    e
                );
            }
        });
        self.background.push(handle);
    }

    /// Move a column header. Local order changes immediately; the new order
    /// is then pushed to the store. A failed push is reported but the local
    /// order is kept.
    pub async fn reorder_columns(&mut self, previous_index: usize, current_index: usize) -> EngineResult {
        if previous_index == current_index || !move_item(&mut self.view.columns, previous_index, current_index) {
            return Ok(Outcome::Skipped);
        }
        let ordered: Vec<String> = self.view.columns.iter().map(|c| c.id.clone()).collect();
        match self.column_store.reorder_columns(&ordered).await {
            Ok(()) => {
                log::info!("[taskboard.engine.reorder_columns] order saved: {:?}", ordered);
                Ok(Outcome::Applied)
            }
            Err(e) => Err(self.remote_failure("reorder_columns", messages::REORDER_COLUMNS, e)),
        }
    }

    /// Ask the store to create the built-in lanes if it has none, then
    /// reload the column list.
    pub async fn initialize_default_columns(&mut self) -> EngineResult {
        if let Err(e) = self.column_store.initialize_default_columns().await {
            return Err(self.remote_failure(
                "initialize_columns",
                messages::INITIALIZE_COLUMNS,
                e,
            ));
        }
        let result = self.column_store.list_columns().await;
        match result {
            Ok(records) => {
                self.view.columns = records.into_iter().map(ColumnRecord::into_column).collect();
                Ok(Outcome::Applied)
            }
            Err(e) => Err(self.remote_failure(
                "initialize_columns",
                messages::INITIALIZE_COLUMNS,
                e,
            )),
        }
    }
}
