//! Reconciliation engine.
//!
//! Turns board gestures into store requests and merges the results back
//! into the [`ViewModel`]. Each operation ends in one of three ways:
//! - success: local state is patched from the store's response
//! - store failure: the error banner is set and the change is skipped, or
//!   local tasks are reloaded wholesale (failed moves)
//! - no identity / store unreachable on load: local-only fallback
//!
//! Every failure is logged and written to the single error slot before it
//! is returned.

mod columns;
mod drag;
mod load;
mod tasks;

pub use drag::DropEvent;
pub use load::LoadSource;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::sequence::RequestTracker;
use crate::store::{ColumnStore, StoreError, TaskStore};
use crate::types::TaskDraft;
use crate::ui::{ColumnEdit, DismissToken};
use crate::view_model::ViewModel;

/// User-facing messages written to the error slot.
pub mod messages {
    pub const LOAD_TASKS: &str = "Failed to load tasks. Check that the backend is running.";
    pub const LOAD_COLUMNS: &str = "Failed to load boards. Check that the backend is running.";
    pub const CREATE_TASK: &str = "Failed to create task. Please try again.";
    pub const UPDATE_TASK: &str = "Failed to update task. Please try again.";
    pub const DELETE_TASK: &str = "Failed to delete task. Please try again.";
    pub const MOVE_TASK: &str = "Failed to move task. Please try again.";
    pub const COUNT_TASKS: &str = "Failed to count tasks.";
    pub const CREATE_COLUMN: &str = "Failed to create board. A board with this name already exists.";
    pub const DUPLICATE_COLUMN: &str = "Failed to duplicate board. Please try again.";
    pub const UPDATE_COLUMN: &str = "Failed to update board. Please try again.";
    pub const DELETE_COLUMN: &str = "Failed to delete board. Please try again.";
    pub const REORDER_COLUMNS: &str = "Failed to reorder boards.";
    pub const INITIALIZE_COLUMNS: &str = "Failed to initialize boards.";
    pub const COLUMN_NOT_FOUND: &str = "Error: column not found.";
}

/// How an operation that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The change reached local state.
    Applied,
    /// A precondition was not met; nothing was sent.
    Skipped,
    /// The user declined the confirmation prompt.
    Cancelled,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// The column has no backing-store id and cannot be changed remotely.
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("{op} failed: {source}")]
    Remote {
        op: &'static str,
        #[source]
        source: StoreError,
    },
}

pub type EngineResult<T = Outcome> = Result<T, EngineError>;

/// Degradation policy when the stores are unreachable during load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Show the demo tasks when the task list cannot be fetched.
    pub fallback_to_demo_data: bool,
    /// Show the built-in lanes when the column list cannot be fetched.
    pub fallback_to_default_columns: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            fallback_to_demo_data: true,
            fallback_to_default_columns: true,
        }
    }
}

pub struct Engine {
    task_store: Arc<dyn TaskStore>,
    column_store: Arc<dyn ColumnStore>,
    view: ViewModel,
    options: EngineOptions,
    moves: RequestTracker,
    /// Fire-and-forget requests (lane reassignment after a column delete).
    background: Vec<JoinHandle<()>>,
}

impl Engine {
    pub fn new(task_store: Arc<dyn TaskStore>, column_store: Arc<dyn ColumnStore>) -> Self {
        Self {
            task_store,
            column_store,
            view: ViewModel {
                columns: crate::types::default_columns(),
                ..ViewModel::default()
            },
            options: EngineOptions::default(),
            moves: RequestTracker::new(),
            background: Vec::new(),
        }
    }

    /// Engine over a single value implementing both store ports.
    pub fn with_store<S>(store: Arc<S>) -> Self
    where
        S: TaskStore + ColumnStore + 'static,
    {
        let task_store: Arc<dyn TaskStore> = store.clone();
        let column_store: Arc<dyn ColumnStore> = store;
        Self::new(task_store, column_store)
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Wait for every fire-and-forget request issued so far. Their failures
    /// have already been logged; nothing is reported back.
    pub async fn settle_background(&mut self) {
        for handle in self.background.drain(..) {
            if let Err(e) = handle.await {
                log::warn!("[taskboard.engine.background] request task aborted: {}", e);
            }
        }
    }

    // ── Error slot ──────────────────────────────────────────────────────

    pub fn dismiss_error(&mut self) {
        self.view.ui.error.clear();
    }

    /// Start the banner's exit transition. Pass the token to
    /// [`Engine::finish_error_dismissal`] once the transition ends.
    pub fn begin_error_dismissal(&mut self) -> Option<DismissToken> {
        self.view.ui.error.begin_dismiss()
    }

    pub fn finish_error_dismissal(&mut self, token: DismissToken) -> bool {
        self.view.ui.error.finish_dismiss(token)
    }

    fn remote_failure(
        &mut self,
        op: &'static str,
        message: &str,
        source: StoreError,
    ) -> EngineError {
        log::error!("[taskboard.engine.{}] {}", op, source);
        self.view.ui.error.show(message);
        EngineError::Remote { op, source }
    }

    // ── Modals and context menu ─────────────────────────────────────────

    /// Open the add-task modal with a fresh draft targeting the first column.
    pub fn open_add_task_modal(&mut self) -> &mut TaskDraft {
        let column_id = self
            .view
            .columns
            .first()
            .map(|c| c.id.clone())
            .unwrap_or_else(|| crate::types::DEFAULT_LANE.to_string());
        self.view
            .ui
            .add_task
            .insert(TaskDraft::default().in_column(column_id))
    }

    pub fn add_task_draft_mut(&mut self) -> Option<&mut TaskDraft> {
        self.view.ui.add_task.as_mut()
    }

    pub fn close_add_task_modal(&mut self) {
        self.view.ui.add_task = None;
    }

    pub fn open_add_column_modal(&mut self) -> &mut String {
        self.view.ui.add_column.insert(String::new())
    }

    pub fn add_column_title_mut(&mut self) -> Option<&mut String> {
        self.view.ui.add_column.as_mut()
    }

    pub fn close_add_column_modal(&mut self) {
        self.view.ui.add_column = None;
    }

    /// Open the context menu for a column. Unknown columns are ignored.
    pub fn open_column_menu(&mut self, column_id: &str, x: f64, y: f64) -> bool {
        if self.view.column(column_id).is_none() {
            return false;
        }
        self.view.ui.open_context_menu(column_id, x, y);
        true
    }

    pub fn close_column_menu(&mut self) {
        self.view.ui.close_context_menu();
    }

    /// Route a click outside the menu. Only does something while the menu
    /// is open.
    pub fn handle_outside_click(&mut self) -> bool {
        self.view.ui.close_context_menu().is_some()
    }

    /// Seed the edit form from the menu selection and close the menu.
    pub fn begin_edit_column(&mut self) -> Option<&mut ColumnEdit> {
        let column_id = self.view.ui.selected_column()?.to_string();
        let title = self.view.column(&column_id)?.title.clone();
        self.view.ui.close_context_menu();
        Some(self.view.ui.edit_column.insert(ColumnEdit { column_id, title }))
    }

    pub fn column_edit_mut(&mut self) -> Option<&mut ColumnEdit> {
        self.view.ui.edit_column.as_mut()
    }

    pub fn cancel_edit_column(&mut self) {
        self.view.ui.edit_column = None;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_add_task_modal_targets_first_column() {
        let (_store, mut engine) = loaded(Vec::new()).await;
        engine.reorder_columns(2, 0).await.unwrap();
        let draft = engine.open_add_task_modal();
        assert_eq!(draft.column_id, "done");
        assert_eq!(draft.status, crate::types::Status::Todo);
        engine.close_add_task_modal();
        assert!(engine.view().ui().add_task_draft().is_none());
    }

    #[tokio::test]
    async fn test_context_menu_lifecycle() {
        let (_store, mut engine) = loaded(Vec::new()).await;
        assert!(!engine.open_column_menu("missing", 1.0, 1.0));
        assert!(engine.open_column_menu("doing", 5.0, 6.0));
        assert!(engine.view().ui().outside_click_armed());
        assert!(engine.handle_outside_click());
        assert!(!engine.view().ui().outside_click_armed());
        assert!(!engine.handle_outside_click());
    }

    #[tokio::test]
    async fn test_begin_edit_seeds_from_selection() {
        let (_store, mut engine) = loaded(Vec::new()).await;
        assert!(engine.begin_edit_column().is_none());

        engine.open_column_menu("doing", 0.0, 0.0);
        let edit = engine.begin_edit_column().unwrap();
        assert_eq!(edit.column_id, "doing");
        assert_eq!(edit.title, "In Progress");
        assert!(engine.view().ui().context_menu().is_none());
    }

    #[tokio::test]
    async fn test_error_dismissal_paths() {
        let (store, mut engine) = loaded(Vec::new()).await;
        store.set_offline(true);
        engine.add_task(crate::types::TaskDraft::titled("x")).await.unwrap_err();
        assert!(engine.view().error().is_some());
        engine.dismiss_error();
        assert!(engine.view().error().is_none());

        engine.add_task(crate::types::TaskDraft::titled("x")).await.unwrap_err();
        let token = engine.begin_error_dismissal().unwrap();
        assert!(engine.view().ui().error().is_closing());
        assert!(engine.finish_error_dismissal(token));
        assert!(engine.view().error().is_none());
    }
}
