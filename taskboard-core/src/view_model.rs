//! In-memory mirror of the board.
//!
//! Read access is public. Every mutator is crate-private so that local
//! state only changes through the reconciliation engine.

use serde::Serialize;

use crate::types::{Column, Task, TaskId};
use crate::ui::UiState;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub(crate) columns: Vec<Column>,
    pub(crate) tasks: Vec<Task>,
    pub(crate) loading: bool,
    pub(crate) ui: UiState,
}

impl ViewModel {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.ui.error.message()
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == Some(id))
    }

    /// Tasks displayed in a lane, in task-list order.
    pub fn tasks_by_column(&self, column_id: &str) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.lane() == column_id).collect()
    }

    pub fn task_count(&self, column_id: &str) -> usize {
        self.tasks.iter().filter(|t| t.lane() == column_id).count()
    }

    /// Drop containers a task in `current` may be dragged into.
    pub fn connected_columns(&self, current: &str) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.id != current)
            .map(Column::container_id)
            .collect()
    }

    /// Index into the task list of the `index`-th task of a lane.
    pub(crate) fn lane_position(&self, lane: &str, index: usize) -> Option<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.lane() == lane)
            .nth(index)
            .map(|(pos, _)| pos)
    }

    pub(crate) fn position_of(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == Some(id))
    }

    /// Take the task at `from` out of the list and put it back so that it
    /// becomes the `index`-th task of its (possibly new) lane. An index past
    /// the end of the lane appends after the lane's last task.
    pub(crate) fn place_in_lane(&mut self, from: usize, index: usize) {
        let task = self.tasks.remove(from);
        let slots: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.lane() == task.lane())
            .map(|(pos, _)| pos)
            .collect();
        let at = match slots.get(index) {
            Some(&pos) => pos,
            None => slots.last().map_or(self.tasks.len(), |&pos| pos + 1),
        };
        self.tasks.insert(at, task);
    }
}

/// Move an element within a slice-backed vector, clamping both indices to
/// the valid range. Returns false for an empty vector.
pub(crate) fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if items.is_empty() {
        return false;
    }
    let last = items.len() - 1;
    let from = from.min(last);
    let to = to.min(last);
    let item = items.remove(from);
    items.insert(to, item);
    true
}
