use super::{messages, Engine, EngineResult, Outcome};
use crate::types::{Status, Task, TaskDraft, TaskId};
use crate::wire::{NewTaskBody, TaskRecord};

impl Engine {
    /// Create a task from a draft. An empty title is a silent no-op.
    ///
    /// The draft's status is ignored: new tasks are always created as
    /// `todo`, whatever column they are created in.
    pub async fn add_task(&mut self, draft: TaskDraft) -> EngineResult {
        if draft.title.is_empty() {
            return Ok(Outcome::Skipped);
        }
        let draft = TaskDraft {
            status: Status::Todo,
            ..draft
        };
        let body = NewTaskBody::from_draft(&draft);

        self.view.loading = true;
        let result = self.task_store.create_task(&body).await;
        self.view.loading = false;

        match result {
            Ok(record) => {
                let task = record.into_task();
                log::info!(
                    "[taskboard.engine.add_task] created task {:?} in {}",
                    task.id,
                    task.lane()
                );
                self.view.tasks.push(task);
                self.view.ui.add_task = None;
                Ok(Outcome::Applied)
            }
            Err(e) => Err(self.remote_failure("add_task", messages::CREATE_TASK, e)),
        }
    }

    /// Submit the add-task modal's draft.
    pub async fn submit_add_task_modal(&mut self) -> EngineResult {
        match self.view.ui.add_task.clone() {
            Some(draft) => self.add_task(draft).await,
            None => Ok(Outcome::Skipped),
        }
    }

    /// Replace every editable field of a persisted task with `task`'s.
    /// The stored version comes back normalized and replaces the local one
    /// in place.
    pub async fn update_task(&mut self, task: Task) -> EngineResult {
        let Some(id) = task.id else {
            return Ok(Outcome::Skipped);
        };
        if task.title.trim().is_empty() || self.view.position_of(id).is_none() {
            return Ok(Outcome::Skipped);
        }
        let record = TaskRecord::from_task(&task);
        match self.task_store.update_task(id, &record).await {
            Ok(record) => {
                let updated = record.into_task();
                // The task may have been removed while the request was out.
                if let Some(pos) = self.view.position_of(id) {
                    self.view.tasks[pos] = updated;
                }
                Ok(Outcome::Applied)
            }
            Err(e) => Err(self.remote_failure("update_task", messages::UPDATE_TASK, e)),
        }
    }

    /// Delete a persisted task after the user confirms.
    pub async fn delete_task(
        &mut self,
        id: TaskId,
        confirm: impl FnOnce(&str) -> bool,
    ) -> EngineResult {
        let Some(task) = self.view.task(id) else {
            return Ok(Outcome::Skipped);
        };
        let prompt = format!("Delete task \"{}\"?", task.title);
        if !confirm(&prompt) {
            return Ok(Outcome::Cancelled);
        }

        match self.task_store.delete_task(id).await {
            Ok(()) => {
                self.view.tasks.retain(|t| t.id != Some(id));
                log::info!("[taskboard.engine.delete_task] deleted task {}", id);
                Ok(Outcome::Applied)
            }
            Err(e) => Err(self.remote_failure("delete_task", messages::DELETE_TASK, e)),
        }
    }

    /// Store-side task counts for the built-in lanes.
    pub async fn status_counts(&mut self) -> EngineResult<Vec<(Status, u64)>> {
        let mut counts = Vec::with_capacity(Status::ALL.len());
        for status in Status::ALL {
            match self.task_store.count_tasks_by_status(status).await {
                Ok(count) => counts.push((status, count)),
                Err(e) => return Err(self.remote_failure("status_counts", messages::COUNT_TASKS, e)),
            }
        }
        Ok(counts)
    }
}
