use super::{messages, Engine, EngineResult, Outcome};
use crate::sequence::MoveTicket;
use crate::store::StoreResult;
use crate::types::{column_id_from_container, container_id, Status, TaskId};
use crate::wire::TaskRecord;

/// A finished task drag, in drop-container terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropEvent {
    pub previous_container: String,
    pub container: String,
    /// Position of the dragged task within its source lane.
    pub previous_index: usize,
    /// Requested position within the target lane.
    pub current_index: usize,
}

impl DropEvent {
    /// Drop from one column into another, addressed by column id.
    pub fn between(from_column: &str, to_column: &str, previous_index: usize, current_index: usize) -> Self {
        Self {
            previous_container: container_id(from_column),
            container: container_id(to_column),
            previous_index,
            current_index,
        }
    }

    /// Reorder within a single column.
    pub fn within(column: &str, previous_index: usize, current_index: usize) -> Self {
        Self::between(column, column, previous_index, current_index)
    }

    pub fn is_same_container(&self) -> bool {
        self.previous_container == self.container
    }
}

impl Engine {
    /// Apply a task drop.
    ///
    /// Reordering inside a lane is local only. A persisted task dropped in
    /// another lane is moved remotely first and only shown in its new lane
    /// once the store confirms; a failed move reloads the task list. A task
    /// that was never stored moves locally, and only takes a new status when
    /// the target is one of the built-in lanes.
    pub async fn drop_task(&mut self, event: DropEvent) -> EngineResult {
        let source = column_id_from_container(&event.previous_container);
        let Some(from) = self.view.lane_position(&source, event.previous_index) else {
            log::warn!(
                "[taskboard.engine.drop] no task at {}[{}]",
                source,
                event.previous_index
            );
            return Ok(Outcome::Skipped);
        };

        if event.is_same_container() {
            if event.previous_index == event.current_index {
                return Ok(Outcome::Skipped);
            }
            self.view.place_in_lane(from, event.current_index);
            return Ok(Outcome::Applied);
        }

        let target = column_id_from_container(&event.container);
        match self.view.tasks[from].id {
            Some(id) => {
                let ticket = self.begin_move(id, &target);
                let result = self.task_store.move_task_to_column(id, &target).await;
                self.complete_move(ticket, event.current_index, result).await
            }
            None => {
                let task = &mut self.view.tasks[from];
                if let Some(status) = Status::from_lane(&target) {
                    task.status = status;
                }
                task.column_id = Some(target);
                self.view.place_in_lane(from, event.current_index);
                Ok(Outcome::Applied)
            }
        }
    }

    /// Register a remote move for `task_id`. Local state is not touched
    /// until the ticket is passed to [`Engine::complete_move`].
    pub fn begin_move(&mut self, task_id: TaskId, target_column: &str) -> MoveTicket {
        log::debug!("[taskboard.engine.move] task {} -> {}", task_id, target_column);
        self.moves.issue(task_id, target_column)
    }

    /// Whether a remote move for the task is still awaiting its response.
    pub fn is_moving(&self, task_id: TaskId) -> bool {
        self.moves.in_flight(task_id)
    }

    /// Apply the store's answer to a move.
    ///
    /// Answers to superseded tickets are dropped whether they succeeded or
    /// failed. On success the task takes the stored status and column and is
    /// placed at `index` in its new lane.
    pub async fn complete_move(
        &mut self,
        ticket: MoveTicket,
        index: usize,
        result: StoreResult<TaskRecord>,
    ) -> EngineResult {
        if !self.moves.settle(&ticket) {
            log::debug!(
                "[taskboard.engine.move] dropping stale response for task {} -> {}",
                ticket.task_id,
                ticket.target_column
            );
            return Ok(Outcome::Skipped);
        }

        match result {
            Ok(record) => {
                let stored = record.into_task();
                let Some(from) = self.view.position_of(ticket.task_id) else {
                    log::warn!(
                        "[taskboard.engine.move] task {} vanished before its move landed",
                        ticket.task_id
                    );
                    return Ok(Outcome::Skipped);
                };
                let task = &mut self.view.tasks[from];
                task.status = stored.status;
                task.column_id = stored.column_id.or(Some(ticket.target_column));
                task.updated_at = stored.updated_at;
                self.view.place_in_lane(from, index);
                Ok(Outcome::Applied)
            }
            Err(e) => {
                let err = self.remote_failure("move_task", messages::MOVE_TASK, e);
                self.resync_tasks().await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::*;
    use crate::store::memory::StoreOp;
    use crate::store::{StoreError, TaskStore};
    use crate::types::Task;

    #[tokio::test]
    async fn test_move_doing_to_done() {
        let (store, mut engine) = loaded(vec![
            persisted(3, "Other", "done"),
            persisted(7, "Ship it", "doing"),
        ])
        .await;

        let outcome = engine
            .drop_task(DropEvent::between("doing", "done", 0, 0))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);

        let task = engine.view().task(7).unwrap();
        assert_eq!(task.status, Status::Done);
        assert_eq!(task.column_id.as_deref(), Some("done"));
        assert_eq!(lane_ids(&engine, "done"), vec![7, 3]);
        assert!(lane_ids(&engine, "doing").is_empty());
        assert_eq!(store.calls(), vec![StoreOp::MoveTaskToColumn]);
        assert!(!engine.is_moving(7));
    }

    #[tokio::test]
    async fn test_same_column_reorder_is_local() {
        let (store, mut engine) = loaded(vec![
            persisted(1, "A", "todo"),
            persisted(2, "B", "todo"),
            persisted(3, "C", "todo"),
        ])
        .await;

        engine.drop_task(DropEvent::within("todo", 0, 2)).await.unwrap();
        assert_eq!(lane_ids(&engine, "todo"), vec![2, 3, 1]);
        assert!(store.calls().is_empty());

        let outcome = engine.drop_task(DropEvent::within("todo", 1, 1)).await.unwrap();
        assert_eq!(outcome, Outcome::Skipped);
    }

    #[tokio::test]
    async fn test_local_state_waits_for_store() {
        let (store, mut engine) = loaded(vec![persisted(1, "A", "todo")]).await;

        let ticket = engine.begin_move(1, "done");
        assert_eq!(lane_ids(&engine, "todo"), vec![1]);
        assert!(engine.is_moving(1));

        let result = store.move_task_to_column(1, "done").await;
        engine.complete_move(ticket, 0, result).await.unwrap();
        assert_eq!(lane_ids(&engine, "done"), vec![1]);
    }

    #[tokio::test]
    async fn test_failed_move_resyncs_from_store() {
        let (store, mut engine) = loaded(vec![
            persisted(1, "A", "todo"),
            persisted(2, "B", "doing"),
        ])
        .await;
        // The server has changed since the last load.
        store.seed_task(persisted(5, "Added elsewhere", "done"));
        store.fail(StoreOp::MoveTaskToColumn);

        let err = engine
            .drop_task(DropEvent::between("todo", "doing", 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::engine::EngineError::Remote { op: "move_task", .. }));
        assert_eq!(engine.view().error(), Some(messages::MOVE_TASK));
        assert_eq!(engine.view().tasks(), store.tasks().as_slice());
        assert_eq!(lane_ids(&engine, "todo"), vec![1]);
        assert_eq!(store.calls(), vec![StoreOp::MoveTaskToColumn, StoreOp::ListTasks]);
    }

    #[tokio::test]
    async fn test_stale_move_is_ignored() {
        let (store, mut engine) = loaded(vec![persisted(1, "A", "todo")]).await;

        let first = engine.begin_move(1, "done");
        let second = engine.begin_move(1, "doing");
        let second_result = store.move_task_to_column(1, "doing").await;
        let first_result = store.move_task_to_column(1, "done").await;

        assert_eq!(
            engine.complete_move(second, 0, second_result).await.unwrap(),
            Outcome::Applied
        );
        assert_eq!(
            engine.complete_move(first, 0, first_result).await.unwrap(),
            Outcome::Skipped
        );
        assert_eq!(engine.view().task(1).unwrap().status, Status::Doing);
        assert_eq!(lane_ids(&engine, "doing"), vec![1]);
    }

    #[tokio::test]
    async fn test_stale_failure_does_not_reload() {
        let (store, mut engine) = loaded(vec![persisted(1, "A", "todo")]).await;

        let first = engine.begin_move(1, "done");
        let _second = engine.begin_move(1, "doing");
        let failure = Err(StoreError::Transport("timed out".to_string()));

        assert_eq!(engine.complete_move(first, 0, failure).await.unwrap(), Outcome::Skipped);
        assert!(engine.view().error().is_none());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsaved_task_moves_locally() {
        let (store, mut engine) = loaded(vec![persisted(1, "Saved", "review")]).await;
        engine.view.tasks.push(Task {
            id: None,
            column_id: Some("doing".to_string()),
            status: Status::Doing,
            ..persisted(0, "Draft", "doing")
        });

        engine
            .drop_task(DropEvent::between("doing", "review", 0, 0))
            .await
            .unwrap();
        let draft = engine.view().tasks().iter().find(|t| t.id.is_none()).unwrap();
        assert_eq!(draft.lane(), "review");
        assert_eq!(draft.status, Status::Doing);
        assert_eq!(engine.view().task_count("review"), 2);

        engine
            .drop_task(DropEvent::between("review", "done", 0, 0))
            .await
            .unwrap();
        let draft = engine.view().tasks().iter().find(|t| t.id.is_none()).unwrap();
        assert_eq!(draft.status, Status::Done);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_drop_from_empty_slot_is_skipped() {
        let (store, mut engine) = loaded(Vec::new()).await;
        let outcome = engine
            .drop_task(DropEvent::between("todo", "done", 3, 0))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped);
        assert!(store.calls().is_empty());
    }
}
