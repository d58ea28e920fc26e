//! Per-task request sequencing for cross-column moves.
//!
//! Every move request gets a token. Only the response carrying the latest
//! token for its task may touch local state; responses to superseded
//! requests are dropped, so the last gesture wins regardless of the order
//! in which the store answers.

use std::collections::HashMap;

use crate::types::TaskId;

/// A move that has been requested but not yet applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTicket {
    pub task_id: TaskId,
    pub target_column: String,
    token: u64,
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    next_token: u64,
    in_flight: HashMap<TaskId, u64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket, superseding any move still in flight for the task.
    pub fn issue(&mut self, task_id: TaskId, target_column: &str) -> MoveTicket {
        self.next_token += 1;
        self.in_flight.insert(task_id, self.next_token);
        MoveTicket {
            task_id,
            target_column: target_column.to_string(),
            token: self.next_token,
        }
    }

    pub fn is_current(&self, ticket: &MoveTicket) -> bool {
        self.in_flight.get(&ticket.task_id) == Some(&ticket.token)
    }

    /// Retire a ticket. Returns false when a newer request superseded it.
    pub fn settle(&mut self, ticket: &MoveTicket) -> bool {
        if self.is_current(ticket) {
            self.in_flight.remove(&ticket.task_id);
            true
        } else {
            false
        }
    }

    pub fn in_flight(&self, task_id: TaskId) -> bool {
        self.in_flight.contains_key(&task_id)
    }
}
