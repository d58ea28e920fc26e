//! REST adapter for the task and column stores.
//!
//! Tasks live under `/api/tasks`, columns under `/api/columns`. Enum path
//! segments are sent upper-cased, free-form segments are percent-encoded.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use taskboard_core::store::{ColumnStore, StoreError, StoreResult, TaskStore};
use taskboard_core::types::{ColumnDbId, Status, TaskId};
use taskboard_core::wire::{ColumnBody, ColumnRecord, NewTaskBody, ReorderBody, StatusBody, TaskRecord};

/// Characters left as-is in a path segment (RFC 3986 unreserved).
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}

#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
}

impl RestStore {
    pub fn new(base_url: &str, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tasks_url(&self, path: &str) -> String {
        format!("{}/api/tasks{}", self.base_url, path)
    }

    fn columns_url(&self, path: &str) -> String {
        format!("{}/api/columns{}", self.base_url, path)
    }

    async fn fetch<T: DeserializeOwned>(&self, op: &str, request: RequestBuilder) -> StoreResult<T> {
        let response = self.execute(op, request).await?;
        response.json::<T>().await.map_err(|e| {
            log::warn!("[taskboard.rest] {}: undecodable response: {}", op, e);
            StoreError::Decode(e.to_string())
        })
    }

    async fn execute(&self, op: &str, request: RequestBuilder) -> StoreResult<Response> {
        let response = request.send().await.map_err(|e| {
            log::warn!("[taskboard.rest] {}: {}", op, e);
            StoreError::Transport(e.to_string())
        })?;
        let status = response.status();
        if status.is_success() {
            log::debug!("[taskboard.rest] {} -> {}", op, status);
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        log::warn!("[taskboard.rest] {} -> {}: {}", op, status, body);
        Err(match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(body),
            StatusCode::CONFLICT => StoreError::Conflict(body),
            _ => StoreError::Status {
                status: status.as_u16(),
                body,
            },
        })
    }
}

#[async_trait]
impl TaskStore for RestStore {
    async fn list_tasks(&self) -> StoreResult<Vec<TaskRecord>> {
        self.fetch("list_tasks", self.client.get(self.tasks_url(""))).await
    }

    async fn get_task(&self, id: TaskId) -> StoreResult<TaskRecord> {
        self.fetch("get_task", self.client.get(self.tasks_url(&format!("/{}", id))))
            .await
    }

    async fn list_tasks_by_status(&self, status: Status) -> StoreResult<Vec<TaskRecord>> {
        let url = self.tasks_url(&format!("/status/{}", status.as_wire()));
        self.fetch("list_tasks_by_status", self.client.get(url)).await
    }

    async fn list_tasks_by_column(&self, column_id: &str) -> StoreResult<Vec<TaskRecord>> {
        let url = self.tasks_url(&format!("/column/{}", segment(column_id)));
        self.fetch("list_tasks_by_column", self.client.get(url)).await
    }

    async fn list_tasks_by_assignee(&self, assignee: &str) -> StoreResult<Vec<TaskRecord>> {
        let url = self.tasks_url(&format!("/assignee/{}", segment(assignee)));
        self.fetch("list_tasks_by_assignee", self.client.get(url)).await
    }

    async fn count_tasks_by_status(&self, status: Status) -> StoreResult<u64> {
        let url = self.tasks_url(&format!("/count/{}", status.as_wire()));
        self.fetch("count_tasks_by_status", self.client.get(url)).await
    }

    async fn count_tasks_by_column(&self, column_id: &str) -> StoreResult<u64> {
        let url = self.tasks_url(&format!("/count/column/{}", segment(column_id)));
        self.fetch("count_tasks_by_column", self.client.get(url)).await
    }

    async fn create_task(&self, body: &NewTaskBody) -> StoreResult<TaskRecord> {
        let request = self.client.post(self.tasks_url("")).json(body);
        self.fetch("create_task", request).await
    }

    async fn update_task(&self, id: TaskId, record: &TaskRecord) -> StoreResult<TaskRecord> {
        let request = self.client.put(self.tasks_url(&format!("/{}", id))).json(record);
        self.fetch("update_task", request).await
    }

    async fn update_task_status(&self, id: TaskId, status: Status) -> StoreResult<TaskRecord> {
        let request = self
            .client
            .patch(self.tasks_url(&format!("/{}/status", id)))
            .json(&StatusBody::new(status));
        self.fetch("update_task_status", request).await
    }

    async fn delete_task(&self, id: TaskId) -> StoreResult<()> {
        let request = self.client.delete(self.tasks_url(&format!("/{}", id)));
        self.execute("delete_task", request).await.map(drop)
    }

    async fn move_task_to_column(&self, id: TaskId, column_id: &str) -> StoreResult<TaskRecord> {
        let url = self.tasks_url(&format!("/{}/move-to-column/{}", id, segment(column_id)));
        self.fetch("move_task_to_column", self.client.patch(url)).await
    }
}

#[async_trait]
impl ColumnStore for RestStore {
    async fn list_columns(&self) -> StoreResult<Vec<ColumnRecord>> {
        self.fetch("list_columns", self.client.get(self.columns_url(""))).await
    }

    async fn get_column(&self, id: ColumnDbId) -> StoreResult<ColumnRecord> {
        let url = self.columns_url(&format!("/{}", id));
        self.fetch("get_column", self.client.get(url)).await
    }

    async fn create_column(&self, body: &ColumnBody) -> StoreResult<ColumnRecord> {
        let request = self.client.post(self.columns_url("")).json(body);
        self.fetch("create_column", request).await
    }

    async fn update_column(&self, id: ColumnDbId, body: &ColumnBody) -> StoreResult<ColumnRecord> {
        let request = self.client.put(self.columns_url(&format!("/{}", id))).json(body);
        self.fetch("update_column", request).await
    }

    async fn delete_column(&self, id: ColumnDbId) -> StoreResult<()> {
        let request = self.client.delete(self.columns_url(&format!("/{}", id)));
        self.execute("delete_column", request).await.map(drop)
    }

    async fn reorder_columns(&self, column_ids: &[String]) -> StoreResult<()> {
        let body = ReorderBody {
            column_ids: column_ids.to_vec(),
        };
        let request = self.client.put(self.columns_url("/reorder")).json(&body);
        self.execute("reorder_columns", request).await.map(drop)
    }

    async fn initialize_default_columns(&self) -> StoreResult<()> {
        let request = self.client.post(self.columns_url("/initialize"));
        self.execute("initialize_default_columns", request).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("my_board"), "my_board");
        assert_eq!(segment("João Silva"), "Jo%C3%A3o%20Silva");
        assert_eq!(segment("a/b"), "a%2Fb");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let store = RestStore::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(store.base_url(), "http://localhost:8080");
        assert_eq!(store.tasks_url("/7/status"), "http://localhost:8080/api/tasks/7/status");
        assert_eq!(store.columns_url("/reorder"), "http://localhost:8080/api/columns/reorder");
    }
}
