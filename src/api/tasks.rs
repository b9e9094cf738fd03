//! Execution tasks and their per-script results.

use serde::Serialize;

use super::{ApiClient, endpoints};
use crate::error::ApiError;
use crate::models::{TestExecutionTask, TestResult};

pub struct TaskApi<'a> {
    client: &'a ApiClient,
}

impl<'a> TaskApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn list(&self) -> Result<Vec<TestExecutionTask>, ApiError> {
        self.client.fetch_json(&endpoints::tasks::list()).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Status`] 404 for an unknown id.
    pub async fn get(&self, id: i64) -> Result<TestExecutionTask, ApiError> {
        self.client.fetch_json(&endpoints::tasks::get(id)).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] if the task is rejected.
    pub async fn create<B: Serialize + ?Sized>(&self, task: &B) -> Result<TestExecutionTask, ApiError> {
        self.client.send_json(&endpoints::tasks::create(), task).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] if the task is rejected or unknown.
    pub async fn update<B: Serialize + ?Sized>(&self, id: i64, task: &B) -> Result<TestExecutionTask, ApiError> {
        self.client.send_json(&endpoints::tasks::update(id), task).await
    }

    /// Queue the task for execution.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the server refuses to run the task.
    pub async fn execute(&self, id: i64) -> Result<TestExecutionTask, ApiError> {
        self.client.fetch_json(&endpoints::tasks::execute(id)).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] if the server refuses to start the task.
    pub async fn start(&self, id: i64) -> Result<TestExecutionTask, ApiError> {
        self.client.fetch_json(&endpoints::tasks::start(id)).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] if the server refuses to stop the task.
    pub async fn stop(&self, id: i64) -> Result<TestExecutionTask, ApiError> {
        self.client.fetch_json(&endpoints::tasks::stop(id)).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] if the server rejects the delete.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.send_empty(&endpoints::tasks::delete(id)).await
    }
}

pub struct ResultApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ResultApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn list(&self) -> Result<Vec<TestResult>, ApiError> {
        self.client.fetch_json(&endpoints::results::list()).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Status`] 404 for an unknown id.
    pub async fn get(&self, id: i64) -> Result<TestResult, ApiError> {
        self.client.fetch_json(&endpoints::results::get(id)).await
    }

    /// Results recorded for one task, as shown by the results screen.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn by_task(&self, task_id: i64) -> Result<Vec<TestResult>, ApiError> {
        self.client.fetch_json(&endpoints::results::by_task(task_id)).await
    }
}
