//! Plan executions and single-script execution results.

use super::{ApiClient, endpoints};
use crate::error::ApiError;
use crate::models::{Page, TestExecutionResult, TestPlanExecution, TestPlanExecutionLog};

pub struct PlanExecutionApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PlanExecutionApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Run a plan on one node: `POST /plan-executions?planId&nodeIdList`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] 404 for an unknown plan, 400 for a bad
    /// node, 500 when dispatch fails.
    pub async fn execute(&self, plan_id: i64, node_id: i64) -> Result<TestPlanExecution, ApiError> {
        self.client
            .fetch_json(&endpoints::plan_executions::execute(plan_id, node_id))
            .await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn get(&self, id: i64) -> Result<TestPlanExecution, ApiError> {
        self.client.fetch_json(&endpoints::plan_executions::get(id)).await
    }

    /// All executions of a plan.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn by_plan(&self, plan_id: i64) -> Result<Vec<TestPlanExecution>, ApiError> {
        self.client.fetch_json(&endpoints::plan_executions::by_plan(plan_id)).await
    }

    /// Every per-script log of an execution.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn logs(&self, execution_id: i64) -> Result<Vec<TestPlanExecutionLog>, ApiError> {
        self.client.fetch_json(&endpoints::plan_executions::logs(execution_id)).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn logs_page(
        &self,
        execution_id: i64,
        page: u32,
        size: u32,
    ) -> Result<Page<TestPlanExecutionLog>, ApiError> {
        self.client
            .fetch_json(&endpoints::plan_executions::logs_page(execution_id, page, size))
            .await
    }

    /// Raw log file of one script within one execution.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] 404 when the log file does not exist.
    pub async fn download_log(&self, plan_id: i64, execution_id: i64, script_id: i64) -> Result<Vec<u8>, ApiError> {
        self.client
            .fetch_bytes(&endpoints::plan_executions::download_log(plan_id, execution_id, script_id))
            .await
    }
}

pub struct ExecutionResultApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ExecutionResultApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn by_script(&self, script_id: i64) -> Result<Vec<TestExecutionResult>, ApiError> {
        self.client.fetch_json(&endpoints::execution_results::by_script(script_id)).await
    }

    /// Most recent run of a script.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] 404 when the script never ran.
    pub async fn last_by_script(&self, script_id: i64) -> Result<TestExecutionResult, ApiError> {
        self.client
            .fetch_json(&endpoints::execution_results::last_by_script(script_id))
            .await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn get(&self, id: i64) -> Result<TestExecutionResult, ApiError> {
        self.client.fetch_json(&endpoints::execution_results::get(id)).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] if the server rejects the delete.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.send_empty(&endpoints::execution_results::delete(id)).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Status`] 404 when the run has no log file.
    pub async fn download_log(&self, id: i64) -> Result<Vec<u8>, ApiError> {
        self.client.fetch_bytes(&endpoints::execution_results::download_log(id)).await
    }
}
