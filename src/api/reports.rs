//! Test reports.

use super::{ApiClient, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, endpoints};
use crate::error::ApiError;
use crate::models::{Page, TestReport};

pub struct ReportApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ReportApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn list(&self, page: u32, size: u32) -> Result<Page<TestReport>, ApiError> {
        self.client.fetch_json(&endpoints::reports::list(page, size)).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Status`] 404 for an unknown id.
    pub async fn get(&self, id: i64) -> Result<TestReport, ApiError> {
        self.client.fetch_json(&endpoints::reports::get(id)).await
    }

    /// Report generated for a plan execution.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] 404 if none was generated yet.
    pub async fn by_execution(&self, execution_id: i64) -> Result<TestReport, ApiError> {
        self.client.fetch_json(&endpoints::reports::by_execution(execution_id)).await
    }

    /// Build (or rebuild) the report of a finished plan execution.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] 400 for an unknown execution.
    pub async fn generate(&self, execution_id: i64) -> Result<TestReport, ApiError> {
        self.client.fetch_json(&endpoints::reports::generate(execution_id)).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] if the server rejects the delete.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.send_empty(&endpoints::reports::delete(id)).await
    }

    /// Reports whose plan name contains `plan_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn search(&self, plan_name: &str, page: u32, size: u32) -> Result<Page<TestReport>, ApiError> {
        self.client
            .fetch_json(&endpoints::reports::search(plan_name, page, size))
            .await
    }

    /// [`ReportApi::search`] on the first page with the default size.
    ///
    /// # Errors
    ///
    /// See [`ReportApi::search`].
    pub async fn search_first_page(&self, plan_name: &str) -> Result<Page<TestReport>, ApiError> {
        self.search(plan_name, DEFAULT_PAGE, DEFAULT_PAGE_SIZE).await
    }
}
