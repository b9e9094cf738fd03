//! Test plans.

use serde::Serialize;

use super::{ApiClient, endpoints};
use crate::error::ApiError;
use crate::models::{Page, TestPlan};

pub struct PlanApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PlanApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// `GET /plans?page&size`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn list(&self, page: u32, size: u32) -> Result<Page<TestPlan>, ApiError> {
        self.client.fetch_json(&endpoints::plans::list(page, size)).await
    }

    /// `GET /plans/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 404 for an unknown id.
    pub async fn get(&self, id: i64) -> Result<TestPlan, ApiError> {
        self.client.fetch_json(&endpoints::plans::get(id)).await
    }

    /// `POST /plans` with a JSON body, typically `name`, `description`,
    /// `scriptIds` and `executionEndpointType`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the plan is rejected.
    pub async fn create<B: Serialize + ?Sized>(&self, plan: &B) -> Result<TestPlan, ApiError> {
        self.client.send_json(&endpoints::plans::create(), plan).await
    }

    /// `PUT /plans/{id}` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the plan is rejected or unknown.
    pub async fn update<B: Serialize + ?Sized>(&self, id: i64, plan: &B) -> Result<TestPlan, ApiError> {
        self.client.send_json(&endpoints::plans::update(id), plan).await
    }

    /// `DELETE /plans/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the server rejects the delete.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.send_empty(&endpoints::plans::delete(id)).await
    }
}
