//! Execution nodes.

use super::{ApiClient, endpoints};
use crate::error::ApiError;
use crate::models::{ExecutionNode, NodeStatus};

pub struct NodeApi<'a> {
    client: &'a ApiClient,
}

impl<'a> NodeApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Every registered node, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn list(&self) -> Result<Vec<ExecutionNode>, ApiError> {
        self.client.fetch_json(&endpoints::nodes::list()).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Status`] 404 for an unknown id.
    pub async fn get(&self, id: i64) -> Result<ExecutionNode, ApiError> {
        self.client.fetch_json(&endpoints::nodes::get(id)).await
    }

    /// One `ONLINE` node picked by the server, or `None` when every node is
    /// busy or offline (204).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn available(&self) -> Result<Option<ExecutionNode>, ApiError> {
        self.client.fetch_optional_json(&endpoints::nodes::available()).await
    }

    /// Force a node's status, addressed by its registration `nodeId`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] 404 for an unknown node.
    pub async fn update_status(&self, node_id: &str, status: &NodeStatus) -> Result<ExecutionNode, ApiError> {
        self.client
            .send_text(&endpoints::nodes::update_status(node_id), status.as_str().to_owned())
            .await
    }

    /// Deregister a node by its registration `nodeId`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the server rejects the delete.
    pub async fn delete(&self, node_id: &str) -> Result<(), ApiError> {
        self.client.send_empty(&endpoints::nodes::delete(node_id)).await
    }
}
