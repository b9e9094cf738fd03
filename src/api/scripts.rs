//! Test script management.

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::{ApiClient, endpoints};
use crate::error::ApiError;
use crate::models::{Page, TestScript};

/// Form fields and file for creating or replacing a script.
///
/// The platform stores the uploaded file under its scripts directory and
/// takes the remaining metadata as plain form fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptUpload {
    pub name: String,
    pub description: String,
    pub parameters: Option<String>,
    pub script_type: String,
    /// Seconds.
    pub timeout: u32,
    pub retry_count: u32,
    pub file_name: String,
    pub content: Vec<u8>,
}

impl ScriptUpload {
    fn into_form(self) -> Form {
        let file = Part::bytes(self.content).file_name(self.file_name);
        let form = Form::new()
            .text("name", self.name)
            .text("description", self.description)
            .text("scriptType", self.script_type)
            .text("timeout", self.timeout.to_string())
            .text("retryCount", self.retry_count.to_string());
        let form = match self.parameters {
            Some(parameters) => form.text("parameters", parameters),
            None => form,
        };
        form.part("scriptFile", file)
    }
}

pub struct ScriptApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ScriptApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// `GET /scripts?page&size`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-2xx status, or an
    /// unexpected payload.
    pub async fn list(&self, page: u32, size: u32) -> Result<Page<TestScript>, ApiError> {
        self.client.fetch_json(&endpoints::scripts::list(page, size)).await
    }

    /// `GET /scripts/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 404 for an unknown id.
    pub async fn get(&self, id: i64) -> Result<TestScript, ApiError> {
        self.client.fetch_json(&endpoints::scripts::get(id)).await
    }

    /// `POST /scripts` as multipart form data.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the upload is rejected.
    pub async fn create(&self, upload: ScriptUpload) -> Result<TestScript, ApiError> {
        self.client
            .send_multipart(&endpoints::scripts::create(), upload.into_form())
            .await
    }

    /// `PUT /scripts/{id}` as multipart form data.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the upload is rejected or the id is unknown.
    pub async fn update(&self, id: i64, upload: ScriptUpload) -> Result<TestScript, ApiError> {
        self.client
            .send_multipart(&endpoints::scripts::update(id), upload.into_form())
            .await
    }

    /// `DELETE /scripts/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the server rejects the delete.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.send_empty(&endpoints::scripts::delete(id)).await
    }

    /// `POST /scripts/{id}/execute`; the server's outcome object.
    ///
    /// A failed run comes back as [`ApiError::Status`] 500 whose body is the
    /// same outcome object.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or when the run fails.
    pub async fn execute(&self, id: i64) -> Result<Value, ApiError> {
        self.client.fetch_json(&endpoints::scripts::execute(id)).await
    }

    /// `GET /scripts/download?filePath`; the script source as text.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 404 when the file is missing.
    pub async fn download(&self, file_path: &str) -> Result<String, ApiError> {
        self.client.fetch_text(&endpoints::scripts::download(file_path)).await
    }
}
