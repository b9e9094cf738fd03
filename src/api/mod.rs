//! REST access to the platform, grouped by resource.
//!
//! SYSTEM CONTEXT
//! ==============
//! `endpoints` is the pure path/method table. [`ApiClient`] owns the HTTP
//! connection pool and turns an endpoint into a request; each resource
//! module exposes a borrowed view (`client.plans().get(3)`) with one method
//! per platform call.
//!
//! ERROR HANDLING
//! ==============
//! No retries and no recovery: transport errors and non-2xx responses are
//! returned to the caller as [`ApiError`], with the server's body text kept
//! verbatim so its own messages stay visible.

pub mod endpoints;
mod executions;
mod nodes;
mod plans;
mod reports;
mod scripts;
mod tasks;

use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ApiError;
use endpoints::Endpoint;

pub use executions::{ExecutionResultApi, PlanExecutionApi};
pub use nodes::NodeApi;
pub use plans::PlanApi;
pub use reports::ReportApi;
pub use scripts::{ScriptApi, ScriptUpload};
pub use tasks::{ResultApi, TaskApi};

/// Page index used by listings when the caller does not pick one.
pub const DEFAULT_PAGE: u32 = 0;
/// Page size used by listings when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// HTTP client bound to one platform API base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying HTTP client cannot be
    /// constructed (e.g. TLS backend initialization failure).
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()?;
        Ok(Self { http, base_url: config.api_url.trim_end_matches('/').to_owned() })
    }

    /// Build a client for `base_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::new`].
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        Self::new(&ClientConfig::default().with_api_url(base_url))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn scripts(&self) -> ScriptApi<'_> {
        ScriptApi::new(self)
    }

    #[must_use]
    pub fn plans(&self) -> PlanApi<'_> {
        PlanApi::new(self)
    }

    #[must_use]
    pub fn plan_executions(&self) -> PlanExecutionApi<'_> {
        PlanExecutionApi::new(self)
    }

    #[must_use]
    pub fn nodes(&self) -> NodeApi<'_> {
        NodeApi::new(self)
    }

    #[must_use]
    pub fn tasks(&self) -> TaskApi<'_> {
        TaskApi::new(self)
    }

    #[must_use]
    pub fn results(&self) -> ResultApi<'_> {
        ResultApi::new(self)
    }

    #[must_use]
    pub fn reports(&self) -> ReportApi<'_> {
        ReportApi::new(self)
    }

    #[must_use]
    pub fn execution_results(&self) -> ExecutionResultApi<'_> {
        ExecutionResultApi::new(self)
    }

    // =========================================================================
    // TRANSPORT
    // =========================================================================

    fn request(&self, endpoint: &Endpoint) -> Result<RequestBuilder, ApiError> {
        let url = endpoint.url(&self.base_url)?;
        tracing::debug!(method = %endpoint.method, %url, "api request");
        Ok(self.http.request(endpoint.method.clone(), url))
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "api request rejected");
            return Err(ApiError::Status { status: status.as_u16(), body });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub(crate) async fn fetch_json<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, ApiError> {
        let response = self.execute(self.request(endpoint)?).await?;
        Self::decode(response).await
    }

    pub(crate) async fn send_json<B, T>(&self, endpoint: &Endpoint, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(self.request(endpoint)?.json(body)).await?;
        Self::decode(response).await
    }

    /// Like [`ApiClient::fetch_json`], but a 204 or an empty body is `None`.
    pub(crate) async fn fetch_optional_json<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
    ) -> Result<Option<T>, ApiError> {
        let response = self.execute(self.request(endpoint)?).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Send `body` as a raw `text/plain` request body.
    pub(crate) async fn send_text<T: DeserializeOwned>(&self, endpoint: &Endpoint, body: String) -> Result<T, ApiError> {
        let builder = self.request(endpoint)?.header(CONTENT_TYPE, "text/plain").body(body);
        let response = self.execute(builder).await?;
        Self::decode(response).await
    }

    pub(crate) async fn send_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let response = self.execute(self.request(endpoint)?.multipart(form)).await?;
        Self::decode(response).await
    }

    /// Send and discard whatever body a success response carries.
    pub(crate) async fn send_empty(&self, endpoint: &Endpoint) -> Result<(), ApiError> {
        self.execute(self.request(endpoint)?).await?;
        Ok(())
    }

    pub(crate) async fn fetch_text(&self, endpoint: &Endpoint) -> Result<String, ApiError> {
        let response = self.execute(self.request(endpoint)?).await?;
        Ok(response.text().await?)
    }

    pub(crate) async fn fetch_bytes(&self, endpoint: &Endpoint) -> Result<Vec<u8>, ApiError> {
        let response = self.execute(self.request(endpoint)?).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
