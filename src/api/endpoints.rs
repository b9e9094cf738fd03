//! REST endpoint table.
//!
//! Each function names one platform call and returns its method, path
//! segments and query pairs without doing any I/O. The resource wrappers in
//! the sibling modules send what these build, so the whole path/method table
//! is checked by plain unit tests.

use reqwest::{Method, Url};

use crate::error::ApiError;

/// One HTTP call against the platform, relative to the API base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    segments: Vec<String>,
    query: Vec<(&'static str, String)>,
}

impl Endpoint {
    fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| (*s).to_owned()).collect(),
            query: Vec::new(),
        }
    }

    fn get(segments: &[&str]) -> Self {
        Self::new(Method::GET, segments)
    }

    fn post(segments: &[&str]) -> Self {
        Self::new(Method::POST, segments)
    }

    fn put(segments: &[&str]) -> Self {
        Self::new(Method::PUT, segments)
    }

    fn delete(segments: &[&str]) -> Self {
        Self::new(Method::DELETE, segments)
    }

    fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    /// Unencoded path, e.g. `/plan-executions/3/logs`.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    #[must_use]
    pub fn query_pairs(&self) -> &[(&'static str, String)] {
        &self.query
    }

    /// Absolute URL under `base`, with path segments and query values encoded.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] if `base` is not an absolute
    /// hierarchical URL.
    pub fn url(&self, base: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(base).map_err(|e| ApiError::InvalidBaseUrl(format!("{base}: {e}")))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidBaseUrl(base.to_owned()))?;
            path.pop_if_empty();
            path.extend(&self.segments);
        }
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

pub mod scripts {
    use super::Endpoint;

    #[must_use]
    pub fn list(page: u32, size: u32) -> Endpoint {
        Endpoint::get(&["scripts"]).query("page", page).query("size", size)
    }

    #[must_use]
    pub fn get(id: i64) -> Endpoint {
        Endpoint::get(&["scripts", id.to_string().as_str()])
    }

    #[must_use]
    pub fn create() -> Endpoint {
        Endpoint::post(&["scripts"])
    }

    #[must_use]
    pub fn update(id: i64) -> Endpoint {
        Endpoint::put(&["scripts", id.to_string().as_str()])
    }

    #[must_use]
    pub fn delete(id: i64) -> Endpoint {
        Endpoint::delete(&["scripts", id.to_string().as_str()])
    }

    #[must_use]
    pub fn execute(id: i64) -> Endpoint {
        Endpoint::post(&["scripts", id.to_string().as_str(), "execute"])
    }

    #[must_use]
    pub fn download(file_path: &str) -> Endpoint {
        Endpoint::get(&["scripts", "download"]).query("filePath", file_path)
    }
}

pub mod plans {
    use super::Endpoint;

    #[must_use]
    pub fn list(page: u32, size: u32) -> Endpoint {
        Endpoint::get(&["plans"]).query("page", page).query("size", size)
    }

    #[must_use]
    pub fn get(id: i64) -> Endpoint {
        Endpoint::get(&["plans", id.to_string().as_str()])
    }

    #[must_use]
    pub fn create() -> Endpoint {
        Endpoint::post(&["plans"])
    }

    #[must_use]
    pub fn update(id: i64) -> Endpoint {
        Endpoint::put(&["plans", id.to_string().as_str()])
    }

    #[must_use]
    pub fn delete(id: i64) -> Endpoint {
        Endpoint::delete(&["plans", id.to_string().as_str()])
    }
}

pub mod plan_executions {
    use super::Endpoint;

    #[must_use]
    pub fn execute(plan_id: i64, node_id: i64) -> Endpoint {
        Endpoint::post(&["plan-executions"])
            .query("planId", plan_id)
            .query("nodeIdList", node_id)
    }

    #[must_use]
    pub fn get(id: i64) -> Endpoint {
        Endpoint::get(&["plan-executions", id.to_string().as_str()])
    }

    #[must_use]
    pub fn by_plan(plan_id: i64) -> Endpoint {
        Endpoint::get(&["plan-executions", "plan", plan_id.to_string().as_str()])
    }

    #[must_use]
    pub fn logs(execution_id: i64) -> Endpoint {
        Endpoint::get(&["plan-executions", execution_id.to_string().as_str(), "logs"])
    }

    #[must_use]
    pub fn logs_page(execution_id: i64, page: u32, size: u32) -> Endpoint {
        Endpoint::get(&["plan-executions", execution_id.to_string().as_str(), "logs", "page"])
            .query("page", page)
            .query("size", size)
    }

    #[must_use]
    pub fn download_log(plan_id: i64, execution_id: i64, script_id: i64) -> Endpoint {
        Endpoint::get(&["plan-executions", "logs", "download"])
            .query("planId", plan_id)
            .query("executionId", execution_id)
            .query("scriptId", script_id)
    }
}

pub mod nodes {
    use super::Endpoint;

    #[must_use]
    pub fn list() -> Endpoint {
        Endpoint::get(&["execution-nodes"])
    }

    #[must_use]
    pub fn get(id: i64) -> Endpoint {
        Endpoint::get(&["execution-nodes", id.to_string().as_str()])
    }

    #[must_use]
    pub fn available() -> Endpoint {
        Endpoint::get(&["execution-nodes", "available"])
    }

    /// The new status travels as the plain-text request body.
    #[must_use]
    pub fn update_status(node_id: &str) -> Endpoint {
        Endpoint::put(&["execution-nodes", node_id, "status"])
    }

    #[must_use]
    pub fn delete(node_id: &str) -> Endpoint {
        Endpoint::delete(&["execution-nodes", node_id])
    }
}

pub mod tasks {
    use super::Endpoint;

    #[must_use]
    pub fn list() -> Endpoint {
        Endpoint::get(&["tasks"])
    }

    #[must_use]
    pub fn get(id: i64) -> Endpoint {
        Endpoint::get(&["tasks", id.to_string().as_str()])
    }

    #[must_use]
    pub fn create() -> Endpoint {
        Endpoint::post(&["tasks"])
    }

    #[must_use]
    pub fn update(id: i64) -> Endpoint {
        Endpoint::put(&["tasks", id.to_string().as_str()])
    }

    #[must_use]
    pub fn execute(id: i64) -> Endpoint {
        Endpoint::post(&["tasks", id.to_string().as_str(), "execute"])
    }

    #[must_use]
    pub fn start(id: i64) -> Endpoint {
        Endpoint::post(&["tasks", id.to_string().as_str(), "start"])
    }

    #[must_use]
    pub fn stop(id: i64) -> Endpoint {
        Endpoint::post(&["tasks", id.to_string().as_str(), "stop"])
    }

    #[must_use]
    pub fn delete(id: i64) -> Endpoint {
        Endpoint::delete(&["tasks", id.to_string().as_str()])
    }
}

pub mod results {
    use super::Endpoint;

    #[must_use]
    pub fn list() -> Endpoint {
        Endpoint::get(&["results"])
    }

    #[must_use]
    pub fn get(id: i64) -> Endpoint {
        Endpoint::get(&["results", id.to_string().as_str()])
    }

    #[must_use]
    pub fn by_task(task_id: i64) -> Endpoint {
        Endpoint::get(&["results", "task", task_id.to_string().as_str()])
    }
}

pub mod reports {
    use super::Endpoint;

    #[must_use]
    pub fn list(page: u32, size: u32) -> Endpoint {
        Endpoint::get(&["reports"]).query("page", page).query("size", size)
    }

    #[must_use]
    pub fn get(id: i64) -> Endpoint {
        Endpoint::get(&["reports", id.to_string().as_str()])
    }

    #[must_use]
    pub fn by_execution(execution_id: i64) -> Endpoint {
        Endpoint::get(&["reports", "execution", execution_id.to_string().as_str()])
    }

    #[must_use]
    pub fn generate(execution_id: i64) -> Endpoint {
        Endpoint::post(&["reports", "generate", execution_id.to_string().as_str()])
    }

    #[must_use]
    pub fn delete(id: i64) -> Endpoint {
        Endpoint::delete(&["reports", id.to_string().as_str()])
    }

    #[must_use]
    pub fn search(plan_name: &str, page: u32, size: u32) -> Endpoint {
        Endpoint::get(&["reports", "search"])
            .query("planName", plan_name)
            .query("page", page)
            .query("size", size)
    }
}

pub mod execution_results {
    use super::Endpoint;

    #[must_use]
    pub fn by_script(script_id: i64) -> Endpoint {
        Endpoint::get(&["execution-results", "script", script_id.to_string().as_str()])
    }

    #[must_use]
    pub fn last_by_script(script_id: i64) -> Endpoint {
        Endpoint::get(&["execution-results", "script", script_id.to_string().as_str(), "last"])
    }

    #[must_use]
    pub fn get(id: i64) -> Endpoint {
        Endpoint::get(&["execution-results", id.to_string().as_str()])
    }

    #[must_use]
    pub fn delete(id: i64) -> Endpoint {
        Endpoint::delete(&["execution-results", id.to_string().as_str()])
    }

    #[must_use]
    pub fn download_log(id: i64) -> Endpoint {
        Endpoint::get(&["execution-results", id.to_string().as_str(), "log"])
    }
}

#[cfg(test)]
#[path = "endpoints_test.rs"]
mod tests;
