//! Payload types exchanged with the platform REST API.
//!
//! DESIGN
//! ======
//! Field names follow the server's camelCase JSON. Everything but `id` is
//! optional and unknown fields are ignored, so new server columns never
//! break decoding. Timestamps stay as the server's ISO-8601 strings; the
//! console only displays them.

use serde::{Deserialize, Serialize};

// =============================================================================
// STATUS VOCABULARIES
// =============================================================================

/// Lifecycle of a plan execution, its per-script logs, and a plan's last run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionStatus {
    Executing,
    Success,
    Failure,
    Other(String),
}

impl From<String> for ExecutionStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "EXECUTING" => Self::Executing,
            "SUCCESS" => Self::Success,
            "FAILURE" => Self::Failure,
            _ => Self::Other(raw),
        }
    }
}

impl From<ExecutionStatus> for String {
    fn from(status: ExecutionStatus) -> Self {
        match status {
            ExecutionStatus::Executing => "EXECUTING".to_owned(),
            ExecutionStatus::Success => "SUCCESS".to_owned(),
            ExecutionStatus::Failure => "FAILURE".to_owned(),
            ExecutionStatus::Other(raw) => raw,
        }
    }
}

impl ExecutionStatus {
    /// Finished either way.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

/// Availability reported by an execution node's heartbeat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeStatus {
    Online,
    Busy,
    Offline,
    Other(String),
}

impl From<String> for NodeStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "ONLINE" => Self::Online,
            "BUSY" => Self::Busy,
            "OFFLINE" => Self::Offline,
            _ => Self::Other(raw),
        }
    }
}

impl From<NodeStatus> for String {
    fn from(status: NodeStatus) -> Self {
        status.as_str().to_owned()
    }
}

impl NodeStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Online => "ONLINE",
            Self::Busy => "BUSY",
            Self::Offline => "OFFLINE",
            Self::Other(raw) => raw,
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// One page of a paginated listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    /// Zero-based page index.
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.number.saturating_add(1) >= self.total_pages
    }
}

// =============================================================================
// RESOURCES
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestScript {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub script_content: Option<String>,
    pub parameters: Option<String>,
    pub script_type: Option<String>,
    /// Seconds.
    pub timeout: Option<i32>,
    pub retry_count: Option<i32>,
    pub file_path: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionNode {
    pub id: i64,
    pub node_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub host: Option<String>,
    pub port: Option<i32>,
    pub status: Option<NodeStatus>,
    pub os_info: Option<String>,
    pub cpu_info: Option<String>,
    pub memory_info: Option<String>,
    pub last_heartbeat: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestPlan {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub scripts: Vec<TestScript>,
    pub script_ids: Vec<i64>,
    pub last_execution_status: Option<ExecutionStatus>,
    pub last_execution_time: Option<String>,
    pub last_execution_node: Option<ExecutionNode>,
    /// `MiniApp`, `Web`, `App` or `Api`.
    pub execution_endpoint_type: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestPlanExecution {
    pub id: i64,
    pub test_plan: Option<TestPlan>,
    pub execution_node: Option<ExecutionNode>,
    pub status: Option<ExecutionStatus>,
    pub total_scripts: Option<i32>,
    pub success_scripts: Option<i32>,
    pub failed_scripts: Option<i32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Per-script log line of a plan execution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestPlanExecutionLog {
    pub id: i64,
    pub test_script: Option<TestScript>,
    pub status: Option<ExecutionStatus>,
    pub result: Option<String>,
    pub error_message: Option<String>,
    /// Milliseconds.
    pub execution_time: Option<i64>,
    pub log_content: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestExecutionTask {
    pub id: i64,
    pub plan: Option<TestPlan>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub environment: Option<String>,
    pub executor: Option<String>,
    pub execution_node_id: Option<String>,
    pub error_message: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestResult {
    pub id: i64,
    pub task: Option<TestExecutionTask>,
    pub script: Option<TestScript>,
    pub status: Option<String>,
    pub output: Option<String>,
    pub error: Option<String>,
    /// Milliseconds.
    pub duration: Option<i64>,
    pub executed_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestReport {
    pub id: i64,
    pub execution_id: Option<i64>,
    pub plan_name: Option<String>,
    pub name: Option<String>,
    pub total_scripts: Option<i32>,
    pub success_scripts: Option<i32>,
    pub failed_scripts: Option<i32>,
    /// Percentage in `0.0..=100.0`.
    pub pass_rate: Option<f64>,
    pub generation_time: Option<String>,
    pub generated_at: Option<String>,
    /// JSON document with chart data, stored by the server as text.
    pub report_data: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl TestReport {
    /// Parse the embedded chart document, if present and valid.
    #[must_use]
    pub fn chart_data(&self) -> Option<serde_json::Value> {
        self.report_data
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// One run of a single script.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestExecutionResult {
    pub id: i64,
    pub test_script: Option<TestScript>,
    /// `running`, `success` or `error`.
    pub status: Option<String>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Milliseconds.
    pub execution_time: Option<i64>,
    pub log_file_path: Option<String>,
}

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;
