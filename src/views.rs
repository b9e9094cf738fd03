//! Data each console screen loads when it is opened.

use serde::Serialize;
use serde_json::Value;

use crate::api::{ApiClient, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::error::ApiError;
use crate::routes::View;

/// Run the REST call `view` makes on entry and return its payload as JSON.
///
/// Returns `Ok(None)` for views without remote data (the home screen).
///
/// # Errors
///
/// Returns the [`ApiError`] of the underlying call unchanged.
pub async fn load_view(client: &ApiClient, view: View) -> Result<Option<Value>, ApiError> {
    let value = match view {
        View::Home => return Ok(None),
        View::TestScripts => to_value(&client.scripts().list(DEFAULT_PAGE, DEFAULT_PAGE_SIZE).await?)?,
        View::TestPlans => to_value(&client.plans().list(DEFAULT_PAGE, DEFAULT_PAGE_SIZE).await?)?,
        View::TestTasks => to_value(&client.tasks().list().await?)?,
        View::TestResults { task_id } => to_value(&client.results().by_task(task_id).await?)?,
        View::TestReports => to_value(&client.reports().list(DEFAULT_PAGE, DEFAULT_PAGE_SIZE).await?)?,
        View::TestReportDetail { id } => to_value(&client.reports().get(id).await?)?,
        View::ExecutionNodes => to_value(&client.nodes().list().await?)?,
    };
    Ok(Some(value))
}

fn to_value<T: Serialize>(payload: &T) -> Result<Value, ApiError> {
    Ok(serde_json::to_value(payload)?)
}

#[cfg(test)]
#[path = "views_test.rs"]
mod tests;
