//! sw_status tool implementation.

use super::json_result;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use warden_client::{Network, ServiceWorker};

/// Implementation of the sw_status tool.
pub async fn status_impl<N: Network>(worker: &ServiceWorker<N>) -> Result<CallToolResult, McpError> {
    let status = worker.status().await?;
    json_result(&status)
}
