//! sw_install and sw_activate tool implementations.

use super::json_result;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use warden_client::{Network, ServiceWorker};

/// Implementation of the sw_install tool.
pub async fn install_impl<N: Network>(worker: &ServiceWorker<N>) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;
    json_result(&report)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl<N: Network>(worker: &ServiceWorker<N>) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&report)
}
