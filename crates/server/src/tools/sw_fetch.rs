//! sw_fetch tool implementation.
//!
//! Sends one request through the worker and reports where the answer came from.

use super::{json_result, method_or_get};
use crate::error::ToolError;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use warden_client::{Network, Policy, ServiceWorker, Source};

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Path relative to the site origin (e.g. "/play.html") or an absolute URL.
    pub path: String,

    /// HTTP method (default: GET). Only GET requests are cached.
    #[serde(default)]
    pub method: Option<String>,
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_len: usize,
    pub source: Source,
    /// Policy applied, absent for passthrough requests.
    pub policy: Option<Policy>,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<N: Network>(
    worker: &ServiceWorker<N>, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.path.trim().is_empty() {
        return Err(ToolError::InvalidInput("path cannot be empty".into()).into());
    }
    let method = method_or_get(params.method.as_deref())?;

    let outcome = worker.fetch(&method, &params.path).await?;

    let output = SwFetchOutput {
        method: outcome.request.method,
        url: outcome.request.url,
        status: outcome.response.status,
        body: String::from_utf8_lossy(&outcome.response.body).into_owned(),
        body_len: outcome.response.body.len(),
        headers: outcome.response.headers,
        source: outcome.source,
        policy: outcome.policy,
    };

    json_result(&output)
}
