//! cache_match tool implementation.
//!
//! Reads the stored entry for a request identity. Never touches the network.

use crate::tools::{json_result, method_or_get};
use crate::error::ToolError;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use warden_client::{Network, ServiceWorker};

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// Path relative to the site origin, or an absolute URL.
    pub path: String,

    /// HTTP method of the stored request (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchOutput {
    pub store: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body_len: usize,
    pub stored_at: String,
}

/// Implementation of the cache_match tool.
pub async fn match_impl<N: Network>(
    worker: &ServiceWorker<N>, params: CacheMatchParams,
) -> Result<CallToolResult, McpError> {
    if params.path.trim().is_empty() {
        return Err(ToolError::InvalidInput("path cannot be empty".into()).into());
    }
    let method = method_or_get(params.method.as_deref())?;

    let entry = worker.match_cached(&method, &params.path).await?;

    let output = CacheMatchOutput {
        store: entry.store,
        method: entry.request.method,
        url: entry.request.url,
        status: entry.response.status,
        body_len: entry.response.body.len(),
        headers: entry.response.headers,
        stored_at: entry.stored_at,
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, output, worker};

    #[tokio::test]
    async fn test_match_impl_missing() {
        let worker = worker(&[], StubNetwork::default()).await;
        let params = CacheMatchParams { path: "/play.html".into(), method: None };

        let result = match_impl(&worker, params).await;
        assert_eq!(result.unwrap_err().code.0, -32001);
    }

    #[tokio::test]
    async fn test_match_impl_found() {
        let worker = worker(&["/css/style.css"], StubNetwork::with(&[("/css/style.css", 200, "body{}")])).await;
        worker.install().await.unwrap();

        let params = CacheMatchParams { path: "/css/style.css".into(), method: None };
        let out: CacheMatchOutput = output(&match_impl(&worker, params).await.unwrap());

        assert_eq!(out.store, "v1");
        assert_eq!(out.url, "https://site.test/css/style.css");
        assert_eq!(out.body_len, 6);
    }
}
