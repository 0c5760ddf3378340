//! cache_purge tool implementation.
//!
//! Deletes one named cache store, or every store but the current one.

use crate::tools::json_result;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use warden_client::{Network, ServiceWorker};

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Store to delete. When omitted, every stale store is deleted.
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Names of the deleted stores.
    pub deleted: Vec<String>,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl<N: Network>(
    worker: &ServiceWorker<N>, params: CachePurgeParams,
) -> Result<CallToolResult, McpError> {
    let store = params.store.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let deleted = worker.purge(store).await?;

    json_result(&CachePurgeOutput { deleted })
}
