//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker.
use std::sync::Arc;

use crate::tools::{
    GameLoadParams, SwFetchParams,
    cache::{CacheMatchParams, CachePurgeParams, match_impl, purge_impl},
    game_load::game_load_impl,
    lifecycle::{activate_impl, install_impl},
    sw_fetch::fetch_impl,
    sw_status::status_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use warden_client::{FetchClient, ServiceWorker};
use warden_core::LoadWatch;

/// The main MCP server handler for warden.
#[derive(Clone)]
pub struct WardenServer {
    tool_router: ToolRouter<Self>,
    worker: Arc<ServiceWorker<FetchClient>>,
    watch: LoadWatch,
    game_path: Arc<str>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl WardenServer {
    /// Create a new server handler around a worker.
    pub fn new(worker: Arc<ServiceWorker<FetchClient>>, watch: LoadWatch, game_path: &str) -> Self {
        Self { tool_router: Self::tool_router(), worker, watch, game_path: game_path.into() }
    }

    #[tool(description = "Install the offline worker: fetch every manifest asset into the current cache store. \
                          Missing assets are reported, not fatal.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&*self.worker).await
    }

    #[tool(description = "Activate the installed worker: delete every cache store except the current version \
                          and start intercepting requests.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&*self.worker).await
    }

    /// Fetch a path through the worker.
    ///
    /// Bundled game assets are served cache-first, pages network-first with cache fallback.
    #[tool(description = "Fetch a site path through the offline worker. Returns the response and whether it came \
                          from the cache or the network.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&*self.worker, params.0).await
    }

    #[tool(description = "Report the worker lifecycle state, cache stores and current store size.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&*self.worker).await
    }

    #[tool(description = "Load the embedded game document through the worker, reporting whether it loaded, \
                          failed, or stalled past the fallback threshold.")]
    async fn game_load(&self, params: Parameters<GameLoadParams>) -> Result<CallToolResult, McpError> {
        game_load_impl(&*self.worker, self.watch, &self.game_path, params.0).await
    }

    #[tool(description = "Look up the cached response for a path without using the network.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(&*self.worker, params.0).await
    }

    #[tool(description = "Delete a named cache store, or every stale store when no name is given.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&*self.worker, params.0).await
    }
}

impl ServerHandler for WardenServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "warden".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use warden_client::{FetchConfig, WorkerConfig};
    use warden_core::CacheDb;

    async fn server() -> WardenServer {
        let config = WorkerConfig::new("http://localhost:8080", "v1", Vec::new(), "/game/").unwrap();
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = FetchClient::new(FetchConfig::default()).unwrap();
        let worker = Arc::new(ServiceWorker::new(config, db, network));
        WardenServer::new(worker, LoadWatch::new(Duration::from_secs(5)), "/game/index.html")
    }

    #[tokio::test]
    async fn test_lists_every_tool() {
        let server = server().await;
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["cache_match", "cache_purge", "game_load", "sw_activate", "sw_fetch", "sw_install", "sw_status"]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let info = server().await.get_info();
        assert_eq!(info.server_info.name, "warden");
    }
}
