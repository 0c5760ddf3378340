//! MCP tool implementations.
//!
//! Each tool is a thin `*_impl` function over a `ServiceWorker`, generic over
//! its network so the tests can run against an in-memory one.

pub mod cache;
pub mod game_load;
pub mod lifecycle;
pub mod sw_fetch;
pub mod sw_status;

pub use game_load::GameLoadParams;
pub use sw_fetch::SwFetchParams;

use crate::error::ToolError;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Encode a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| ToolError::OutputFailed(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Upper-case and check an optional HTTP method, defaulting to GET.
pub(crate) fn method_or_get(method: Option<&str>) -> Result<String, ToolError> {
    let method = method.map(str::trim).filter(|m| !m.is_empty()).unwrap_or("GET");
    if !method.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(ToolError::InvalidInput(format!("invalid method: {method}")));
    }
    Ok(method.to_ascii_uppercase())
}
