//! game_load tool implementation.
//!
//! Loads the embedded game document through the worker under the stall
//! watchdog, reporting what the page would have shown.

use super::json_result;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use warden_client::{Network, ServiceWorker, Source};
use warden_core::{LoadState, LoadWatch};

/// Input parameters for the game_load tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GameLoadParams {
    /// Game document path (default: the configured game path).
    #[serde(default)]
    pub path: Option<String>,
}

/// Output structure for the game_load tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GameLoadOutput {
    pub path: String,
    pub state: LoadState,
    /// The fallback threshold passed before the document answered.
    pub stalled: bool,
    pub messages: Vec<String>,
    pub elapsed_ms: u64,
    pub fallback_ms: u64,
    pub status: Option<u16>,
    pub source: Option<Source>,
    pub error: Option<String>,
}

/// Implementation of the game_load tool.
pub async fn game_load_impl<N: Network>(
    worker: &ServiceWorker<N>, watch: LoadWatch, default_path: &str, params: GameLoadParams,
) -> Result<CallToolResult, McpError> {
    let path = params
        .path
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| default_path.to_string());

    let report = watch.watch(worker.load_document(&path)).await;

    let (status, source, error) = match &report.result {
        Ok(outcome) => (Some(outcome.response.status), Some(outcome.source), None),
        Err(e) => (None, None, Some(e.to_string())),
    };

    let output = GameLoadOutput {
        path,
        state: report.state,
        stalled: report.stalled,
        messages: report.messages,
        elapsed_ms: report.elapsed.as_millis() as u64,
        fallback_ms: watch.fallback_after().as_millis() as u64,
        status,
        source,
        error,
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, output, worker};
    use std::time::Duration;

    #[tokio::test]
    async fn test_game_load_success() {
        let worker = worker(&[], StubNetwork::with(&[("/game/index.html", 200, "<canvas>")])).await;
        let watch = LoadWatch::new(Duration::from_secs(5));

        let result = game_load_impl(&worker, watch, "/game/index.html", GameLoadParams::default())
            .await
            .unwrap();
        let out: GameLoadOutput = output(&result);

        assert_eq!(out.state, LoadState::Loaded);
        assert!(!out.stalled);
        assert_eq!(out.status, Some(200));
        assert_eq!(out.fallback_ms, 5000);
    }

    #[tokio::test]
    async fn test_game_load_missing_files() {
        let worker = worker(&[], StubNetwork::with(&[("/game/index.html", 404, "")])).await;
        let watch = LoadWatch::new(Duration::from_secs(5));

        let result = game_load_impl(&worker, watch, "/game/index.html", GameLoadParams::default())
            .await
            .unwrap();
        let out: GameLoadOutput = output(&result);

        assert_eq!(out.state, LoadState::Failed);
        assert_eq!(out.messages, vec!["Game files not found"]);
        assert!(out.error.unwrap().starts_with("HTTP_ERROR"));
    }

    #[tokio::test]
    async fn test_game_load_path_override() {
        let worker = worker(&[], StubNetwork::with(&[("/game/v2.html", 200, "<canvas>")])).await;
        let watch = LoadWatch::new(Duration::from_secs(5));
        let params = GameLoadParams { path: Some("/game/v2.html".into()) };

        let out: GameLoadOutput = output(&game_load_impl(&worker, watch, "/game/index.html", params).await.unwrap());

        assert_eq!(out.path, "/game/v2.html");
        assert_eq!(out.state, LoadState::Loaded);
    }
}
