//! Stall watchdog for loading the embedded game document.
//!
//! Loading is never cancelled. If no result arrives within the fallback
//! threshold the load is marked stalled and the watch keeps waiting.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Shown when the threshold passes before the game document answers.
pub const STALL_TITLE: &str = "Game Loading...";
pub const STALL_HINT: &str = "If the game doesn't appear, the export files may not be in the game/ folder yet.";

/// Shown when the game document failed to load.
pub const FAILED_LABEL: &str = "Game files not found";

/// Terminal state of a watched load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Loaded,
    Failed,
}

/// What happened during a watched load.
#[derive(Debug)]
pub struct LoadReport<T> {
    pub state: LoadState,
    /// The threshold passed before the load finished.
    pub stalled: bool,
    /// User-facing messages in the order they would have been shown.
    pub messages: Vec<String>,
    pub elapsed: Duration,
    pub result: Result<T, Error>,
}

#[derive(Debug, Clone, Copy)]
pub struct LoadWatch {
    fallback_after: Duration,
}

impl LoadWatch {
    pub fn new(fallback_after: Duration) -> Self {
        Self { fallback_after }
    }

    pub fn fallback_after(&self) -> Duration {
        self.fallback_after
    }

    /// Drive `load` to completion, noting a stall if it outlives the threshold.
    pub async fn watch<T, F>(&self, load: F) -> LoadReport<T>
    where
        F: Future<Output = Result<T, Error>>,
    {
        let start = Instant::now();
        let mut load = std::pin::pin!(load);
        let mut messages = Vec::new();

        let (stalled, result) = match tokio::time::timeout(self.fallback_after, &mut load).await {
            Ok(result) => (false, result),
            Err(_) => {
                tracing::warn!(
                    threshold_ms = self.fallback_after.as_millis() as u64,
                    "game document has not loaded yet"
                );
                messages.push(STALL_TITLE.to_string());
                messages.push(STALL_HINT.to_string());
                (true, load.await)
            }
        };

        let state = match &result {
            Ok(_) => LoadState::Loaded,
            Err(e) => {
                tracing::warn!(error = %e, "game document failed to load");
                messages.push(FAILED_LABEL.to_string());
                LoadState::Failed
            }
        };

        LoadReport { state, stalled, messages, elapsed: start.elapsed(), result }
    }
}
