//! Offline cache manager.
//!
//! ### Lifecycle
//! - `install` populates the current store from the manifest. Assets that
//!   fail are logged and skipped; the batch never aborts.
//! - `activate` deletes every store but the current one and starts
//!   controlling clients right away.
//!
//! ### Interception
//! - Same-origin GET requests only; everything else passes through.
//! - Paths under the bundled prefix are cache-first with refill on miss.
//! - Every other path is network-first with cache fallback.
//! - Lookups match the exact request identity. Only 2xx responses are stored.

pub mod lifecycle;
pub mod policy;

pub use lifecycle::Lifecycle;
pub use policy::{Action, CacheState, Policy, PrefixRule, decide, fallback};

use futures_util::future::join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;
use warden_core::{AppConfig, CacheDb, Error, RequestIdentity, ResponseSnapshot, StoredEntry};

use crate::fetch::{Network, canonicalize, is_same_origin, parse_origin, resolve};

/// Settings the worker is initialised with.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub origin: Url,
    /// Name of the current store; also the version tag.
    pub cache_name: String,
    /// Paths fetched on install, in order.
    pub manifest: Vec<String>,
    pub rule: PrefixRule,
}

impl WorkerConfig {
    pub fn new(
        origin: &str, cache_name: impl Into<String>, manifest: Vec<String>, bundled_prefix: impl Into<String>,
    ) -> Result<Self, Error> {
        let origin = parse_origin(origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let cache_name = cache_name.into();
        if cache_name.trim().is_empty() {
            return Err(Error::InvalidInput("cache name cannot be empty".into()));
        }
        Ok(Self { origin, cache_name, manifest, rule: PrefixRule::new(bundled_prefix) })
    }
}

impl TryFrom<&AppConfig> for WorkerConfig {
    type Error = Error;

    fn try_from(config: &AppConfig) -> Result<Self, Self::Error> {
        Self::new(
            &config.origin,
            config.cache_name.clone(),
            config.manifest.clone(),
            config.bundled_prefix.clone(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FailedAsset {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallReport {
    pub cache_name: String,
    /// Manifest paths now in the store.
    pub cached: Vec<String>,
    /// Manifest paths that could not be fetched.
    pub failed: Vec<FailedAsset>,
    pub state: Lifecycle,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateReport {
    pub current: String,
    /// Stale store names removed, oldest first.
    pub deleted: Vec<String>,
    pub state: Lifecycle,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatus {
    pub state: Lifecycle,
    pub cache_name: String,
    pub stores: Vec<String>,
    /// Entries in the current store.
    pub entries: u64,
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Network,
    /// Not intercepted: fetched straight from the network, never stored.
    Passthrough,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub request: RequestIdentity,
    pub response: ResponseSnapshot,
    pub source: Source,
    /// None for passthrough requests.
    pub policy: Option<Policy>,
}

/// The offline worker: a lifecycle, a cache storage handle, and a network.
pub struct ServiceWorker<N> {
    config: WorkerConfig,
    db: CacheDb,
    network: N,
    state: RwLock<Lifecycle>,
}

impl<N: Network> ServiceWorker<N> {
    pub fn new(config: WorkerConfig, db: CacheDb, network: N) -> Self {
        Self { config, db, network, state: RwLock::new(Lifecycle::Uninstalled) }
    }

    /// Build a worker whose lifecycle resumes from what storage already holds.
    ///
    /// The current store alone means a completed activation, so the worker is
    /// `Active`. The current store beside stale ones means install ran but
    /// activation did not. No current store means `Uninstalled`.
    pub async fn open(config: WorkerConfig, db: CacheDb, network: N) -> Result<Self, Error> {
        let stores = db.store_names().await?;
        let state = if !stores.contains(&config.cache_name) {
            Lifecycle::Uninstalled
        } else if stores.len() == 1 {
            Lifecycle::Active
        } else {
            Lifecycle::Installed
        };
        tracing::info!(cache = %config.cache_name, state = %state, "resumed worker");
        Ok(Self { config, db, network, state: RwLock::new(state) })
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub async fn state(&self) -> Lifecycle {
        *self.state.read().await
    }

    /// Populate the current store from the manifest.
    ///
    /// Individual asset failures are tolerated; only a storage failure while
    /// creating the store is an error.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let name = &self.config.cache_name;
        if self.db.open_store(name).await? {
            tracing::info!(cache = %name, "created cache store");
        }

        let results = join_all(self.config.manifest.iter().map(|path| self.install_asset(path))).await;

        let mut cached = Vec::new();
        let mut failed = Vec::new();
        for (path, result) in self.config.manifest.iter().zip(results) {
            match result {
                Ok(()) => cached.push(path.clone()),
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "asset not cached during install");
                    failed.push(FailedAsset { path: path.clone(), reason: e.to_string() });
                }
            }
        }

        let state = {
            let mut state = self.state.write().await;
            *state = state.installed();
            *state
        };

        tracing::info!(cache = %name, cached = cached.len(), failed = failed.len(), "install complete");

        Ok(InstallReport { cache_name: name.clone(), cached, failed, state })
    }

    async fn install_asset(&self, path: &str) -> Result<(), Error> {
        let url = resolve(&self.config.origin, path).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let request = RequestIdentity::get(url.as_str());
        let response = self.network.fetch(&request).await?;
        if !response.is_ok() {
            return Err(Error::HttpError(format!("status {}", response.status)));
        }
        self.db.put_entry(&self.config.cache_name, &request, &response).await
    }

    /// Purge every store but the current one and take control of clients.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let next = self.state().await.activated()?;

        let current = self.config.cache_name.clone();
        let deleted = self.db.purge_stores_except(&current).await?;
        for name in &deleted {
            tracing::info!(cache = %name, "deleted stale cache store");
        }

        *self.state.write().await = next;
        tracing::info!(cache = %current, "worker active");

        Ok(ActivateReport { current, deleted, state: next })
    }

    /// Resolve `target` against the origin and intercept it.
    pub async fn fetch(&self, method: &str, target: &str) -> Result<FetchOutcome, Error> {
        let url = resolve(&self.config.origin, target).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        self.intercept(RequestIdentity::new(method, url.as_str())).await
    }

    /// Answer a request the way the active worker would.
    pub async fn intercept(&self, request: RequestIdentity) -> Result<FetchOutcome, Error> {
        let url = canonicalize(&request.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let request = RequestIdentity::new(&request.method, url.as_str());

        if !self.state().await.controls_clients()
            || request.method != "GET"
            || !is_same_origin(&url, &self.config.origin)
        {
            return self.passthrough(request).await;
        }

        let mut cached = None;
        let mut cache_state = CacheState::Unknown;
        if self.config.rule.policy_for(url.path()) == Policy::CacheFirst {
            cached = self.lookup(&request).await;
            cache_state = CacheState::from_lookup(&cached);
        }

        let (policy, action) = decide(&request, &self.config.rule, cache_state);
        match (action, cached) {
            (Action::ServeCached, Some(entry)) => {
                tracing::debug!(policy = ?policy, "cache hit for {}", request);
                Ok(FetchOutcome { request, response: entry.response, source: Source::Cache, policy: Some(policy) })
            }
            (Action::FetchWithFallback, _) => self.network_first(request, policy).await,
            _ => {
                tracing::debug!(policy = ?policy, "cache miss for {}", request);
                let response = self.network.fetch(&request).await?;
                self.store(&request, &response).await;
                Ok(FetchOutcome { request, response, source: Source::Network, policy: Some(policy) })
            }
        }
    }

    async fn network_first(&self, request: RequestIdentity, policy: Policy) -> Result<FetchOutcome, Error> {
        let err = match self.network.fetch(&request).await {
            Ok(response) => {
                self.store(&request, &response).await;
                return Ok(FetchOutcome { request, response, source: Source::Network, policy: Some(policy) });
            }
            Err(e) if e.is_network() => e,
            Err(e) => return Err(e),
        };

        let cached = self.lookup(&request).await;
        match (fallback(CacheState::from_lookup(&cached)), cached) {
            (Action::ServeCached, Some(entry)) => {
                tracing::debug!(error = %err, "network failed, serving cached {}", request);
                Ok(FetchOutcome { request, response: entry.response, source: Source::Cache, policy: Some(policy) })
            }
            _ => {
                tracing::debug!(error = %err, "network failed, nothing cached for {}", request);
                Err(err)
            }
        }
    }

    async fn passthrough(&self, request: RequestIdentity) -> Result<FetchOutcome, Error> {
        let response = self.network.fetch(&request).await?;
        Ok(FetchOutcome { request, response, source: Source::Passthrough, policy: None })
    }

    /// Cache lookup where a storage error counts as a miss.
    async fn lookup(&self, request: &RequestIdentity) -> Option<StoredEntry> {
        match self.db.match_any(request).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "cache lookup failed for {}", request);
                None
            }
        }
    }

    /// Write a copy into the current store. Failures are logged, not returned.
    async fn store(&self, request: &RequestIdentity, response: &ResponseSnapshot) {
        if !response.is_ok() {
            tracing::debug!(status = response.status, "not caching {}", request);
            return;
        }
        if let Err(e) = self.db.put_entry(&self.config.cache_name, request, response).await {
            tracing::warn!(error = %e, "failed to cache {}", request);
        }
    }

    /// Stored entry for `target` without touching the network.
    pub async fn match_cached(&self, method: &str, target: &str) -> Result<StoredEntry, Error> {
        let url = resolve(&self.config.origin, target).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let request = RequestIdentity::new(method, url.as_str());
        self.db
            .match_any(&request)
            .await?
            .ok_or_else(|| Error::CacheMiss(request.to_string()))
    }

    /// Fetch a document that must load successfully, e.g. the game page.
    ///
    /// Unlike [`fetch`](Self::fetch), a non-2xx response is an error.
    pub async fn load_document(&self, target: &str) -> Result<FetchOutcome, Error> {
        let outcome = self.fetch("GET", target).await?;
        if !outcome.response.is_ok() {
            return Err(Error::HttpError(format!("{} returned {}", outcome.request, outcome.response.status)));
        }
        Ok(outcome)
    }

    /// Delete `store`, or every stale store when `None`.
    ///
    /// Returns the deleted names.
    pub async fn purge(&self, store: Option<&str>) -> Result<Vec<String>, Error> {
        match store {
            Some(name) => {
                if name == self.config.cache_name {
                    tracing::warn!(cache = %name, "purging the current cache store");
                }
                let deleted = self.db.delete_store(name).await?;
                Ok(if deleted { vec![name.to_string()] } else { Vec::new() })
            }
            None => self.db.purge_stores_except(&self.config.cache_name).await,
        }
    }

    pub async fn status(&self) -> Result<WorkerStatus, Error> {
        Ok(WorkerStatus {
            state: self.state().await,
            cache_name: self.config.cache_name.clone(),
            stores: self.db.store_names().await?,
            entries: self.db.entry_count(&self.config.cache_name).await?,
        })
    }
}
