//! Interception decision.
//!
//! Pure functions from a request, the prefix rule and what the cache holds
//! to the policy and the next step. No I/O happens here.

use serde::{Deserialize, Serialize};
use url::Url;
use warden_core::RequestIdentity;

/// Selects the policy by URL path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRule {
    bundled_prefix: String,
}

impl PrefixRule {
    pub fn new(bundled_prefix: impl Into<String>) -> Self {
        Self { bundled_prefix: bundled_prefix.into() }
    }

    pub fn bundled_prefix(&self) -> &str {
        &self.bundled_prefix
    }

    /// Policy for a URL path. Matching is a plain byte prefix on the path.
    pub fn policy_for(&self, path: &str) -> Policy {
        if path.starts_with(&self.bundled_prefix) { Policy::CacheFirst } else { Policy::NetworkFirst }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Serve the cached entry if present; fetch and store on a miss.
    CacheFirst,
    /// Always try the network; fall back to the cache when it fails.
    NetworkFirst,
}

/// Whether the cache holds an entry for the exact request identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Hit,
    Miss,
    /// Not looked up yet. Network-first only consults the cache after a failure.
    Unknown,
}

impl CacheState {
    pub fn from_lookup<T>(found: &Option<T>) -> Self {
        if found.is_some() { CacheState::Hit } else { CacheState::Miss }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Return the cached entry; no network call.
    ServeCached,
    /// Fetch, store a copy, return the network response.
    FetchAndStore,
    /// Fetch and store on success; consult the cache on failure.
    FetchWithFallback,
    /// Surface the network error to the caller.
    Fail,
}

/// Choose the policy and first action for an intercepted request.
pub fn decide(request: &RequestIdentity, rule: &PrefixRule, cache: CacheState) -> (Policy, Action) {
    let path = Url::parse(&request.url).map(|u| u.path().to_string()).unwrap_or_default();
    let policy = rule.policy_for(&path);

    let action = match (policy, cache) {
        (Policy::CacheFirst, CacheState::Hit) => Action::ServeCached,
        (Policy::CacheFirst, _) => Action::FetchAndStore,
        (Policy::NetworkFirst, _) => Action::FetchWithFallback,
    };

    (policy, action)
}

/// Next step after a network-first fetch failed.
pub fn fallback(cache: CacheState) -> Action {
    match cache {
        CacheState::Hit => Action::ServeCached,
        CacheState::Miss | CacheState::Unknown => Action::Fail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> PrefixRule {
        PrefixRule::new("/game/")
    }

    #[test]
    fn test_bundled_hit_serves_cache() {
        let request = RequestIdentity::get("https://site.test/game/index.wasm");
        assert_eq!(decide(&request, &rule(), CacheState::Hit), (Policy::CacheFirst, Action::ServeCached));
    }

    #[test]
    fn test_bundled_miss_fetches_and_stores() {
        let request = RequestIdentity::get("https://site.test/game/index.pck");
        assert_eq!(decide(&request, &rule(), CacheState::Miss), (Policy::CacheFirst, Action::FetchAndStore));
    }

    #[test]
    fn test_page_is_network_first_regardless_of_cache() {
        let request = RequestIdentity::get("https://site.test/play.html");
        for state in [CacheState::Hit, CacheState::Miss, CacheState::Unknown] {
            assert_eq!(decide(&request, &rule(), state), (Policy::NetworkFirst, Action::FetchWithFallback));
        }
    }

    #[test]
    fn test_prefix_checked_on_path_only() {
        // query strings and lookalike hosts do not count
        let query = RequestIdentity::get("https://site.test/play.html?from=/game/");
        assert_eq!(decide(&query, &rule(), CacheState::Hit).0, Policy::NetworkFirst);

        let host = RequestIdentity::get("https://game.site.test/index.wasm");
        assert_eq!(decide(&host, &rule(), CacheState::Hit).0, Policy::NetworkFirst);
    }

    #[test]
    fn test_prefix_requires_trailing_segment() {
        let request = RequestIdentity::get("https://site.test/game");
        assert_eq!(decide(&request, &rule(), CacheState::Hit).0, Policy::NetworkFirst);

        let dir = RequestIdentity::get("https://site.test/game/");
        assert_eq!(decide(&dir, &rule(), CacheState::Hit).0, Policy::CacheFirst);
    }

    #[test]
    fn test_fallback() {
        assert_eq!(fallback(CacheState::Hit), Action::ServeCached);
        assert_eq!(fallback(CacheState::Miss), Action::Fail);
    }

    #[test]
    fn test_cache_state_from_lookup() {
        assert_eq!(CacheState::from_lookup(&Some(1)), CacheState::Hit);
        assert_eq!(CacheState::from_lookup::<u8>(&None), CacheState::Miss);
    }
}
