//! Cache-related MCP tools.
//!
//! Direct access to the cache storage, bypassing the interception policies.

pub mod lookup;
pub mod purge;

pub use lookup::{CacheMatchParams, match_impl};
pub use purge::{CachePurgeParams, purge_impl};
