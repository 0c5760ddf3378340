//! SQLite-backed cache storage for the offline worker.
//!
//! The database holds any number of named cache stores. Each store maps a
//! request identity (method + URL) to an immutable response snapshot.
//!
//! - Identity keys are SHA-256 over method and URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Stores are deleted as a unit, entries cascade

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{RequestIdentity, ResponseSnapshot, StoredEntry};
