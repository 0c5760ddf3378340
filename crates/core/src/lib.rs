//! Core types and shared functionality for warden.
//!
//! This crate provides:
//! - Versioned cache storage with SQLite backend
//! - Unified error types
//! - Configuration structures
//! - The game-load stall watchdog

pub mod cache;
pub mod config;
pub mod error;
pub mod loader;

pub use cache::{CacheDb, RequestIdentity, ResponseSnapshot, StoredEntry};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use loader::{LoadReport, LoadState, LoadWatch};
