//! Client code for warden.
//!
//! This crate provides the network seam, the reqwest fetch client and the
//! offline cache manager that decides between cache and network.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Network};
pub use worker::{
    ActivateReport, FetchOutcome, InstallReport, Lifecycle, Policy, PrefixRule, ServiceWorker, Source, WorkerConfig,
    WorkerStatus,
};
