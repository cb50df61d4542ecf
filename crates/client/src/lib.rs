//! Client code for shellcache.
//!
//! This crate provides the HTTP network client and the caching proxy worker
//! shared by the server and CLI.

pub mod fetch;
pub mod proxy;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use fetch::{FetchClient, FetchConfig, Network};
pub use proxy::{
    ActivateReport, FetchOutcome, InstallReport, ProxyHandle, ProxyWorker, ResponseSource, Served, VersionReply,
    WorkerState,
};
