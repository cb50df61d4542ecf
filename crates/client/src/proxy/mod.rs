//! The caching proxy worker.
//!
//! A [`ProxyWorker`] owns the store handle and the network handle and runs an
//! event loop over typed events (install, activate, fetch, message, sync).
//! Callers talk to it through a cloneable [`ProxyHandle`].
//!
//! ### Lifecycle
//! `Parsed → Installing → Installed → Activating → Activated`, or `Redundant`
//! when install fails. Fetches are only intercepted once activated.
//!
//! ### Strategies
//! - network-first: live fetch, store on success, fall back to the store on failure
//! - cache-first: store hit short-circuits the network; on miss fetch and store

pub mod lifecycle;
pub mod message;
pub mod strategy;
pub mod worker;

pub use lifecycle::{ActivateReport, InstallReport};
pub use message::{ClientMessage, SYNC_TAG, VersionReply};
pub use strategy::{ResponseSource, Served, StrategyContext};
pub use worker::{FetchOutcome, ProxyHandle, ProxyWorker, WorkerState};
