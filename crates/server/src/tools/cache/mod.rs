//! Cache inspection MCP tools.
//!
//! These read and prune the named stores directly, without going through the worker.

pub mod get;
pub mod purge;
pub mod stores;

pub use get::{CacheGetParams, get_impl};
pub use purge::{CachePurgeParams, purge_impl};
pub use stores::stores_impl;
