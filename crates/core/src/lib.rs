//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Versioned response stores with SQLite backend
//! - Request/response model and interception policy
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod policy;

pub use cache::{CacheDb, CachedResponse, Registration, StoreInfo, StoreKind};
pub use config::AppConfig;
pub use error::Error;
pub use http::{Destination, ProxyRequest, ProxyResponse, ResponseKind};
pub use policy::{PassReason, PrecacheManifest, ProxySettings, Route, Strategy};
