//! SQLite-backed versioned response stores.
//!
//! This module provides persistent, named cache stores using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - One store per (kind, version), identified by name
//! - Responses keyed by request URL, last write wins
//! - Cascade deletion of a store's entries when the store is deleted
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod registration;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedResponse;
pub use registration::Registration;
pub use stores::{StoreInfo, StoreKind};
