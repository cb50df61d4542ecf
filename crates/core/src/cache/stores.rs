//! Named store lifecycle: open, enumerate, delete.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio_rusqlite::params;

/// Which family a store belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Precached application shell and static assets.
    AppShell,
    /// API responses, versioned independently.
    Api,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::AppShell => "app_shell",
            StoreKind::Api => "api",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "app_shell" => Ok(StoreKind::AppShell),
            "api" => Ok(StoreKind::Api),
            other => Err(Error::CorruptEntry(format!("unknown store kind '{other}'"))),
        }
    }
}

/// Summary of one store.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoreInfo {
    pub name: String,
    pub kind: StoreKind,
    pub version: String,
    pub created_at: String,
    pub entries: u64,
}

impl CacheDb {
    /// Open a store, creating it if absent.
    ///
    /// Returns true if the store was created by this call.
    pub async fn open_store(&self, name: &str, kind: StoreKind, version: &str) -> Result<bool, Error> {
        let name = name.to_string();
        let version = version.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT INTO cache_stores (name, kind, version, created_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(name) DO NOTHING",
                    params![name, kind.as_str(), version, now],
                )?;
                Ok(inserted == 1)
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a store exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All store names in creation order.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// All stores with their entry counts, in creation order.
    pub async fn list_stores(&self) -> Result<Vec<StoreInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT s.name, s.kind, s.version, s.created_at,
                            (SELECT COUNT(*) FROM cache_entries e WHERE e.store_name = s.name)
                     FROM cache_stores s ORDER BY s.rowid ASC",
                )?;

                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, i64>(4)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(name, kind, version, created_at, entries)| {
                        Ok(StoreInfo { name, kind: kind.parse()?, version, created_at, entries: entries as u64 })
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all its entries.
    ///
    /// Returns true if a store was deleted.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every store whose name is not in `keep`.
    ///
    /// Returns the deleted names in creation order.
    pub async fn delete_stores_except(&self, keep: &[String]) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.store_names().await? {
            if keep.contains(&name) {
                continue;
            }
            if self.delete_store(&name).await? {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }
}
