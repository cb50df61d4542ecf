//! Response entries: put, match, enumerate, delete.
//!
//! Entries are keyed by `(store_name, url)`. Putting an existing key
//! overwrites it, so concurrent writers resolve to the last write.

use super::connection::CacheDb;
use super::hash::body_digest;
use crate::Error;
use crate::http::{ProxyResponse, ResponseKind};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Row};

/// A response as stored in a cache store.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CachedResponse {
    pub store_name: String,
    pub url: String,
    pub response: ProxyResponse,
    pub body_sha256: String,
    pub stored_at: String,
}

impl CachedResponse {
    /// Whether the body still matches the digest recorded at write time.
    pub fn is_intact(&self) -> bool {
        body_digest(&self.response.body) == self.body_sha256
    }
}

const SELECT_ENTRY: &str = "SELECT e.store_name, e.url, e.status, e.status_text, e.headers_json,
                                   e.body, e.body_sha256, e.stored_at
                            FROM cache_entries e";

type EntryRow = (String, String, u16, String, String, Vec<u8>, String, String);

fn read_row(row: &Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn decode(row: EntryRow) -> Result<CachedResponse, Error> {
    let (store_name, url, status, status_text, headers_json, body, body_sha256, stored_at) = row;
    let headers: Vec<(String, String)> =
        serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(format!("{url}: {e}")))?;

    Ok(CachedResponse {
        store_name,
        response: ProxyResponse {
            url: url.clone(),
            status,
            status_text,
            headers,
            body,
            kind: ResponseKind::Basic,
        },
        url,
        body_sha256,
        stored_at,
    })
}

fn insert(conn: &rusqlite::Connection, store_name: &str, url: &str, response: &ProxyResponse) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(e.to_string()))?;

    conn.execute(
        "INSERT INTO cache_entries (
            store_name, url, status, status_text, headers_json, body, body_sha256, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(store_name, url) DO UPDATE SET
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            body_sha256 = excluded.body_sha256,
            stored_at = excluded.stored_at",
        params![
            store_name,
            url,
            response.status,
            &response.status_text,
            headers_json,
            &response.body,
            body_digest(&response.body),
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Insert or replace the response stored under `url` in `store_name`.
    ///
    /// Fails if the store does not exist.
    pub async fn put_entry(&self, store_name: &str, url: &str, response: &ProxyResponse) -> Result<(), Error> {
        let store_name = store_name.to_string();
        let url = url.to_string();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> { insert(conn, &store_name, &url, &response) })
            .await
            .map_err(Error::from)
    }

    /// Insert several responses in one transaction; all or nothing.
    pub async fn put_entries(&self, store_name: &str, entries: Vec<(String, ProxyResponse)>) -> Result<(), Error> {
        let store_name = store_name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for (url, response) in &entries {
                    insert(&tx, &store_name, url, response)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up `url` in one store.
    pub async fn match_entry(&self, store_name: &str, url: &str) -> Result<Option<CachedResponse>, Error> {
        let store_name = store_name.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let sql = format!("{SELECT_ENTRY} WHERE e.store_name = ?1 AND e.url = ?2");
                match conn.query_row(&sql, params![store_name, url], read_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?
            .map(decode)
            .transpose()
    }

    /// Look up `url` across all stores, oldest store first.
    pub async fn match_any(&self, url: &str) -> Result<Option<CachedResponse>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let sql = format!(
                    "{SELECT_ENTRY} JOIN cache_stores s ON s.name = e.store_name
                     WHERE e.url = ?1 ORDER BY s.rowid ASC LIMIT 1"
                );
                match conn.query_row(&sql, params![url], read_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?
            .map(decode)
            .transpose()
    }

    /// Request URLs stored in a store, in insertion order.
    pub async fn entry_urls(&self, store_name: &str) -> Result<Vec<String>, Error> {
        let store_name = store_name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM cache_entries WHERE store_name = ?1 ORDER BY rowid ASC")?;
                let urls = stmt
                    .query_map(params![store_name], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}
