//! The persisted record of the active version.
//!
//! A worker restarted for a version that already completed activation
//! resumes in the activated state instead of reinstalling.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Registration {
    pub active_version: String,
    pub cache_name: String,
    pub activated_at: String,
}

impl CacheDb {
    /// The current registration, if any version has been activated.
    pub async fn registration(&self) -> Result<Option<Registration>, Error> {
        self.conn
            .call(|conn| -> Result<Option<Registration>, Error> {
                let result = conn.query_row(
                    "SELECT active_version, cache_name, activated_at FROM registration WHERE id = 1",
                    [],
                    |row| {
                        Ok(Registration {
                            active_version: row.get(0)?,
                            cache_name: row.get(1)?,
                            activated_at: row.get(2)?,
                        })
                    },
                );

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Record `version` as active, replacing any previous registration.
    pub async fn set_registration(&self, version: &str, cache_name: &str) -> Result<Registration, Error> {
        let registration = Registration {
            active_version: version.to_string(),
            cache_name: cache_name.to_string(),
            activated_at: chrono::Utc::now().to_rfc3339(),
        };
        let row = registration.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO registration (id, active_version, cache_name, activated_at)
                     VALUES (1, ?1, ?2, ?3)
                     ON CONFLICT(id) DO UPDATE SET
                        active_version = excluded.active_version,
                        cache_name = excluded.cache_name,
                        activated_at = excluded.activated_at",
                    params![row.active_version, row.cache_name, row.activated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;
        Ok(registration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registration_empty() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.registration().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_registration_replaced() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.set_registration("1.0.0", "app-1.0.0").await.unwrap();
        db.set_registration("1.1.0", "app-1.1.0").await.unwrap();

        let registration = db.registration().await.unwrap().unwrap();
        assert_eq!(registration.active_version, "1.1.0");
        assert_eq!(registration.cache_name, "app-1.1.0");
    }
}
