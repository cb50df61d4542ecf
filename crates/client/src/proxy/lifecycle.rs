//! Install and activate phases.

use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, Destination, Error, ProxyRequest, ProxySettings, StoreKind};

use crate::fetch::Network;

/// Result of the install phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallReport {
    pub cache_name: String,
    /// Whether the store was created (false when it already existed).
    pub created: bool,
    /// Precached URLs in manifest order.
    pub precached: Vec<String>,
    /// Set when skip-waiting activated the worker straight away.
    pub activation: Option<ActivateReport>,
}

/// Result of the activate phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateReport {
    pub cache_name: String,
    /// Stale stores removed, in creation order.
    pub deleted: Vec<String>,
    pub activated_at: String,
}

/// Open the current store and fill it from the manifest.
///
/// Every manifest URL is fetched before anything is written; one failed or
/// non-ok response aborts the install and leaves the store untouched.
pub async fn precache(settings: &ProxySettings, cache: &CacheDb, network: &dyn Network) -> Result<InstallReport, Error> {
    let cache_name = settings.cache_name();
    let created = cache
        .open_store(&cache_name, StoreKind::AppShell, &settings.version)
        .await?;

    tracing::info!("caching app shell into {} ({} entries)", cache_name, settings.manifest.len());

    let mut entries = Vec::with_capacity(settings.manifest.len());
    for url in settings.manifest.urls() {
        let request = ProxyRequest::get(url.clone(), Destination::infer(url.path()));
        let response = network
            .fetch(&request)
            .await
            .map_err(|e| Error::PrecacheFailed(format!("{url}: {e}")))?;

        if !response.is_ok() {
            return Err(Error::PrecacheFailed(format!("{url}: status {}", response.status)));
        }

        entries.push((url.to_string(), response));
    }

    let precached = entries.iter().map(|(url, _)| url.clone()).collect();
    cache.put_entries(&cache_name, entries).await?;

    Ok(InstallReport { cache_name, created, precached, activation: None })
}

/// Delete every store that is not current and record the active version.
pub async fn prune_and_register(settings: &ProxySettings, cache: &CacheDb) -> Result<ActivateReport, Error> {
    let keep = settings.current_store_names();
    let deleted = cache.delete_stores_except(&keep).await?;
    for name in &deleted {
        tracing::info!("deleted old cache {}", name);
    }

    let cache_name = settings.cache_name();
    let registration = cache.set_registration(&settings.version, &cache_name).await?;

    Ok(ActivateReport { cache_name, deleted, activated_at: registration.activated_at })
}
