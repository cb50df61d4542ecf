//! Stub [`Network`] for tests.
//!
//! Serves canned responses by URL, records every call, and can be switched
//! offline to simulate an unreachable network. Unknown URLs get a 404.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use shellcache_core::{Error, ProxyRequest, ProxyResponse};

use crate::fetch::Network;

#[derive(Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, ProxyResponse>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with `status` for `url`.
    pub fn with_response(self, url: &str, status: u16, body: &str) -> Self {
        self.set_response(url, ProxyResponse::new(url, status, body));
        self
    }

    pub fn set_response(&self, url: &str, response: ProxyResponse) {
        self.routes
            .lock()
            .expect("routes lock")
            .insert(url.to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// URLs fetched so far, in order, including failed attempts.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait::async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, Error> {
        let url = request.url.to_string();
        self.calls.lock().expect("calls lock").push(url.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::HttpError(format!("network error: {url} unreachable")));
        }

        let routes = self.routes.lock().expect("routes lock");
        Ok(routes
            .get(&url)
            .cloned()
            .unwrap_or_else(|| ProxyResponse::new(url.as_str(), 404, "not found")))
    }
}
