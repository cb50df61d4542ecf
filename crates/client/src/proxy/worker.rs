//! Worker actor and its handle.
//!
//! The loop handles one event at a time. Install, activate, message and sync
//! complete inside the loop; each intercepted fetch runs as its own task so
//! concurrent fetches interleave at await points.

use std::ops::ControlFlow;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use shellcache_core::{
    CacheDb, Error, PassReason, ProxyRequest, ProxySettings, Route, StoreKind, Strategy,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use super::lifecycle::{self, ActivateReport, InstallReport};
use super::message::{self, ClientMessage, VersionReply};
use super::strategy::{self, ResponseSource, Served, StrategyContext};
use crate::fetch::Network;

/// Event queue depth before senders wait.
const EVENT_BUFFER: usize = 64;

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    Activated,
    /// Install failed.
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }

    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }
}

/// How a fetch event was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the caller should go to the network directly.
    Passthrough(PassReason),
    Responded { strategy: Strategy, store: StoreKind, served: Served },
}

/// Typed events consumed by the worker loop.
pub enum Event {
    Install(oneshot::Sender<Result<InstallReport, Error>>),
    Activate(oneshot::Sender<Result<ActivateReport, Error>>),
    Fetch { request: ProxyRequest, respond: oneshot::Sender<Result<FetchOutcome, Error>> },
    Message { data: Value, reply: Option<oneshot::Sender<VersionReply>> },
    Sync { tag: String, done: oneshot::Sender<bool> },
    State(oneshot::Sender<WorkerState>),
    Shutdown(oneshot::Sender<Result<(), Error>>),
}

/// The caching proxy.
pub struct ProxyWorker {
    settings: Arc<ProxySettings>,
    cache: CacheDb,
    network: Arc<dyn Network>,
    state: WorkerState,
}

impl ProxyWorker {
    /// Create a worker.
    ///
    /// If the registration says this version already completed activation and
    /// its store still exists, the worker starts activated.
    pub async fn new(settings: ProxySettings, cache: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        let state = match cache.registration().await? {
            Some(registration)
                if registration.active_version == settings.version
                    && cache.has_store(&registration.cache_name).await? =>
            {
                tracing::info!("resuming active version {}", registration.active_version);
                WorkerState::Activated
            }
            _ => WorkerState::Parsed,
        };

        Ok(Self { settings: Arc::new(settings), cache, network, state })
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Precache the manifest, then skip waiting if configured.
    ///
    /// Reinstalling an already active version refreshes the precache and
    /// leaves the worker active.
    pub async fn install(&mut self) -> Result<InstallReport, Error> {
        tracing::info!("installing {}", self.settings.cache_name());
        let was_active = self.state == WorkerState::Activated;
        if !was_active {
            self.state = WorkerState::Installing;
        }

        let mut report = match lifecycle::precache(&self.settings, &self.cache, self.network.as_ref()).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("install failed: {}", e);
                if !was_active {
                    self.state = WorkerState::Redundant;
                }
                return Err(e);
            }
        };

        if was_active {
            return Ok(report);
        }

        self.state = WorkerState::Installed;
        if self.settings.skip_waiting {
            report.activation = Some(self.activate().await?);
        }

        Ok(report)
    }

    /// Prune stale stores and start intercepting.
    pub async fn activate(&mut self) -> Result<ActivateReport, Error> {
        match self.state {
            WorkerState::Installed | WorkerState::Activated => {}
            other => {
                return Err(Error::InvalidInput(format!(
                    "cannot activate a worker in state {other:?}"
                )));
            }
        }

        tracing::info!("activating {}", self.settings.cache_name());
        let previous = self.state;
        self.state = WorkerState::Activating;

        match lifecycle::prune_and_register(&self.settings, &self.cache).await {
            Ok(report) => {
                self.state = WorkerState::Activated;
                tracing::info!("claimed clients for {}", report.cache_name);
                Ok(report)
            }
            Err(e) => {
                self.state = previous;
                Err(e)
            }
        }
    }

    /// Activate now if installed and waiting; otherwise nothing happens.
    pub async fn skip_waiting(&mut self) -> Result<Option<ActivateReport>, Error> {
        if self.state == WorkerState::Installed {
            self.activate().await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Handle a message payload. Returns the version reply for `GET_VERSION`.
    pub async fn handle_message(&mut self, data: &Value) -> Option<VersionReply> {
        match ClientMessage::parse(data)? {
            ClientMessage::SkipWaiting => {
                if let Err(e) = self.skip_waiting().await {
                    tracing::warn!("skip waiting failed: {}", e);
                }
                None
            }
            ClientMessage::GetVersion => Some(VersionReply::from_settings(&self.settings)),
        }
    }

    /// Classify and serve a fetch using the current state.
    pub async fn handle_fetch(&self, request: &ProxyRequest) -> Result<FetchOutcome, Error> {
        if !self.state.can_intercept_fetch() {
            return Ok(FetchOutcome::Passthrough(PassReason::NotActivated));
        }
        serve(&self.settings, &self.cache, self.network.as_ref(), request).await
    }

    /// Start the event loop on the current runtime.
    pub fn spawn(self) -> ProxyHandle {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let network = Arc::clone(&self.network);
        tokio::spawn(self.run(rx));
        ProxyHandle { tx, network }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Event>) {
        let mut in_flight: JoinSet<()> = JoinSet::new();
        let mut shutdown: Option<oneshot::Sender<Result<(), Error>>> = None;

        loop {
            tokio::select! {
                Some(event) = rx.recv() => {
                    if let ControlFlow::Break(done) = self.dispatch(event, &mut in_flight).await {
                        shutdown = Some(done);
                        break;
                    }
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        tracing::warn!("fetch task failed: {}", e);
                    }
                }
                else => break,
            }
        }

        rx.close();
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("fetch task failed: {}", e);
            }
        }

        tracing::info!("worker stopped; closing cache");
        let closed = self.cache.close().await;
        if let Some(done) = shutdown {
            let _ = done.send(closed);
        } else if let Err(e) = closed {
            tracing::warn!("failed to close cache: {}", e);
        }
    }

    /// Handle one event. Breaks with the reply port on shutdown.
    async fn dispatch(
        &mut self, event: Event, in_flight: &mut JoinSet<()>,
    ) -> ControlFlow<oneshot::Sender<Result<(), Error>>> {
        match event {
            Event::Install(done) => {
                let _ = done.send(self.install().await);
            }
            Event::Activate(done) => {
                let _ = done.send(self.activate().await);
            }
            Event::Fetch { request, respond } => {
                if !self.state.can_intercept_fetch() {
                    let _ = respond.send(Ok(FetchOutcome::Passthrough(PassReason::NotActivated)));
                    return ControlFlow::Continue(());
                }
                let settings = Arc::clone(&self.settings);
                let cache = self.cache.clone();
                let network = Arc::clone(&self.network);
                in_flight.spawn(async move {
                    let outcome = serve(&settings, &cache, network.as_ref(), &request).await;
                    let _ = respond.send(outcome);
                });
            }
            Event::Message { data, reply } => {
                let version = self.handle_message(&data).await;
                match (version, reply) {
                    (Some(version), Some(port)) => {
                        let _ = port.send(version);
                    }
                    (Some(_), None) => tracing::warn!("GET_VERSION without a reply port"),
                    _ => {}
                }
            }
            Event::Sync { tag, done } => {
                let _ = done.send(message::handle_sync(&tag));
            }
            Event::State(done) => {
                let _ = done.send(self.state);
            }
            Event::Shutdown(done) => return ControlFlow::Break(done),
        }
        ControlFlow::Continue(())
    }
}

/// Route an activated fetch to its strategy.
async fn serve(
    settings: &ProxySettings, cache: &CacheDb, network: &dyn Network, request: &ProxyRequest,
) -> Result<FetchOutcome, Error> {
    let (strategy, store) = match settings.classify(request) {
        Route::Passthrough(reason) => {
            tracing::debug!("passthrough {} ({:?})", request.url, reason);
            return Ok(FetchOutcome::Passthrough(reason));
        }
        Route::Intercept { strategy, store } => (strategy, store),
    };

    let Some((store_name, store_version)) = settings.store_for(store) else {
        return Ok(FetchOutcome::Passthrough(PassReason::ExcludedPath));
    };

    let ctx = StrategyContext { cache, network, store_name: &store_name, store_kind: store, store_version };

    let served = match strategy {
        Strategy::NetworkFirst => strategy::network_first(&ctx, request).await?,
        Strategy::CacheFirst => strategy::cache_first(&ctx, request).await?,
    };

    tracing::debug!("{:?} {} -> {:?} {}", strategy, request.url, served.source, served.response.status);
    Ok(FetchOutcome::Responded { strategy, store, served })
}

/// Cloneable sender side of a running worker.
#[derive(Clone)]
pub struct ProxyHandle {
    tx: mpsc::Sender<Event>,
    network: Arc<dyn Network>,
}

impl ProxyHandle {
    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Event) -> Result<T, Error> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(make(tx)).await.map_err(|_| Error::WorkerStopped)?;
        rx.await.map_err(|_| Error::WorkerStopped)
    }

    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.call(Event::Install).await?
    }

    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.call(Event::Activate).await?
    }

    pub async fn fetch(&self, request: ProxyRequest) -> Result<FetchOutcome, Error> {
        self.call(|respond| Event::Fetch { request, respond }).await?
    }

    /// Fetch through the worker; passthrough requests go straight to the network.
    ///
    /// Network failures on passthrough become the synthetic error response.
    pub async fn respond(&self, request: ProxyRequest) -> Result<(Served, Option<Strategy>), Error> {
        match self.fetch(request.clone()).await? {
            FetchOutcome::Responded { strategy, served, .. } => Ok((served, Some(strategy))),
            FetchOutcome::Passthrough(_) => {
                let served = match self.network.fetch(&request).await {
                    Ok(response) => Served { response, source: ResponseSource::Passthrough },
                    Err(e) => {
                        tracing::debug!("passthrough fetch failed for {}: {}", request.url, e);
                        Served::synthetic()
                    }
                };
                Ok((served, None))
            }
        }
    }

    /// Post a message without a reply port.
    pub async fn post_message(&self, data: Value) -> Result<(), Error> {
        self.tx
            .send(Event::Message { data, reply: None })
            .await
            .map_err(|_| Error::WorkerStopped)
    }

    /// Post a message with a reply port and wait for the reply, if any.
    pub async fn post_message_with_reply(&self, data: Value) -> Result<Option<VersionReply>, Error> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(Event::Message { data, reply: Some(tx) })
            .await
            .map_err(|_| Error::WorkerStopped)?;
        // the port is dropped unanswered for anything but GET_VERSION
        Ok(rx.await.ok())
    }

    pub async fn sync(&self, tag: &str) -> Result<bool, Error> {
        let tag = tag.to_string();
        self.call(|done| Event::Sync { tag, done }).await
    }

    pub async fn state(&self) -> Result<WorkerState, Error> {
        self.call(Event::State).await
    }

    /// Stop the worker: drain in-flight fetches and close the cache.
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.call(Event::Shutdown).await?
    }
}
