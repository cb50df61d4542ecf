//! Subcommand implementations.
//!
//! Each command drives a freshly spawned worker and returns the JSON document
//! printed on stdout.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::{Value, json};
use shellcache_client::fetch::resolve;
use shellcache_client::{ProxyHandle, WorkerState};
use shellcache_core::{CacheDb, Destination, ProxyRequest, ProxySettings, Strategy};

use crate::args::{FetchArgs, MessageArgs, SyncArgs};

/// Output of the fetch command.
#[derive(Debug, Serialize)]
struct FetchOutput {
    url: String,
    destination: Destination,
    source: &'static str,
    strategy: Option<Strategy>,
    status: u16,
    status_text: String,
    content_type: Option<String>,
    bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context("serializing command output")
}

pub async fn install(proxy: &ProxyHandle) -> Result<Value> {
    let report = proxy.install().await?;
    to_json(&report)
}

/// Activate, installing first when this process starts from scratch.
pub async fn activate(proxy: &ProxyHandle) -> Result<Value> {
    if proxy.state().await? == WorkerState::Parsed {
        let installed = proxy.install().await?;
        if let Some(activation) = installed.activation {
            return to_json(&activation);
        }
    }

    let report = proxy.activate().await?;
    to_json(&report)
}

pub async fn fetch(proxy: &ProxyHandle, settings: &ProxySettings, args: FetchArgs) -> Result<Value> {
    let url = resolve(&settings.origin, &args.url)?;
    let destination = match args.destination.as_deref() {
        Some(tag) => Destination::parse(tag),
        None => Destination::infer(url.path()),
    };

    if !args.method.bytes().all(|b| b.is_ascii_alphabetic()) || args.method.is_empty() {
        bail!("invalid method '{}'", args.method);
    }
    let request = ProxyRequest::get(url, destination).with_method(&args.method);

    let (served, strategy) = proxy.respond(request.clone()).await?;
    let response = &served.response;

    to_json(&FetchOutput {
        url: request.url.to_string(),
        destination,
        source: served.source.as_str(),
        strategy,
        status: response.status,
        status_text: response.status_text.clone(),
        content_type: response.content_type().map(str::to_string),
        bytes: response.body.len(),
        body: args.body.then(|| response.body_text()),
    })
}

pub async fn version(proxy: &ProxyHandle) -> Result<Value> {
    let reply = proxy
        .post_message_with_reply(json!({"type": "GET_VERSION"}))
        .await?
        .context("worker did not answer GET_VERSION")?;
    to_json(&reply)
}

pub async fn stores(cache: &CacheDb, settings: &ProxySettings) -> Result<Value> {
    let stores = cache.list_stores().await?;
    let registration = cache.registration().await?;

    Ok(json!({
        "stores": stores,
        "current": settings.current_store_names(),
        "registration": registration,
    }))
}

pub async fn message(proxy: &ProxyHandle, args: MessageArgs) -> Result<Value> {
    let reply = proxy.post_message_with_reply(args.data).await?;
    let state = proxy.state().await?;

    Ok(json!({ "reply": reply, "state": state.as_str() }))
}

pub async fn sync(proxy: &ProxyHandle, args: SyncArgs) -> Result<Value> {
    let acknowledged = proxy.sync(&args.tag).await?;
    Ok(json!({ "tag": args.tag, "acknowledged": acknowledged }))
}
