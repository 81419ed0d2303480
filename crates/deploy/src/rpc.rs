//! Minimal Ethereum JSON-RPC client.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::time::Instant;
use url::Url;

/// Default timeout for a single RPC request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-RPC client bound to one endpoint.
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        let url = Url::parse(url).with_context(|| format!("Invalid RPC URL: {url}"))?;
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Make a JSON-RPC call and deserialize the result.
    ///
    /// A JSON-RPC error object is turned into an error carrying its message.
    /// A `null` result deserializes fine into an `Option`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> anyhow::Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let response = self
            .http
            .post(self.url.clone())
            .json(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": id
            }))
            .send()
            .await
            .with_context(|| format!("Failed to send {method} request"))?;

        let result: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {method} response"))?;

        if let Some(error) = result.get("error") {
            anyhow::bail!(
                "RPC error: {}",
                error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown")
            );
        }

        let result_value = result
            .get("result")
            .context("No result in response")?
            .clone();

        serde_json::from_value(result_value)
            .with_context(|| format!("Failed to deserialize {method} result"))
    }
}

/// Parse a JSON-RPC quantity (`0x`-prefixed hex) into a `u64`.
pub fn parse_quantity(s: &str) -> anyhow::Result<u64> {
    let digits = s
        .strip_prefix("0x")
        .with_context(|| format!("Quantity is not 0x-prefixed: {s}"))?;
    u64::from_str_radix(digits, 16).with_context(|| format!("Invalid quantity: {s}"))
}

/// Serde adapter for quantity fields.
pub fn deserialize_quantity<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    parse_quantity(&s).map_err(serde::de::Error::custom)
}

/// Serde adapter for optional quantity fields.
pub fn deserialize_opt_quantity<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Deserialize::deserialize(deserializer)?;
    s.map(|s| parse_quantity(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// Repeatedly run `check_fn` until it yields a value or `deadline` passes.
///
/// `Ok(None)` means "not yet"; errors are logged and retried, since a node can
/// drop a request without the underlying transaction being affected.
/// Returns `None` on timeout.
pub async fn poll_until<T, F, Fut>(
    what: &str,
    interval: Duration,
    deadline: Instant,
    mut check_fn: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<Option<T>>>,
{
    loop {
        match check_fn().await {
            Ok(Some(value)) => return Some(value),
            Ok(None) => tracing::trace!(what = %what, "Not ready yet, polling again..."),
            Err(e) => {
                tracing::debug!(error = %e, what = %what, "Poll failed, retrying...");
            }
        }

        if Instant::now() + interval > deadline {
            return None;
        }

        tokio::time::sleep(interval).await;
    }
}
