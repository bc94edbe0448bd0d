//! # JSON-RPC Chain Client
//!
//! Talks JSON-RPC 2.0 over HTTP to one of several chain nodes. WebSocket
//! endpoint URLs (`ws://`, `wss://`) are served over plain HTTP(S) on the
//! same host and path.
//!
//! ## Fail-over
//!
//! The client keeps the index of the endpoint that last answered. A call
//! that fails transiently moves on to the next endpoint, wrapping around,
//! until every endpoint has been tried once. Permanent failures and
//! "not found" answers are returned at once.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use probe_core::ErrorClass;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::RpcError;

/// JSON-RPC request structure.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a T,
    id: u64,
}

/// JSON-RPC response structure.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct JsonRpcResponse<T> {
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// HTTP form of an RPC endpoint URL.
pub fn http_endpoint(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = url.strip_prefix("ws://") {
        format!("http://{rest}")
    } else {
        url.to_string()
    }
}

/// JSON-RPC client over a list of equivalent nodes.
#[derive(Debug)]
pub struct RpcClient {
    http_client: reqwest::Client,
    endpoints: Vec<String>,
    current: AtomicUsize,
    request_id: AtomicU64,
    tx_timeout: Duration,
}

impl RpcClient {
    /// Client over `endpoints`. Queries time out after `request_timeout`,
    /// transactions after `tx_timeout`.
    pub fn new(
        endpoints: &[String],
        request_timeout: Duration,
        tx_timeout: Duration,
    ) -> Result<Self, RpcError> {
        if endpoints.is_empty() {
            return Err(RpcError::Connection("no RPC endpoints configured".into()));
        }
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            http_client,
            endpoints: endpoints.iter().map(|e| http_endpoint(e)).collect(),
            current: AtomicUsize::new(0),
            request_id: AtomicU64::new(1),
            tx_timeout,
        })
    }

    /// Endpoint currently in use.
    pub fn current_endpoint(&self) -> &str {
        &self.endpoints[self.current.load(Ordering::Relaxed) % self.endpoints.len()]
    }

    /// Find the first endpoint that answers `system_chain`. Returns the chain name.
    pub async fn connect(&self) -> Result<String, RpcError> {
        let mut failures = Vec::new();
        for (index, endpoint) in self.endpoints.iter().enumerate() {
            match self
                .call_at::<_, String>(index, "system_chain", &Vec::<()>::new(), None)
                .await
            {
                Ok(chain) => {
                    self.current.store(index, Ordering::Relaxed);
                    info!(endpoint = %endpoint, chain = %chain, "Connected to RPC node");
                    return Ok(chain);
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "RPC node unavailable");
                    failures.push(format!("{endpoint}: {e}"));
                }
            }
        }
        Err(RpcError::Connection(failures.join("; ")))
    }

    /// Read-only call with fail-over.
    pub async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, RpcError> {
        self.call_with_failover(method, params, None).await
    }

    /// Transaction submission with fail-over and the transaction timeout.
    pub async fn submit<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, RpcError> {
        self.call_with_failover(method, params, Some(self.tx_timeout))
            .await
    }

    async fn call_with_failover<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
        timeout: Option<Duration>,
    ) -> Result<R, RpcError> {
        let start = self.current.load(Ordering::Relaxed);
        let count = self.endpoints.len();
        let mut last_error = None;

        for offset in 0..count {
            let index = (start + offset) % count;
            match self.call_at(index, method, params, timeout).await {
                Ok(result) => {
                    if offset > 0 {
                        self.current.store(index, Ordering::Relaxed);
                        info!(endpoint = %self.endpoints[index], "Switched RPC endpoint");
                    }
                    return Ok(result);
                }
                Err(RpcError::NotFound(what)) => return Err(RpcError::NotFound(what)),
                Err(e) if e.class() == ErrorClass::Transient => {
                    warn!(endpoint = %self.endpoints[index], method, error = %e, "RPC call failed, trying next endpoint");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| RpcError::Connection("no RPC endpoints".into())))
    }

    /// Single JSON-RPC call against endpoint `index`.
    async fn call_at<P: Serialize, R: DeserializeOwned>(
        &self,
        index: usize,
        method: &str,
        params: &P,
        timeout: Option<Duration>,
    ) -> Result<R, RpcError> {
        let url = &self.endpoints[index];
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        let mut builder = self.http_client.post(url).json(&request);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                RpcError::Connection(format!("Cannot connect to {url}"))
            } else if e.is_timeout() {
                RpcError::Timeout(format!("{method} on {url}"))
            } else {
                RpcError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RpcError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| RpcError::Parse(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        debug!(method, id, "RPC call answered");
        rpc_response
            .result
            .ok_or_else(|| RpcError::NotFound(method.to_string()))
    }
}
