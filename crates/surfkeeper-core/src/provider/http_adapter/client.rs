use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header;
use tracing::{debug, trace};

use crate::error::{ProviderError, RpcError};
use crate::network::NetworkKey;

use super::connection::{parse_connection, resolve_auth};
use super::protocol::{parse_jsonrpc_error, JsonRpcRequest, JsonRpcResponse};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// JSON-RPC 2.0 client for a wallet bridge endpoint.
///
/// Cheap to clone. Clones and per-network views share the connection pool,
/// the rate limiter and the request id counter.
#[derive(Clone)]
pub(super) struct BridgeTransport {
    client: reqwest::Client,
    url: String,
    auth: Option<(String, String)>,
    limiter: Option<Arc<DirectRateLimiter>>,
    next_id: Arc<AtomicU64>,
}

impl BridgeTransport {
    /// Create a transport for an HTTP(S) bridge URL.
    ///
    /// `user` and `pass` must be set together. If `requests_per_second` is
    /// set, every outbound request waits for the limiter.
    pub(super) fn new(
        connection: &str,
        user: Option<&str>,
        pass: Option<&str>,
        requests_per_second: Option<u32>,
    ) -> Result<Self, ProviderError> {
        let auth = resolve_auth(user, pass)?;
        let url = parse_connection(connection)?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ProviderError::Config(format!("build http client: {e}")))?;

        let limiter = match requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    ProviderError::Config("requests_per_second must be at least 1".to_owned())
                })?;
                Some(Arc::new(RateLimiter::direct(Quota::per_second(limit))))
            }
        };

        Ok(Self {
            client,
            url,
            auth,
            limiter,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub(super) fn url(&self) -> &str {
        &self.url
    }

    /// A transport addressing the bridge's sub-interface for `key`.
    pub(super) fn for_network(&self, key: NetworkKey) -> Self {
        Self {
            url: format!("{}/networks/{key}", self.url),
            ..self.clone()
        }
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    pub(super) async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RpcError> {
        self.wait_for_rate_limit().await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(rpc.id = id, rpc.method = method, url = %self.url, "rpc call");
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let mut builder = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&req);
        if let Some((ref user, ref pass)) = self.auth {
            builder = builder.basic_auth(user, Some(pass));
        }

        let response = builder.send().await?;
        let status = response.status();

        let body = response.text().await?;
        debug!(rpc.id = id, rpc.method = method, %status, body_len = body.len(), "rpc response");
        trace!(rpc.id = id, rpc.method = method, body = %body, "rpc response body");

        let decoded: JsonRpcResponse = serde_json::from_str(&body).map_err(|e| {
            RpcError::InvalidResponse(format!("decode JSON-RPC response: {e}; body={body}"))
        })?;

        if let Some(err) = decoded.error {
            return Err(parse_jsonrpc_error(err));
        }

        Ok(decoded.result.unwrap_or(serde_json::Value::Null))
    }
}
