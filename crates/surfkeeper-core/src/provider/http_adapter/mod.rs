//! Standalone provider backed by a wallet bridge over HTTP.
//!
//! Implements [`Provider`] over JSON-RPC 2.0 using `reqwest`, with optional
//! basic auth and request rate limiting. Subscriptions are served by polling
//! because the bridge has no push channel. Usually installed as the client's
//! fallback factory when no extension is injected.

mod client;
mod connection;
mod poller;
mod protocol;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::api::RequestEnvelope;
use crate::error::ProviderError;
use crate::network::NetworkKey;
use crate::subscription::{SubscriptionDisposer, SubscriptionKind, SubscriptionRequest};
use crate::types::UnsubscriptionResponse;

use self::client::BridgeTransport;
use self::poller::PollRegistry;

use super::Provider;

/// Connection settings for [`HttpProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpProviderConfig {
    /// Bridge endpoint, `http://` or `https://`.
    pub url: String,
    pub user: Option<String>,
    pub pass: Option<String>,
    /// Outbound request budget shared by the provider and its network views.
    pub requests_per_second: Option<u32>,
    /// How often subscriptions poll the bridge.
    pub poll_interval: Duration,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080".to_owned(),
            user: None,
            pass: None,
            requests_per_second: None,
            poll_interval: Duration::from_secs(5),
        }
    }
}

pub struct HttpProvider {
    transport: BridgeTransport,
    poll_interval: Duration,
    subscriptions: PollRegistry,
    networks: HashMap<NetworkKey, Arc<HttpProvider>>,
}

impl HttpProvider {
    pub fn new(config: HttpProviderConfig) -> Result<Self, ProviderError> {
        if config.poll_interval.is_zero() {
            return Err(ProviderError::Config(
                "poll interval must be greater than zero".to_owned(),
            ));
        }
        let transport = BridgeTransport::new(
            &config.url,
            config.user.as_deref(),
            config.pass.as_deref(),
            config.requests_per_second,
        )?;
        debug!(url = transport.url(), "http provider configured");

        let networks = NetworkKey::ALL
            .into_iter()
            .map(|key| {
                let view = Self::view(transport.for_network(key), config.poll_interval);
                (key, Arc::new(view))
            })
            .collect();

        Ok(Self {
            networks,
            ..Self::view(transport, config.poll_interval)
        })
    }

    fn view(transport: BridgeTransport, poll_interval: Duration) -> Self {
        Self {
            transport,
            poll_interval,
            subscriptions: PollRegistry::default(),
            networks: HashMap::new(),
        }
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("url", &self.transport.url())
            .field("poll_interval", &self.poll_interval)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn request(&self, request: RequestEnvelope) -> Result<serde_json::Value, ProviderError> {
        let response = self
            .transport
            .call(request.method.as_str(), request.params)
            .await?;
        Ok(response)
    }

    fn subscribe(
        &self,
        request: SubscriptionRequest,
    ) -> Result<SubscriptionDisposer, ProviderError> {
        self.subscriptions
            .spawn(self.transport.clone(), self.poll_interval, request)
    }

    async fn unsubscribe(
        &self,
        kind: &SubscriptionKind,
    ) -> Result<UnsubscriptionResponse, ProviderError> {
        Ok(UnsubscriptionResponse {
            is_unsubscribed: self.subscriptions.cancel(kind),
            error: None,
        })
    }

    fn network(&self, key: NetworkKey) -> Option<Arc<dyn Provider>> {
        self.networks
            .get(&key)
            .map(|view| Arc::clone(view) as Arc<dyn Provider>)
    }
}
