use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::{RequestEnvelope, RequestMethod};
use crate::error::ProviderError;
use crate::network::NetworkKey;
use crate::subscription::{
    SubscriptionDisposer, SubscriptionKind, SubscriptionListener, SubscriptionRequest,
    SubscriptionUpdate,
};
use crate::types::UnsubscriptionResponse;

use super::Provider;

type Registry = Arc<Mutex<HashMap<u64, (SubscriptionKind, SubscriptionListener)>>>;

/// A mock wallet provider for testing. Records every request envelope,
/// answers from canned responses populated via the builder pattern, and
/// keeps subscriptions in memory so tests can push updates with `emit`.
pub struct MockProvider {
    is_surf: bool,
    supports_unsubscribe: bool,
    responses: HashMap<RequestMethod, serde_json::Value>,
    networks: HashMap<NetworkKey, Arc<MockProvider>>,
    requests: Mutex<Vec<RequestEnvelope>>,
    subscriptions: Registry,
    next_subscription: AtomicU64,
}

impl MockProvider {
    pub fn builder() -> MockProviderBuilder {
        let mut responses = HashMap::new();
        let connected = serde_json::json!({
            "isConnected": true,
            "address": "0:abc",
            "publicKey": "00ff",
        });
        responses.insert(RequestMethod::Connect, connected.clone());
        responses.insert(RequestMethod::CheckConnection, connected);
        responses.insert(
            RequestMethod::Disconnect,
            serde_json::json!({ "isConnected": false }),
        );
        responses.insert(
            RequestMethod::SignData,
            serde_json::json!({ "signature": "c2lnbmF0dXJl" }),
        );
        let sent = serde_json::json!({
            "result": {
                "sendMessageResult": {
                    "shard_block_id": "shard",
                    "sending_endpoints": ["https://node"],
                },
                "messageID": "msg",
            }
        });
        responses.insert(RequestMethod::SendMessage, sent.clone());
        responses.insert(RequestMethod::SendTransaction, sent);

        MockProviderBuilder {
            is_surf: true,
            supports_unsubscribe: true,
            responses,
            networks: HashMap::new(),
        }
    }

    /// Every envelope received so far, in arrival order.
    pub fn requests(&self) -> Vec<RequestEnvelope> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().expect("subscriptions lock").len()
    }

    /// Deliver `update` to every listener registered for `kind`, in
    /// registration order, awaiting each listener before the next.
    pub async fn emit(&self, kind: &SubscriptionKind, update: SubscriptionUpdate) -> usize {
        let mut targets: Vec<(u64, SubscriptionListener)> = self
            .subscriptions
            .lock()
            .expect("subscriptions lock")
            .iter()
            .filter(|(_, (registered, _))| registered == kind)
            .map(|(id, (_, listener))| (*id, listener.clone()))
            .collect();
        targets.sort_by_key(|(id, _)| *id);

        for (_, listener) in &targets {
            listener.notify(update.clone()).await;
        }
        targets.len()
    }
}

pub struct MockProviderBuilder {
    is_surf: bool,
    supports_unsubscribe: bool,
    responses: HashMap<RequestMethod, serde_json::Value>,
    networks: HashMap<NetworkKey, Arc<MockProvider>>,
}

impl MockProviderBuilder {
    pub fn with_response(mut self, method: RequestMethod, response: serde_json::Value) -> Self {
        self.responses.insert(method, response);
        self
    }

    pub fn with_network(mut self, key: NetworkKey, provider: Arc<MockProvider>) -> Self {
        self.networks.insert(key, provider);
        self
    }

    pub fn without_surf_marker(mut self) -> Self {
        self.is_surf = false;
        self
    }

    pub fn without_unsubscribe(mut self) -> Self {
        self.supports_unsubscribe = false;
        self
    }

    pub fn build(self) -> MockProvider {
        MockProvider {
            is_surf: self.is_surf,
            supports_unsubscribe: self.supports_unsubscribe,
            responses: self.responses,
            networks: self.networks,
            requests: Mutex::new(Vec::new()),
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            next_subscription: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn is_surf(&self) -> bool {
        self.is_surf
    }

    async fn request(&self, request: RequestEnvelope) -> Result<serde_json::Value, ProviderError> {
        let method = request.method;
        self.requests.lock().expect("requests lock").push(request);
        Ok(self
            .responses
            .get(&method)
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    fn subscribe(
        &self,
        request: SubscriptionRequest,
    ) -> Result<SubscriptionDisposer, ProviderError> {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.subscriptions
            .lock()
            .expect("subscriptions lock")
            .insert(id, (request.kind, request.listener));

        let registry = Arc::clone(&self.subscriptions);
        Ok(SubscriptionDisposer::new(move || {
            registry.lock().expect("subscriptions lock").remove(&id);
        }))
    }

    async fn unsubscribe(
        &self,
        kind: &SubscriptionKind,
    ) -> Result<UnsubscriptionResponse, ProviderError> {
        if !self.supports_unsubscribe {
            return Err(ProviderError::Unsupported("unsubscribe"));
        }
        let mut subscriptions = self.subscriptions.lock().expect("subscriptions lock");
        let before = subscriptions.len();
        subscriptions.retain(|_, (registered, _)| registered != kind);
        Ok(UnsubscriptionResponse {
            is_unsubscribed: subscriptions.len() < before,
            error: None,
        })
    }

    fn network(&self, key: NetworkKey) -> Option<Arc<dyn Provider>> {
        self.networks
            .get(&key)
            .map(|provider| Arc::clone(provider) as Arc<dyn Provider>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_skips_removed_and_unrelated_listeners() {
        let provider = MockProvider::builder().build();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let listener = SubscriptionListener::new({
            let seen = Arc::clone(&seen);
            move |update| seen.lock().expect("lock").push(update)
        });

        let kept = provider
            .subscribe(SubscriptionRequest::new(
                SubscriptionKind::balance("0:abc"),
                listener.clone(),
            ))
            .expect("subscribe");
        let removed = provider
            .subscribe(SubscriptionRequest::new(
                SubscriptionKind::balance("0:abc"),
                listener,
            ))
            .expect("subscribe");
        removed.remove();

        let delivered = provider
            .emit(
                &SubscriptionKind::balance("0:abc"),
                SubscriptionUpdate::Balance("10".into()),
            )
            .await;
        let unrelated = provider
            .emit(
                &SubscriptionKind::balance("0:def"),
                SubscriptionUpdate::Balance("20".into()),
            )
            .await;

        assert_eq!(delivered, 1);
        assert_eq!(unrelated, 0);
        assert_eq!(
            *seen.lock().expect("lock"),
            vec![SubscriptionUpdate::Balance("10".into())]
        );
        drop(kept);
    }
}
