//! Forwarding of named calls to the active provider handle.
//!
//! Neither proxy knows about individual methods: the method name and the
//! parameter/output types come from [`ApiMethod`] at the call site, and the
//! proxy only resolves the current handle and hands the envelope over. The
//! proxies never wait for initialization; calling them before a handle exists
//! fails with [`ProviderError::NotInitialized`].

use std::sync::Arc;

use tracing::{debug, trace};

use crate::api::{ApiMethod, RequestEnvelope};
use crate::error::ProviderError;
use crate::init::ProviderSlot;
use crate::network::NetworkKey;
use crate::provider::{self, Provider};
use crate::subscription::{SubscriptionDisposer, SubscriptionKind, SubscriptionRequest};
use crate::types::UnsubscriptionResponse;

/// Resolve the handle a proxy forwards to: the provider itself, or its
/// per-network sub-interface.
fn resolve_target(
    slot: &ProviderSlot,
    network: Option<NetworkKey>,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider = slot.get().ok_or(ProviderError::NotInitialized)?;
    match network {
        None => Ok(Arc::clone(provider)),
        Some(key) => provider.network(key).ok_or(ProviderError::NotInitialized),
    }
}

// ==============================================================================
// RPC Dispatch
// ==============================================================================

/// Forwards API calls to the provider's `request` entry point.
#[derive(Clone)]
pub struct RpcDispatch {
    slot: Arc<ProviderSlot>,
    network: Option<NetworkKey>,
}

impl RpcDispatch {
    pub(crate) fn new(slot: Arc<ProviderSlot>) -> Self {
        Self {
            slot,
            network: None,
        }
    }

    pub(crate) fn for_network(slot: Arc<ProviderSlot>, key: NetworkKey) -> Self {
        Self {
            slot,
            network: Some(key),
        }
    }

    /// The network this proxy addresses; `None` for the provider itself.
    pub fn network(&self) -> Option<NetworkKey> {
        self.network
    }

    /// Forward a raw envelope unmodified.
    pub async fn request(&self, envelope: RequestEnvelope) -> Result<serde_json::Value, ProviderError> {
        let target = resolve_target(&self.slot, self.network)?;
        debug!(rpc.method = %envelope.method, network = ?self.network, "forward request");
        let response = target.request(envelope).await?;
        trace!(network = ?self.network, response = %response, "provider response");
        Ok(response)
    }

    /// Forward a typed call for method `M`.
    pub async fn call<M: ApiMethod>(&self, params: M::Params) -> Result<M::Output, ProviderError> {
        let target = resolve_target(&self.slot, self.network)?;
        debug!(rpc.method = %M::METHOD, network = ?self.network, "forward call");
        provider::call::<M, _>(target.as_ref(), params).await
    }
}

impl std::fmt::Debug for RpcDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcDispatch")
            .field("network", &self.network)
            .field("initialized", &self.slot.get().is_some())
            .finish()
    }
}

// ==============================================================================
// Subscription Dispatch
// ==============================================================================

/// Forwards subscription registrations to the provider.
#[derive(Clone)]
pub struct SubscriptionDispatch {
    slot: Arc<ProviderSlot>,
    network: Option<NetworkKey>,
}

impl SubscriptionDispatch {
    pub(crate) fn new(slot: Arc<ProviderSlot>) -> Self {
        Self {
            slot,
            network: None,
        }
    }

    pub(crate) fn for_network(slot: Arc<ProviderSlot>, key: NetworkKey) -> Self {
        Self {
            slot,
            network: Some(key),
        }
    }

    /// Register a listener. Returns the provider's disposer synchronously.
    pub fn subscribe(
        &self,
        request: SubscriptionRequest,
    ) -> Result<SubscriptionDisposer, ProviderError> {
        let target = resolve_target(&self.slot, self.network)?;
        debug!(
            subscription = %request.kind.subscription_type(),
            network = ?self.network,
            "forward subscribe"
        );
        target.subscribe(request)
    }

    pub async fn unsubscribe(
        &self,
        kind: &SubscriptionKind,
    ) -> Result<UnsubscriptionResponse, ProviderError> {
        let target = resolve_target(&self.slot, self.network)?;
        debug!(
            subscription = %kind.subscription_type(),
            network = ?self.network,
            "forward unsubscribe"
        );
        target.unsubscribe(kind).await
    }
}

impl std::fmt::Debug for SubscriptionDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionDispatch")
            .field("network", &self.network)
            .field("initialized", &self.slot.get().is_some())
            .finish()
    }
}
