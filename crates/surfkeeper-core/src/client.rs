use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{self, ApiMethod, NoParams};
use crate::dispatch::{RpcDispatch, SubscriptionDispatch};
use crate::environment::{EnvironmentProbe, HostEnvironment};
use crate::error::ProviderError;
use crate::init::{ClientProperties, InitializationController, InitializationState, ProviderSlot};
use crate::locator::ProviderLocator;
use crate::network::{NetworkKey, NetworkMultiplexer};
use crate::provider::Provider;
use crate::subscription::{SubscriptionDisposer, SubscriptionKind, SubscriptionRequest};
use crate::types::{
    ConnectResponse, DisconnectResponse, OperationResponse, SendMessageParams, SendResult,
    SendTransactionParams, SignDataOutput, SignDataParams, UnsubscriptionResponse,
};

// ==============================================================================
// Client
// ==============================================================================

/// Entry point for applications talking to the Surfkeeper wallet.
///
/// Construction starts provider discovery and returns immediately. Every
/// operation waits for discovery to finish before forwarding the call, so
/// callers do not have to call [`ensure_initialized`](Self::ensure_initialized)
/// themselves.
pub struct ProviderRpcClient {
    has_fallback: bool,
    locator: ProviderLocator,
    init: InitializationController,
    slot: Arc<ProviderSlot>,
    api: RpcDispatch,
    subscriptions: SubscriptionDispatch,
    networks: NetworkMultiplexer,
}

impl ProviderRpcClient {
    pub fn new(host: Arc<dyn HostEnvironment>, properties: ClientProperties) -> Self {
        let locator = ProviderLocator::new(EnvironmentProbe::new(host));
        let slot = Arc::new(ProviderSlot::new());
        let has_fallback = properties.has_fallback();

        Self {
            has_fallback,
            api: RpcDispatch::new(Arc::clone(&slot)),
            subscriptions: SubscriptionDispatch::new(Arc::clone(&slot)),
            networks: NetworkMultiplexer::new(&slot),
            init: InitializationController::start(locator.clone(), properties, Arc::clone(&slot)),
            locator,
            slot,
        }
    }

    /// Whether the page has an injected provider or a fallback is configured.
    pub async fn has_provider(&self) -> bool {
        if self.has_fallback {
            return true;
        }
        self.locator.provider_is_present().await
    }

    /// Wait until the provider API is available, calling the fallback
    /// factory if no injected provider was found.
    pub async fn ensure_initialized(&self) -> Result<(), ProviderError> {
        self.init.ensure_initialized().await
    }

    /// Whether a provider handle is set. Never waits.
    pub fn is_initialized(&self) -> bool {
        self.init.has_handle()
    }

    pub fn state(&self) -> InitializationState {
        self.init.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<InitializationState> {
        self.init.watch()
    }

    /// The raw provider handle.
    pub fn provider(&self) -> Result<Arc<dyn Provider>, ProviderError> {
        self.slot
            .get()
            .map(Arc::clone)
            .ok_or(ProviderError::NotInitialized)
    }

    /// The raw RPC proxy. Does not wait for initialization.
    pub fn api(&self) -> &RpcDispatch {
        &self.api
    }

    /// The raw subscription proxy. Does not wait for initialization, so
    /// listeners can be registered early by callers that track readiness.
    pub fn subscriptions(&self) -> &SubscriptionDispatch {
        &self.subscriptions
    }

    pub fn networks(&self) -> &NetworkMultiplexer {
        &self.networks
    }

    /// Operations addressed to one network of a multi-chain provider.
    pub fn on(&self, key: NetworkKey) -> NetworkScope<'_> {
        NetworkScope { client: self, key }
    }

    async fn call<M: ApiMethod>(
        &self,
        rpc: &RpcDispatch,
        params: M::Params,
    ) -> Result<M::Output, ProviderError> {
        self.ensure_initialized().await?;
        rpc.call::<M>(params).await
    }

    /// Connect the extension. Shows an approval window to the user.
    pub async fn connect(&self) -> Result<ConnectResponse, ProviderError> {
        self.call::<api::Connect>(&self.api, NoParams {}).await
    }

    /// Current connection status.
    pub async fn connect_status(&self) -> Result<ConnectResponse, ProviderError> {
        self.call::<api::CheckConnection>(&self.api, NoParams {})
            .await
    }

    pub async fn disconnect(&self) -> Result<DisconnectResponse, ProviderError> {
        self.call::<api::Disconnect>(&self.api, NoParams {}).await
    }

    /// Sign arbitrary data. Shows an approval window to the user.
    pub async fn sign_data(&self, params: SignDataParams) -> Result<SignDataOutput, ProviderError> {
        self.call::<api::SignData>(&self.api, params).await
    }

    /// Send an internal message from the user account. Shows an approval
    /// window to the user.
    pub async fn send_message(
        &self,
        params: SendMessageParams,
    ) -> Result<OperationResponse<SendResult>, ProviderError> {
        self.call::<api::SendMessage>(&self.api, params).await
    }

    /// Send a transaction. Shows an approval window to the user.
    pub async fn send_transaction(
        &self,
        params: SendTransactionParams,
    ) -> Result<OperationResponse<SendResult>, ProviderError> {
        self.call::<api::SendTransaction>(&self.api, params).await
    }

    /// Subscribe to updates once the provider is available.
    pub async fn subscribe(
        &self,
        request: SubscriptionRequest,
    ) -> Result<SubscriptionDisposer, ProviderError> {
        self.ensure_initialized().await?;
        self.subscriptions.subscribe(request)
    }

    pub async fn unsubscribe(
        &self,
        kind: &SubscriptionKind,
    ) -> Result<UnsubscriptionResponse, ProviderError> {
        self.ensure_initialized().await?;
        self.subscriptions.unsubscribe(kind).await
    }
}

impl std::fmt::Debug for ProviderRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRpcClient")
            .field("state", &self.state())
            .field("initialized", &self.is_initialized())
            .field("has_fallback", &self.has_fallback)
            .finish()
    }
}

// ==============================================================================
// Network Scope
// ==============================================================================

/// A client view bound to one [`NetworkKey`]. Waits for initialization like
/// the client, then forwards to the provider's sub-interface for the key.
#[derive(Debug, Clone, Copy)]
pub struct NetworkScope<'a> {
    client: &'a ProviderRpcClient,
    key: NetworkKey,
}

impl NetworkScope<'_> {
    pub fn key(&self) -> NetworkKey {
        self.key
    }

    pub async fn call<M: ApiMethod>(&self, params: M::Params) -> Result<M::Output, ProviderError> {
        self.client
            .call::<M>(self.client.networks.rpc(self.key), params)
            .await
    }

    pub async fn connect_status(&self) -> Result<ConnectResponse, ProviderError> {
        self.call::<api::CheckConnection>(NoParams {}).await
    }

    pub async fn sign_data(&self, params: SignDataParams) -> Result<SignDataOutput, ProviderError> {
        self.call::<api::SignData>(params).await
    }

    pub async fn send_message(
        &self,
        params: SendMessageParams,
    ) -> Result<OperationResponse<SendResult>, ProviderError> {
        self.call::<api::SendMessage>(params).await
    }

    pub async fn send_transaction(
        &self,
        params: SendTransactionParams,
    ) -> Result<OperationResponse<SendResult>, ProviderError> {
        self.call::<api::SendTransaction>(params).await
    }

    pub async fn subscribe(
        &self,
        request: SubscriptionRequest,
    ) -> Result<SubscriptionDisposer, ProviderError> {
        self.client.ensure_initialized().await?;
        self.client.networks.subscriptions(self.key).subscribe(request)
    }
}
