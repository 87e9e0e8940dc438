//! Wallet provider abstraction layer.
//!
//! Defines the [`Provider`] trait (the shape of the injected `surfkeeper`
//! object) and provides a standalone JSON-RPC over HTTP implementation
//! ([`HttpProvider`]) plus a test mock (`mock::MockProvider`).

mod http_adapter;
#[cfg(test)]
pub mod mock;

pub use http_adapter::{HttpProvider, HttpProviderConfig};

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{self, ApiMethod, NoParams, RequestEnvelope};
use crate::error::ProviderError;
use crate::network::NetworkKey;
use crate::subscription::{SubscriptionDisposer, SubscriptionKind, SubscriptionRequest};
use crate::types::{ConnectResponse, DisconnectResponse, UnsubscriptionResponse};

/// The wallet provider the client talks to.
///
/// Implementations only have to provide the generic [`request`](Self::request)
/// entry point and [`subscribe`](Self::subscribe); the connection lifecycle
/// methods default to routing through `request`.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Marker set by the genuine extension. Discovery ignores objects that
    /// occupy the global binding without it.
    fn is_surf(&self) -> bool {
        true
    }

    /// Generic entry point every API method goes through.
    async fn request(&self, request: RequestEnvelope) -> Result<serde_json::Value, ProviderError>;

    async fn check_connection(&self) -> Result<ConnectResponse, ProviderError> {
        call::<api::CheckConnection, _>(self, NoParams {}).await
    }

    /// Shows an approval window to the user.
    async fn connect(&self) -> Result<ConnectResponse, ProviderError> {
        call::<api::Connect, _>(self, NoParams {}).await
    }

    async fn disconnect(&self) -> Result<DisconnectResponse, ProviderError> {
        call::<api::Disconnect, _>(self, NoParams {}).await
    }

    /// Register a listener. Registration is synchronous; updates are
    /// delivered later, in order, for as long as the disposer is not removed.
    fn subscribe(&self, request: SubscriptionRequest)
        -> Result<SubscriptionDisposer, ProviderError>;

    /// Drop every listener registered for `kind`. Optional capability.
    async fn unsubscribe(
        &self,
        _kind: &SubscriptionKind,
    ) -> Result<UnsubscriptionResponse, ProviderError> {
        Err(ProviderError::Unsupported("unsubscribe"))
    }

    /// Per-network sub-interface exposed by multi-chain providers.
    fn network(&self, _key: NetworkKey) -> Option<Arc<dyn Provider>> {
        None
    }
}

/// Issue a typed call through `provider.request`.
///
/// Parameters are serialized as-is into the envelope and the raw response
/// is decoded into the method's output type.
pub async fn call<M, P>(provider: &P, params: M::Params) -> Result<M::Output, ProviderError>
where
    M: ApiMethod,
    P: Provider + ?Sized,
{
    let params = serde_json::to_value(params).map_err(|e| ProviderError::InvalidPayload {
        method: M::METHOD.to_string(),
        message: format!("encode params: {e}"),
    })?;
    let raw = provider
        .request(RequestEnvelope::new(M::METHOD, params))
        .await?;
    serde_json::from_value(raw).map_err(|e| ProviderError::InvalidPayload {
        method: M::METHOD.to_string(),
        message: format!("decode response: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::mock::MockProvider;
    use super::*;
    use crate::api::RequestMethod;

    #[tokio::test]
    async fn lifecycle_methods_route_through_request() {
        let provider = MockProvider::builder().build();

        let connected = provider.connect().await.expect("connect");
        assert!(connected.is_connected);
        provider.check_connection().await.expect("check connection");
        provider.disconnect().await.expect("disconnect");

        let methods: Vec<_> = provider.requests().iter().map(|r| r.method).collect();
        assert_eq!(
            methods,
            vec![
                RequestMethod::Connect,
                RequestMethod::CheckConnection,
                RequestMethod::Disconnect
            ]
        );
    }

    #[tokio::test]
    async fn undecodable_response_is_invalid_payload() {
        let provider = MockProvider::builder()
            .with_response(RequestMethod::SignData, serde_json::json!({ "nope": 1 }))
            .build();

        let err = call::<api::SignData, _>(
            &provider,
            crate::types::SignDataParams { data: "aGk=".into() },
        )
        .await
        .expect_err("missing signature must fail decoding");
        assert!(matches!(err, ProviderError::InvalidPayload { ref method, .. } if method == "signData"));
    }

    #[tokio::test]
    async fn unsubscribe_defaults_to_unsupported() {
        struct Minimal;

        #[async_trait]
        impl Provider for Minimal {
            async fn request(
                &self,
                _request: RequestEnvelope,
            ) -> Result<serde_json::Value, ProviderError> {
                Ok(serde_json::Value::Null)
            }

            fn subscribe(
                &self,
                _request: SubscriptionRequest,
            ) -> Result<SubscriptionDisposer, ProviderError> {
                Ok(SubscriptionDisposer::new(|| {}))
            }
        }

        let err = Minimal
            .unsubscribe(&SubscriptionKind::IsConnected)
            .await
            .expect_err("minimal provider has no unsubscribe");
        assert!(matches!(err, ProviderError::Unsupported("unsubscribe")));
        assert!(Minimal.network(NetworkKey::Ton).is_none());
    }
}
