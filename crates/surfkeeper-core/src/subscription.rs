//! Subscription requests, listeners, and disposers.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::types::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubscriptionType {
    Balance,
    IsConnected,
}

impl std::fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Balance => write!(f, "balance"),
            Self::IsConnected => write!(f, "isConnected"),
        }
    }
}

/// What a subscription is about. Serialized the way the provider expects
/// subscription parameters: `{"type": "balance", "address": "0:..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SubscriptionKind {
    Balance { address: Address },
    IsConnected,
}

impl SubscriptionKind {
    pub fn balance(address: impl Into<Address>) -> Self {
        Self::Balance {
            address: address.into(),
        }
    }

    pub fn subscription_type(&self) -> SubscriptionType {
        match self {
            Self::Balance { .. } => SubscriptionType::Balance,
            Self::IsConnected => SubscriptionType::IsConnected,
        }
    }
}

/// A value pushed by the provider to a subscription listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionUpdate {
    /// Account balance in nano tokens.
    Balance(String),
    IsConnected(bool),
}

// ==============================================================================
// Listener
// ==============================================================================

type ListenerFn = dyn Fn(SubscriptionUpdate) -> BoxFuture<'static, ()> + Send + Sync;

/// Callback invoked by the provider on every update of a subscription.
///
/// The future returned by [`notify`](Self::notify) belongs to whoever
/// delivers the update; nothing reports back to the provider.
#[derive(Clone)]
pub struct SubscriptionListener(Arc<ListenerFn>);

impl SubscriptionListener {
    pub fn new<F>(listener: F) -> Self
    where
        F: Fn(SubscriptionUpdate) + Send + Sync + 'static,
    {
        Self(Arc::new(move |update| {
            listener(update);
            future::ready(()).boxed()
        }))
    }

    pub fn new_async<F, Fut>(listener: F) -> Self
    where
        F: Fn(SubscriptionUpdate) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self(Arc::new(move |update| listener(update).boxed()))
    }

    pub fn notify(&self, update: SubscriptionUpdate) -> BoxFuture<'static, ()> {
        (self.0)(update)
    }
}

impl std::fmt::Debug for SubscriptionListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SubscriptionListener")
    }
}

#[derive(Debug, Clone)]
pub struct SubscriptionRequest {
    pub kind: SubscriptionKind,
    pub listener: SubscriptionListener,
}

impl SubscriptionRequest {
    pub fn new(kind: SubscriptionKind, listener: SubscriptionListener) -> Self {
        Self { kind, listener }
    }
}

// ==============================================================================
// Disposer
// ==============================================================================

type RemoveFn = Box<dyn FnOnce() + Send>;

/// Detaches a subscription. Owned by the caller of `subscribe`.
///
/// Only the first [`remove`](Self::remove) runs the provider's detach logic;
/// later calls are no-ops. Dropping the disposer does not detach anything.
pub struct SubscriptionDisposer {
    remove: Mutex<Option<RemoveFn>>,
}

impl SubscriptionDisposer {
    pub fn new<F>(remove: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            remove: Mutex::new(Some(Box::new(remove))),
        }
    }

    pub fn remove(&self) {
        let remove = self
            .remove
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(remove) = remove {
            remove();
        }
    }

    pub fn is_removed(&self) -> bool {
        self.remove
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl std::fmt::Debug for SubscriptionDisposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionDisposer")
            .field("removed", &self.is_removed())
            .finish()
    }
}
