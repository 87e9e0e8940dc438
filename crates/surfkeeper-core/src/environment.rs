//! Host environment access and the page-ready probe.
//!
//! The client never reads ambient globals. Everything it needs from the host
//! (document state, the injected `surfkeeper` binding, event registration)
//! goes through a [`HostEnvironment`] passed in at construction.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::oneshot;
use tracing::debug;

use crate::provider::Provider;

/// `document.readyState` of the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// Events the client listens for on the host's global event target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// The page finished loading.
    Load,
    /// The extension finished initializing the injected provider.
    ProviderInitialized,
}

impl HostEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::ProviderInitialized => "surfkeeper#initialized",
        }
    }
}

impl std::fmt::Display for HostEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

pub type EventListener = Box<dyn Fn() + Send + Sync>;

/// The host the client runs in.
///
/// Hosts must allow a listener to be removed after it has fired, and must not
/// call listeners while holding a lock that `remove_event_listener` needs.
pub trait HostEnvironment: Send + Sync {
    /// Whether a DOM-capable window and document exist.
    fn is_host(&self) -> bool;

    fn ready_state(&self) -> ReadyState;

    /// Current value of the injected global binding, read at call time.
    fn injected_provider(&self) -> Option<Arc<dyn Provider>>;

    /// Whether the global binding is set at all. The extension may set the
    /// binding before the handle behind it can be used.
    fn has_provider_flag(&self) -> bool {
        self.injected_provider().is_some()
    }

    fn add_event_listener(&self, event: HostEvent, listener: EventListener) -> ListenerId;

    fn remove_event_listener(&self, event: HostEvent, id: ListenerId);
}

// ==============================================================================
// Headless Host
// ==============================================================================

/// Host for runtimes without a page: no document, no injected provider.
/// Discovery resolves to "absent" immediately, leaving only the fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessEnvironment;

impl HostEnvironment for HeadlessEnvironment {
    fn is_host(&self) -> bool {
        false
    }

    fn ready_state(&self) -> ReadyState {
        ReadyState::Complete
    }

    fn injected_provider(&self) -> Option<Arc<dyn Provider>> {
        None
    }

    fn add_event_listener(&self, _event: HostEvent, _listener: EventListener) -> ListenerId {
        ListenerId(0)
    }

    fn remove_event_listener(&self, _event: HostEvent, _id: ListenerId) {}
}

// ==============================================================================
// One-shot Events
// ==============================================================================

/// Wait for the next `event` on `host`.
///
/// The listener is registered before `already` is evaluated, so an event
/// firing between the check and the registration cannot be missed. If
/// `already` holds, or once the event fires, the listener is removed.
pub(crate) async fn wait_for_event<F>(host: &dyn HostEnvironment, event: HostEvent, already: F)
where
    F: FnOnce() -> bool,
{
    let (tx, rx) = oneshot::channel::<()>();
    let tx = Mutex::new(Some(tx));
    let id = host.add_event_listener(
        event,
        Box::new(move || {
            let sender = tx.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(sender) = sender {
                let _ = sender.send(());
            }
        }),
    );
    debug!(%event, listener = id.0, "registered host event listener");

    if !already() && rx.await.is_err() {
        debug!(%event, "host dropped event listener before it fired");
    }

    host.remove_event_listener(event, id);
    debug!(%event, listener = id.0, "removed host event listener");
}

// ==============================================================================
// Environment Probe
// ==============================================================================

/// Detects the host and memoizes page-load completion.
///
/// [`page_ready`](Self::page_ready) returns clones of one shared future: the
/// load listener is registered on first poll, at most once, and every caller
/// observes the same completion.
#[derive(Clone)]
pub struct EnvironmentProbe {
    host: Arc<dyn HostEnvironment>,
    page_ready: Shared<BoxFuture<'static, ()>>,
}

impl EnvironmentProbe {
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        let page_ready = {
            let host = Arc::clone(&host);
            async move {
                if !host.is_host() {
                    return;
                }
                wait_for_event(host.as_ref(), HostEvent::Load, || {
                    host.ready_state() == ReadyState::Complete
                })
                .await;
                debug!("page ready");
            }
            .boxed()
            .shared()
        };
        Self { host, page_ready }
    }

    pub fn host(&self) -> &Arc<dyn HostEnvironment> {
        &self.host
    }

    pub fn is_host_environment(&self) -> bool {
        self.host.is_host()
    }

    /// Resolves immediately outside a host or on a completely loaded page,
    /// otherwise when the load event fires.
    pub fn page_ready(&self) -> Shared<BoxFuture<'static, ()>> {
        self.page_ready.clone()
    }
}

impl std::fmt::Debug for EnvironmentProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentProbe")
            .field("is_host", &self.host.is_host())
            .finish()
    }
}
