//! One-shot provider initialization.
//!
//! Discovery order:
//! 1. `force_use_fallback`: adopt the fallback factory's provider, if any.
//! 2. The injected global, read synchronously at construction.
//! 3. After page load, the injected global again, waiting for the
//!    `surfkeeper#initialized` event when the binding is set but unusable.
//! 4. The fallback factory.
//!
//! A page that loads without the provider flag falls through to step 4
//! instead of failing; only [`ensure_initialized`] reports the absence.
//!
//! [`ensure_initialized`]: InitializationController::ensure_initialized

use std::future::Future;
use std::sync::{Arc, OnceLock};

use futures::future::{self, BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::environment::{wait_for_event, HostEvent};
use crate::error::ProviderError;
use crate::locator::ProviderLocator;
use crate::provider::Provider;

/// Write-once holder of the active provider handle.
pub(crate) type ProviderSlot = OnceLock<Arc<dyn Provider>>;

// ==============================================================================
// State
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializationState {
    Unstarted,
    WaitingForPage,
    WaitingForInjection,
    ResolvingFallback,
    /// Discovery finished. The handle may still be absent when the fallback
    /// was forced without a factory.
    Ready,
    Failed,
}

impl InitializationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

impl std::fmt::Display for InitializationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unstarted => write!(f, "unstarted"),
            Self::WaitingForPage => write!(f, "waiting_for_page"),
            Self::WaitingForInjection => write!(f, "waiting_for_injection"),
            Self::ResolvingFallback => write!(f, "resolving_fallback"),
            Self::Ready => write!(f, "ready"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// ==============================================================================
// Client Properties
// ==============================================================================

pub type FallbackFactory =
    Box<dyn FnOnce() -> BoxFuture<'static, Result<Arc<dyn Provider>, ProviderError>> + Send>;

/// Client configuration. Immutable once handed to the client.
#[derive(Default)]
pub struct ClientProperties {
    /// Ignore the injected provider and use `fallback` instead.
    pub force_use_fallback: bool,
    /// Provider factory called when no injected provider was found. Can be
    /// used to start a standalone client. Called at most once.
    pub fallback: Option<FallbackFactory>,
}

impl ClientProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force_use_fallback(mut self, force: bool) -> Self {
        self.force_use_fallback = force;
        self
    }

    pub fn with_fallback<F, Fut>(mut self, factory: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Arc<dyn Provider>, ProviderError>> + Send + 'static,
    {
        self.fallback = Some(Box::new(move || factory().boxed()));
        self
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

impl std::fmt::Debug for ClientProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientProperties")
            .field("force_use_fallback", &self.force_use_fallback)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

// ==============================================================================
// Controller
// ==============================================================================

type Completion = Shared<BoxFuture<'static, Result<(), ProviderError>>>;

/// Runs discovery once and memoizes the outcome.
///
/// The synchronous steps run inside [`start`](Self::start). The rest is a
/// shared future: spawned right away when a tokio runtime is available,
/// otherwise driven by the first caller of `ensure_initialized`.
pub(crate) struct InitializationController {
    slot: Arc<ProviderSlot>,
    state: Arc<watch::Sender<InitializationState>>,
    completion: Completion,
}

impl InitializationController {
    pub(crate) fn start(
        locator: ProviderLocator,
        properties: ClientProperties,
        slot: Arc<ProviderSlot>,
    ) -> Self {
        let (state, _) = watch::channel(InitializationState::Unstarted);
        let state = Arc::new(state);
        let ClientProperties {
            force_use_fallback,
            fallback,
        } = properties;

        let completion = if force_use_fallback {
            match fallback {
                Some(factory) => spawn_shared({
                    let slot = Arc::clone(&slot);
                    let state = Arc::clone(&state);
                    async move { resolve_fallback(factory, &slot, &state).await }
                }),
                None => {
                    debug!("fallback forced without a factory");
                    transition(&state, InitializationState::Ready);
                    future::ready(Ok(())).boxed().shared()
                }
            }
        } else if let Some(provider) = locator.current_provider() {
            debug!("injected provider already present");
            let _ = slot.set(provider);
            transition(&state, InitializationState::Ready);
            future::ready(Ok(())).boxed().shared()
        } else {
            spawn_shared({
                let slot = Arc::clone(&slot);
                let state = Arc::clone(&state);
                async move { discover(locator, fallback, &slot, &state).await }
            })
        };

        Self {
            slot,
            state,
            completion,
        }
    }

    pub(crate) fn state(&self) -> InitializationState {
        *self.state.borrow()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<InitializationState> {
        self.state.subscribe()
    }

    pub(crate) fn has_handle(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Wait for discovery to finish.
    ///
    /// Fails with [`ProviderError::NotFound`] when discovery ended without a
    /// handle, or with the fallback factory's failure.
    pub(crate) async fn ensure_initialized(&self) -> Result<(), ProviderError> {
        self.completion.clone().await?;
        if self.has_handle() {
            Ok(())
        } else {
            Err(ProviderError::NotFound)
        }
    }
}

fn spawn_shared<F>(fut: F) -> Completion
where
    F: Future<Output = Result<(), ProviderError>> + Send + 'static,
{
    let completion = fut.boxed().shared();
    if let Ok(runtime) = tokio::runtime::Handle::try_current() {
        runtime.spawn(completion.clone());
    }
    completion
}

fn transition(state: &watch::Sender<InitializationState>, next: InitializationState) {
    let previous = state.send_replace(next);
    debug!(%previous, state = %next, "initialization state");
}

async fn discover(
    locator: ProviderLocator,
    fallback: Option<FallbackFactory>,
    slot: &ProviderSlot,
    state: &watch::Sender<InitializationState>,
) -> Result<(), ProviderError> {
    transition(state, InitializationState::WaitingForPage);
    locator.probe().page_ready().await;

    transition(state, InitializationState::WaitingForInjection);
    if locator.provider_is_present().await {
        let provider = match locator.current_provider() {
            Some(provider) => Some(provider),
            None => {
                debug!("provider flag set before the handle; waiting for extension");
                let host = locator.probe().host();
                wait_for_event(host.as_ref(), HostEvent::ProviderInitialized, || {
                    host.injected_provider().is_some()
                })
                .await;
                locator.current_provider()
            }
        };
        if let Some(provider) = provider {
            let _ = slot.set(provider);
        }
    } else {
        debug!("page loaded without an injected provider");
    }

    if slot.get().is_some() {
        transition(state, InitializationState::Ready);
        return Ok(());
    }

    match fallback {
        Some(factory) => resolve_fallback(factory, slot, state).await,
        None => {
            transition(state, InitializationState::Failed);
            Ok(())
        }
    }
}

async fn resolve_fallback(
    factory: FallbackFactory,
    slot: &ProviderSlot,
    state: &watch::Sender<InitializationState>,
) -> Result<(), ProviderError> {
    transition(state, InitializationState::ResolvingFallback);
    match factory().await {
        Ok(provider) => {
            let _ = slot.set(provider);
            transition(state, InitializationState::Ready);
            Ok(())
        }
        Err(err) => {
            warn!(error = %err, "fallback provider factory failed");
            transition(state, InitializationState::Failed);
            Err(ProviderError::Fallback(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;
    use crate::environment::EnvironmentProbe;
    use crate::test_util::{mock_provider, FakeHost};

    fn controller(host: Arc<FakeHost>, properties: ClientProperties) -> InitializationController {
        let locator = ProviderLocator::new(EnvironmentProbe::new(host));
        InitializationController::start(locator, properties, Arc::new(ProviderSlot::new()))
    }

    #[tokio::test]
    async fn late_injection_waits_for_initialized_event() {
        let host = FakeHost::loading();
        let init = controller(host.clone(), ClientProperties::new());
        assert!(init.ensure_initialized().now_or_never().is_none());

        host.set_flag_only();
        host.finish_loading();
        tokio::task::yield_now().await;
        let mut pending = Box::pin(init.ensure_initialized());
        assert!((&mut pending).now_or_never().is_none());
        assert_eq!(init.state(), InitializationState::WaitingForInjection);
        assert_eq!(host.listener_count(HostEvent::ProviderInitialized), 1);

        host.inject(mock_provider());
        host.dispatch(HostEvent::ProviderInitialized);
        pending.await.expect("provider after extension signal");

        assert_eq!(init.state(), InitializationState::Ready);
        assert_eq!(host.listener_count(HostEvent::ProviderInitialized), 0);
        assert_eq!(host.listener_count(HostEvent::Load), 0);
    }

    #[tokio::test]
    async fn absent_flag_falls_through_to_fallback() {
        let host = FakeHost::loaded();
        let init = controller(
            host,
            ClientProperties::new().with_fallback(|| async {
                Ok(mock_provider() as Arc<dyn Provider>)
            }),
        );

        init.ensure_initialized().await.expect("fallback adopted");
        assert_eq!(init.state(), InitializationState::Ready);
    }

    #[tokio::test]
    async fn absent_flag_without_fallback_fails() {
        let host = FakeHost::loaded();
        let init = controller(host, ClientProperties::new());

        let err = init.ensure_initialized().await.expect_err("nothing to adopt");
        assert!(matches!(err, ProviderError::NotFound));
        assert_eq!(init.state(), InitializationState::Failed);
    }

    #[tokio::test]
    async fn failing_fallback_is_reported_to_every_waiter() {
        let host = FakeHost::loaded();
        let init = controller(
            host,
            ClientProperties::new().with_fallback(|| async {
                Err(ProviderError::Config("bridge url missing".into()))
            }),
        );

        for _ in 0..2 {
            let err = init.ensure_initialized().await.expect_err("fallback failed");
            assert!(matches!(err, ProviderError::Fallback(ref msg) if msg.contains("bridge url")));
        }
        assert_eq!(init.state(), InitializationState::Failed);
    }

    #[tokio::test]
    async fn forced_fallback_without_factory_is_ready_but_not_found() {
        let host = FakeHost::loaded();
        host.inject(mock_provider());
        let init = controller(host.clone(), ClientProperties::new().force_use_fallback(true));

        assert_eq!(init.state(), InitializationState::Ready);
        let err = init.ensure_initialized().await.expect_err("injected provider ignored");
        assert!(matches!(err, ProviderError::NotFound));
        assert_eq!(host.provider_reads(), 0);
    }

    #[tokio::test]
    async fn watch_reports_transitions() {
        let host = FakeHost::loading();
        let init = controller(host.clone(), ClientProperties::new());
        let mut states = init.watch();

        host.inject(mock_provider());
        host.finish_loading();
        states
            .wait_for(|state| state.is_terminal())
            .await
            .expect("controller keeps the sender alive");
        assert_eq!(*states.borrow(), InitializationState::Ready);
    }
}
