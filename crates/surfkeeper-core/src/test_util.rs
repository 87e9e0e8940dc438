//! Shared test helpers for `surfkeeper-core` unit tests.
//!
//! [`FakeHost`] stands in for a browser page: its ready state, injected
//! global and event dispatch are driven by the test, and it counts listener
//! registrations and global reads so tests can assert what discovery did.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::environment::{EventListener, HostEnvironment, HostEvent, ListenerId, ReadyState};
use crate::provider::mock::MockProvider;
use crate::provider::Provider;

type SharedListener = Arc<dyn Fn() + Send + Sync>;

pub struct FakeHost {
    ready_state: Mutex<ReadyState>,
    provider: Mutex<Option<Arc<dyn Provider>>>,
    flag_without_provider: AtomicBool,
    listeners: Mutex<HashMap<HostEvent, Vec<(ListenerId, SharedListener)>>>,
    registrations: Mutex<HashMap<HostEvent, usize>>,
    provider_reads: AtomicUsize,
    next_listener: AtomicU64,
}

impl FakeHost {
    fn with_state(ready_state: ReadyState) -> Arc<Self> {
        Arc::new(Self {
            ready_state: Mutex::new(ready_state),
            provider: Mutex::new(None),
            flag_without_provider: AtomicBool::new(false),
            listeners: Mutex::new(HashMap::new()),
            registrations: Mutex::new(HashMap::new()),
            provider_reads: AtomicUsize::new(0),
            next_listener: AtomicU64::new(1),
        })
    }

    /// A page whose document has already finished loading.
    pub fn loaded() -> Arc<Self> {
        Self::with_state(ReadyState::Complete)
    }

    /// A page still loading; call [`finish_loading`](Self::finish_loading).
    pub fn loading() -> Arc<Self> {
        Self::with_state(ReadyState::Loading)
    }

    /// Set the injected global to `provider`.
    pub fn inject(&self, provider: Arc<dyn Provider>) {
        *self.provider.lock().expect("provider lock") = Some(provider);
    }

    /// Set the global binding without a usable handle behind it yet.
    pub fn set_flag_only(&self) {
        self.flag_without_provider.store(true, Ordering::SeqCst);
    }

    pub fn finish_loading(&self) {
        *self.ready_state.lock().expect("ready state lock") = ReadyState::Complete;
        self.dispatch(HostEvent::Load);
    }

    /// Call every listener currently registered for `event`.
    pub fn dispatch(&self, event: HostEvent) {
        let listeners: Vec<SharedListener> = self
            .listeners
            .lock()
            .expect("listeners lock")
            .get(&event)
            .map(|registered| registered.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self, event: HostEvent) -> usize {
        self.listeners
            .lock()
            .expect("listeners lock")
            .get(&event)
            .map_or(0, Vec::len)
    }

    /// Total number of `add_event_listener` calls for `event`.
    pub fn registrations(&self, event: HostEvent) -> usize {
        self.registrations
            .lock()
            .expect("registrations lock")
            .get(&event)
            .copied()
            .unwrap_or(0)
    }

    pub fn provider_reads(&self) -> usize {
        self.provider_reads.load(Ordering::SeqCst)
    }
}

impl HostEnvironment for FakeHost {
    fn is_host(&self) -> bool {
        true
    }

    fn ready_state(&self) -> ReadyState {
        *self.ready_state.lock().expect("ready state lock")
    }

    fn injected_provider(&self) -> Option<Arc<dyn Provider>> {
        self.provider_reads.fetch_add(1, Ordering::SeqCst);
        self.provider.lock().expect("provider lock").clone()
    }

    fn has_provider_flag(&self) -> bool {
        self.flag_without_provider.load(Ordering::SeqCst)
            || self.provider.lock().expect("provider lock").is_some()
    }

    fn add_event_listener(&self, event: HostEvent, listener: EventListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .lock()
            .expect("listeners lock")
            .entry(event)
            .or_default()
            .push((id, Arc::from(listener)));
        *self
            .registrations
            .lock()
            .expect("registrations lock")
            .entry(event)
            .or_default() += 1;
        id
    }

    fn remove_event_listener(&self, event: HostEvent, id: ListenerId) {
        if let Some(registered) = self.listeners.lock().expect("listeners lock").get_mut(&event) {
            registered.retain(|(registered_id, _)| *registered_id != id);
        }
    }
}

/// A default mock provider, shared.
pub fn mock_provider() -> Arc<MockProvider> {
    Arc::new(MockProvider::builder().build())
}
