use std::sync::Arc;

use tracing::debug;

use crate::environment::EnvironmentProbe;
use crate::provider::Provider;

/// Reads the injected `surfkeeper` global through the host.
///
/// Nothing is cached: the extension may inject the provider at any point,
/// so every lookup reads the binding again.
#[derive(Debug, Clone)]
pub struct ProviderLocator {
    probe: EnvironmentProbe,
}

impl ProviderLocator {
    pub fn new(probe: EnvironmentProbe) -> Self {
        Self { probe }
    }

    pub fn probe(&self) -> &EnvironmentProbe {
        &self.probe
    }

    pub fn current_provider(&self) -> Option<Arc<dyn Provider>> {
        if !self.probe.is_host_environment() {
            return None;
        }
        self.probe.host().injected_provider()
    }

    /// Whether the page carries the provider once it has loaded.
    ///
    /// A readable handle must also carry the `is_surf` marker; a binding set
    /// without a handle yet counts as present.
    pub async fn provider_is_present(&self) -> bool {
        if !self.probe.is_host_environment() {
            return false;
        }
        self.probe.page_ready().await;

        let host = self.probe.host();
        let present = host.has_provider_flag()
            && host
                .injected_provider()
                .map_or(true, |provider| provider.is_surf());
        debug!(present, "checked injected provider");
        present
    }
}
