//! Subscriptions for bridges without a push channel.
//!
//! Each subscription is a tokio task that polls the bridge on a fixed
//! interval and notifies its listener when the observed value changes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::{ProviderError, RpcError};
use crate::subscription::{
    SubscriptionDisposer, SubscriptionKind, SubscriptionListener, SubscriptionRequest,
    SubscriptionUpdate,
};
use crate::types::ConnectResponse;

use super::client::BridgeTransport;

type Tasks = HashMap<SubscriptionKind, Vec<(u64, AbortHandle)>>;

/// Running polling tasks, grouped by target.
#[derive(Default)]
pub(super) struct PollRegistry {
    tasks: Arc<Mutex<Tasks>>,
    next_id: AtomicU64,
}

impl PollRegistry {
    pub(super) fn spawn(
        &self,
        transport: BridgeTransport,
        interval: Duration,
        request: SubscriptionRequest,
    ) -> Result<SubscriptionDisposer, ProviderError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ProviderError::Unsupported("subscribe outside a tokio runtime"))?;
        let SubscriptionRequest { kind, listener } = request;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let task = runtime.spawn(poll(transport, kind.clone(), listener, interval));
        let abort = task.abort_handle();
        lock(&self.tasks)
            .entry(kind.clone())
            .or_default()
            .push((id, abort.clone()));
        debug!(subscription = %kind.subscription_type(), id, "polling subscription started");

        let tasks = Arc::clone(&self.tasks);
        Ok(SubscriptionDisposer::new(move || {
            abort.abort();
            let mut tasks = lock(&tasks);
            if let Some(entries) = tasks.get_mut(&kind) {
                entries.retain(|(entry, _)| *entry != id);
                if entries.is_empty() {
                    tasks.remove(&kind);
                }
            }
            debug!(subscription = %kind.subscription_type(), id, "polling subscription removed");
        }))
    }

    /// Abort every task polling `kind`. Returns whether any was running.
    pub(super) fn cancel(&self, kind: &SubscriptionKind) -> bool {
        let Some(entries) = lock(&self.tasks).remove(kind) else {
            return false;
        };
        for (_, abort) in &entries {
            abort.abort();
        }
        !entries.is_empty()
    }

    pub(super) fn len(&self) -> usize {
        lock(&self.tasks).values().map(Vec::len).sum()
    }
}

impl Drop for PollRegistry {
    fn drop(&mut self) {
        for (_, abort) in lock(&self.tasks).values().flatten() {
            abort.abort();
        }
    }
}

fn lock(tasks: &Mutex<Tasks>) -> std::sync::MutexGuard<'_, Tasks> {
    tasks.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn poll(
    transport: BridgeTransport,
    kind: SubscriptionKind,
    listener: SubscriptionListener,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last: Option<SubscriptionUpdate> = None;

    loop {
        ticker.tick().await;
        match fetch(&transport, &kind).await {
            Ok(update) if last.as_ref() != Some(&update) => {
                listener.notify(update.clone()).await;
                last = Some(update);
            }
            Ok(_) => {}
            Err(err) => {
                warn!(subscription = %kind.subscription_type(), error = %err, "poll failed");
            }
        }
    }
}

async fn fetch(
    transport: &BridgeTransport,
    kind: &SubscriptionKind,
) -> Result<SubscriptionUpdate, RpcError> {
    match kind {
        SubscriptionKind::Balance { address } => {
            let raw = transport
                .call("getBalance", serde_json::json!({ "address": address }))
                .await?;
            parse_balance(raw).map(SubscriptionUpdate::Balance)
        }
        SubscriptionKind::IsConnected => {
            let raw = transport
                .call("checkConnection", serde_json::json!({}))
                .await?;
            let status: ConnectResponse = serde_json::from_value(raw)
                .map_err(|e| RpcError::InvalidResponse(format!("invalid checkConnection result: {e}")))?;
            Ok(SubscriptionUpdate::IsConnected(status.is_connected))
        }
    }
}

/// Balances are nano-token strings; some bridges send plain integers.
fn parse_balance(raw: serde_json::Value) -> Result<String, RpcError> {
    match raw {
        serde_json::Value::String(balance) => Ok(balance),
        serde_json::Value::Number(balance) if balance.is_u64() => Ok(balance.to_string()),
        other => Err(RpcError::InvalidResponse(format!(
            "invalid getBalance result: {other}"
        ))),
    }
}
