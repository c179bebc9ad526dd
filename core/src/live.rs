//! Live query subscription bridge.
//!
//! Adapts a transaction-scoped query plus an input value into a push-based
//! stream with a loading/ready lifecycle. The underlying store drives
//! re-evaluation; this bridge owns the per-consumer state and republishes it
//! through a watch channel.
//!
//! Lifecycle per consumer:
//! - created: `loading = true`, no data, store subscription open
//! - each successful re-evaluation: `loading = false`, data replaced
//! - each failed re-evaluation: logged, `loading` cleared, last good data
//!   retained
//! - input change: old subscription torn down, fresh one opened,
//!   `loading = true` until the first delivery under the new input
//! - detach (or drop): subscription torn down, no further callbacks

use crate::error::Result;
use crate::registry::QueryDef;
use crate::store::{Observer, SubscriptionGuard, SyncStore};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// What a live consumer observes: the loading flag plus the latest
/// successfully delivered data.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveState {
    /// True until the first delivery under the current input, and again
    /// after every input change until the next delivery.
    pub loading: bool,
    /// Latest good query result. Retained across failed re-evaluations.
    pub data: Option<Value>,
}

impl LiveState {
    fn initial() -> Self {
        Self {
            loading: true,
            data: None,
        }
    }
}

/// A live, re-subscribable view over one registered query and one input.
///
/// Owned by a single consumer; the watch channel handed out by
/// [`observe`](Self::observe) is the only shared face of its state.
pub struct LiveQuery {
    def: Arc<QueryDef>,
    store: Arc<dyn SyncStore>,
    input: Value,
    state: Arc<watch::Sender<LiveState>>,
    subscription: Option<SubscriptionGuard>,
}

impl LiveQuery {
    pub(crate) async fn start(
        def: Arc<QueryDef>,
        store: Arc<dyn SyncStore>,
        input: Value,
    ) -> Result<Self> {
        let read = (def.bind)(input.clone()).await?;
        let state = Arc::new(watch::channel(LiveState::initial()).0);
        let observer = Self::observer(&def.name, &state);
        let subscription = store.subscribe(read, observer);

        Ok(Self {
            def,
            store,
            input,
            state,
            subscription: Some(subscription),
        })
    }

    fn observer(name: &str, state: &Arc<watch::Sender<LiveState>>) -> Observer {
        let ready = Arc::clone(state);
        let failed = Arc::clone(state);
        let name = name.to_owned();

        Observer {
            on_data: Arc::new(move |value| {
                ready.send_replace(LiveState {
                    loading: false,
                    data: Some(value),
                });
            }),
            on_error: Arc::new(move |err| {
                // fail-soft: keep the last good data, only clear loading
                tracing::warn!(query = %name, error = %err, "live query re-evaluation failed");
                failed.send_modify(|s| s.loading = false);
            }),
        }
    }

    /// The name of the query this subscription evaluates.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// The current dependency input.
    pub fn input(&self) -> &Value {
        &self.input
    }

    /// Watch the loading/data lifecycle.
    pub fn observe(&self) -> watch::Receiver<LiveState> {
        self.state.subscribe()
    }

    /// The state as of now.
    pub fn snapshot(&self) -> LiveState {
        self.state.borrow().clone()
    }

    /// Replace the dependency input.
    ///
    /// Inputs compare by value, not identity: passing an equal value is a
    /// no-op. A changed value tears down the store subscription and opens a
    /// fresh one, resetting `loading` until the first delivery under the
    /// new input. An input the schema rejects fails here and leaves the
    /// current subscription running.
    pub async fn set_input(&mut self, input: Value) -> Result<()> {
        if self.input == input {
            return Ok(());
        }

        let read = (self.def.bind)(input.clone()).await?;

        self.detach();
        self.state.send_modify(|s| s.loading = true);
        self.input = input;

        let observer = Self::observer(&self.def.name, &self.state);
        self.subscription = Some(self.store.subscribe(read, observer));
        Ok(())
    }

    /// Tear down the store-level subscription. Idempotent; no callbacks
    /// fire afterwards.
    pub fn detach(&mut self) {
        if let Some(mut guard) = self.subscription.take() {
            guard.cancel();
        }
    }

    /// Whether a store-level subscription is currently open.
    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for LiveQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveQuery")
            .field("name", &self.name())
            .field("input", &self.input)
            .field("attached", &self.is_attached())
            .finish()
    }
}
