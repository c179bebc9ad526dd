//! Store boundary.
//!
//! The contract layer never talks to a concrete sync engine; it requires
//! only the [`SyncStore`] surface: named mutation dispatch, one-shot read
//! transactions, and live subscriptions. How a store persists or syncs data
//! remotely is its own business.
//!
//! Handlers see state through the dyn-safe [`ReadContext`] / [`WriteContext`]
//! traits: string keys, JSON values.

use crate::error::{Error, Result};
use crate::OperationName;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only view over store state, scoped to one transaction.
pub trait ReadContext: Send + Sync {
    /// Get the value at `key`, if present.
    fn get(&self, key: &str) -> Option<Value>;

    /// Check whether `key` holds a value.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All entries whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &str) -> Vec<(String, Value)>;
}

/// Read-write view over store state, scoped to one write transaction.
pub trait WriteContext: ReadContext {
    /// Set the value at `key`.
    fn put(&mut self, key: &str, value: Value);

    /// Remove the value at `key`. Returns whether anything was removed.
    fn delete(&mut self, key: &str) -> bool;
}

/// The in-transaction step of a mutation, produced once its input validated.
///
/// By the time a step exists, validation has already succeeded; a store runs
/// it inside a write transaction and commits only on `Ok`.
pub type MutationStep = Box<dyn FnOnce(&mut dyn WriteContext) -> Result<Value> + Send>;

/// A named mutation as installed into a store: validates and binds raw
/// input, yielding the transaction step to run.
pub type NamedMutator = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<MutationStep>> + Send + Sync>;

/// The named mutation set a store is constructed with.
pub type MutatorMap = HashMap<OperationName, NamedMutator>;

/// A read closure executed inside a store read transaction. Re-runnable:
/// live subscriptions evaluate it once per relevant state change.
pub type ReadFn = Arc<dyn Fn(&dyn ReadContext) -> Result<Value> + Send + Sync>;

/// Callback pair for a live subscription.
#[derive(Clone)]
pub struct Observer {
    /// Called with the result of each successful re-evaluation.
    pub on_data: Arc<dyn Fn(Value) + Send + Sync>,
    /// Called when a re-evaluation fails. Live consumers never see the
    /// error directly; it surfaces only through this path.
    pub on_error: Arc<dyn Fn(Error) + Send + Sync>,
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer").finish_non_exhaustive()
    }
}

/// Handle to an active store-level subscription.
///
/// Tearing down is idempotent: explicit [`cancel`](Self::cancel) followed by
/// drop runs the unsubscribe exactly once.
pub struct SubscriptionGuard {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionGuard {
    /// Wrap an unsubscribe closure.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Tear down the subscription. Calling again is a no-op.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Whether the subscription has not been torn down yet.
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("active", &self.is_active())
            .finish()
    }
}

/// The underlying transactional store, seen from the dispatch layer.
pub trait SyncStore: Send + Sync {
    /// Run the named mutation installed at construction time: validate and
    /// bind `input`, then execute the resulting step inside one write
    /// transaction. Fails with [`Error::UnknownMutation`] for a name the
    /// store was not constructed with.
    fn mutate(&self, name: &str, input: Value) -> BoxFuture<'static, Result<Value>>;

    /// Evaluate `query` once inside a fresh read transaction against
    /// current state. The transaction does not outlive the call.
    fn read(&self, query: ReadFn) -> BoxFuture<'static, Result<Value>>;

    /// Open a live subscription: deliver one initial evaluation of `query`
    /// immediately, then one per subsequent relevant state change, through
    /// `observer`. The returned guard tears the subscription down.
    fn subscribe(&self, query: ReadFn, observer: Observer) -> SubscriptionGuard;
}
