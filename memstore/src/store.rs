//! MemoryStore - the in-memory state container.
//!
//! Holds all state as an ordered key-value map and implements the
//! [`SyncStore`] boundary: named mutation dispatch with copy-on-write
//! transactions, point-in-time reads, and live subscriptions re-evaluated
//! after every commit.

use crate::subscribers::SubscriberRegistry;
use futures::future::BoxFuture;
use prism_core::{
    Error, MutatorMap, Observer, ReadContext, ReadFn, Result, SubscriptionGuard, SyncStore,
    WriteContext,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory reference store.
///
/// State lives in an ordered map so prefix scans are deterministic. Writes
/// are serialized behind a single write lock; each mutation runs against a
/// staged copy of the map and commits only on success, so a failed handler
/// leaves state untouched and notifies nobody.
pub struct MemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    /// All state, keyed by path-style string keys
    state: RwLock<BTreeMap<String, Value>>,
    /// Named mutations installed at construction time
    mutators: MutatorMap,
    /// Active live subscriptions
    subscribers: SubscriberRegistry,
}

impl Inner {
    fn read_snapshot(&self) -> BTreeMap<String, Value> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MemoryStore {
    /// Create a store with the given named mutation set.
    pub fn new(mutators: MutatorMap) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(BTreeMap::new()),
                mutators,
                subscribers: SubscriberRegistry::new(),
            }),
        }
    }

    /// Create a store wrapped in `Arc` for sharing.
    pub fn shared(mutators: MutatorMap) -> Arc<Self> {
        Arc::new(Self::new(mutators))
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of active live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.subscriber_count()
    }

    /// A point-in-time copy of all state.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.inner.read_snapshot()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.len())
            .field("mutations", &self.inner.mutators.len())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Owned point-in-time read view.
struct StateView {
    map: BTreeMap<String, Value>,
}

impl ReadContext for StateView {
    fn get(&self, key: &str) -> Option<Value> {
        self.map.get(key).cloned()
    }

    fn scan_prefix(&self, prefix: &str) -> Vec<(String, Value)> {
        self.map
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Write view over the staged copy of one transaction.
struct TxnView<'a> {
    map: &'a mut BTreeMap<String, Value>,
}

impl ReadContext for TxnView<'_> {
    fn get(&self, key: &str) -> Option<Value> {
        self.map.get(key).cloned()
    }

    fn scan_prefix(&self, prefix: &str) -> Vec<(String, Value)> {
        self.map
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl WriteContext for TxnView<'_> {
    fn put(&mut self, key: &str, value: Value) {
        self.map.insert(key.to_owned(), value);
    }

    fn delete(&mut self, key: &str) -> bool {
        self.map.remove(key).is_some()
    }
}

impl SyncStore for MemoryStore {
    fn mutate(&self, name: &str, input: Value) -> BoxFuture<'static, Result<Value>> {
        let inner = Arc::clone(&self.inner);
        let name = name.to_owned();

        Box::pin(async move {
            let mutator = inner
                .mutators
                .get(&name)
                .cloned()
                .ok_or_else(|| Error::UnknownMutation(name.clone()))?;

            // Validation and input binding happen here; no write
            // transaction opens for input that cannot proceed.
            let step = mutator(input).await?;

            let output = {
                let mut guard = inner.state.write().unwrap_or_else(PoisonError::into_inner);
                let mut working = guard.clone();
                let output = {
                    let mut view = TxnView { map: &mut working };
                    step(&mut view)?
                };
                *guard = working;
                output
            };

            tracing::debug!(name = %name, "mutation committed");

            let view = StateView {
                map: inner.read_snapshot(),
            };
            inner.subscribers.notify_all(&view);

            Ok(output)
        })
    }

    fn read(&self, query: ReadFn) -> BoxFuture<'static, Result<Value>> {
        let inner = Arc::clone(&self.inner);

        Box::pin(async move {
            let view = StateView {
                map: inner.read_snapshot(),
            };
            query(&view)
        })
    }

    fn subscribe(&self, query: ReadFn, observer: Observer) -> SubscriptionGuard {
        let token = self.inner.subscribers.register(query, observer);

        // initial delivery against current state
        let view = StateView {
            map: self.inner.read_snapshot(),
        };
        self.inner.subscribers.notify_one(token, &view);

        let inner = Arc::clone(&self.inner);
        SubscriptionGuard::new(move || inner.subscribers.unregister(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::{MutationStep, NamedMutator};
    use serde_json::json;
    use std::sync::Mutex;

    /// A mutator that skips validation and stores `input` at a fixed key.
    fn put_mutator(key: &'static str) -> NamedMutator {
        Arc::new(move |input: Value| {
            Box::pin(async move {
                let step: MutationStep = Box::new(move |ctx| {
                    ctx.put(key, input);
                    Ok(Value::Null)
                });
                Ok(step)
            })
        })
    }

    fn failing_mutator() -> NamedMutator {
        Arc::new(|input: Value| {
            Box::pin(async move {
                let step: MutationStep = Box::new(move |ctx| {
                    // partial write, then failure: must not be visible
                    ctx.put("/partial", input);
                    Err(Error::handler(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "handler exploded",
                    )))
                });
                Ok(step)
            })
        })
    }

    fn store_with(entries: Vec<(&str, NamedMutator)>) -> Arc<MemoryStore> {
        MemoryStore::shared(
            entries
                .into_iter()
                .map(|(name, m)| (name.to_owned(), m))
                .collect(),
        )
    }

    #[tokio::test]
    async fn mutate_commits_and_reads_back() {
        let store = store_with(vec![("put", put_mutator("/k"))]);

        store.mutate("put", json!({"v": 1})).await.unwrap();

        let read: ReadFn = Arc::new(|ctx| Ok(ctx.get("/k").unwrap_or(Value::Null)));
        let value = store.read(read).await.unwrap();
        assert_eq!(value, json!({"v": 1}));
    }

    #[tokio::test]
    async fn unknown_mutation_name() {
        let store = store_with(vec![]);

        let err = store.mutate("missing", json!(null)).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown mutation: missing");
    }

    #[tokio::test]
    async fn failed_step_rolls_back() {
        let store = store_with(vec![("boom", failing_mutator())]);

        let err = store.mutate("boom", json!(1)).await.unwrap_err();
        assert_eq!(err.to_string(), "handler exploded");

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn failed_step_notifies_nobody() {
        let store = store_with(vec![("boom", failing_mutator())]);

        let deliveries = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&deliveries);
        let read: ReadFn = Arc::new(|ctx| Ok(ctx.get("/partial").unwrap_or(Value::Null)));
        let _sub = store.subscribe(
            read,
            Observer {
                on_data: Arc::new(move |value| sink.lock().unwrap().push(value)),
                on_error: Arc::new(|_err| {}),
            },
        );

        // the initial delivery is the only one
        assert_eq!(deliveries.lock().unwrap().len(), 1);

        let _ = store.mutate("boom", json!(1)).await;
        assert_eq!(deliveries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn subscribe_delivers_initial_and_per_commit() {
        let store = store_with(vec![("put", put_mutator("/k"))]);

        let deliveries = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&deliveries);
        let read: ReadFn = Arc::new(|ctx| Ok(ctx.get("/k").unwrap_or(Value::Null)));
        let sub = store.subscribe(
            read,
            Observer {
                on_data: Arc::new(move |value| sink.lock().unwrap().push(value)),
                on_error: Arc::new(|_err| {}),
            },
        );

        store.mutate("put", json!("a")).await.unwrap();
        store.mutate("put", json!("b")).await.unwrap();

        assert_eq!(
            *deliveries.lock().unwrap(),
            vec![json!(null), json!("a"), json!("b")]
        );

        drop(sub);
        assert_eq!(store.subscriber_count(), 0);

        store.mutate("put", json!("c")).await.unwrap();
        assert_eq!(deliveries.lock().unwrap().len(), 3);
    }
}
