//! Live subscriber registry.
//!
//! Tracks active query subscriptions and re-evaluates them against fresh
//! state after each committed mutation.

use dashmap::DashMap;
use prism_core::{Observer, ReadContext, ReadFn};
use std::sync::atomic::{AtomicU64, Ordering};

/// A single live subscription.
pub(crate) struct Subscriber {
    /// Token identifying this subscription
    pub(crate) token: u64,
    /// The bound read closure to re-evaluate
    pub(crate) query: ReadFn,
    /// Where results and failures go
    pub(crate) observer: Observer,
}

/// Tracks active subscriptions.
///
/// Thread-safe; shared across the store's mutate path via the store itself.
#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    /// All active subscriptions, keyed by token.
    subscribers: DashMap<u64, Subscriber>,
    /// Next token to hand out.
    next_token: AtomicU64,
}

impl SubscriberRegistry {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            next_token: AtomicU64::new(1),
        }
    }

    /// Register a new subscription. Returns its token.
    pub(crate) fn register(&self, query: ReadFn, observer: Observer) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);

        self.subscribers.insert(
            token,
            Subscriber {
                token,
                query,
                observer,
            },
        );

        tracing::debug!(token, "subscription registered");
        token
    }

    /// Unregister a subscription. Unknown tokens are ignored.
    pub(crate) fn unregister(&self, token: u64) {
        if self.subscribers.remove(&token).is_some() {
            tracing::debug!(token, "subscription unregistered");
        }
    }

    /// Re-evaluate every subscription against `view` and deliver.
    ///
    /// A failed evaluation goes to that subscriber's error callback and
    /// never interrupts delivery to the others. Returns the number of
    /// successful deliveries.
    pub(crate) fn notify_all(&self, view: &dyn ReadContext) -> usize {
        // snapshot the subscriber list so a callback that unsubscribes
        // cannot deadlock the map iteration
        let snapshot: Vec<(u64, ReadFn, Observer)> = self
            .subscribers
            .iter()
            .map(|entry| {
                let sub = entry.value();
                (sub.token, sub.query.clone(), sub.observer.clone())
            })
            .collect();

        let mut delivered = 0;
        for (token, query, observer) in snapshot {
            match query(view) {
                Ok(value) => {
                    (observer.on_data)(value);
                    delivered += 1;
                }
                Err(err) => {
                    tracing::debug!(token, error = %err, "subscription re-evaluation failed");
                    (observer.on_error)(err);
                }
            }
        }

        tracing::trace!(recipients = delivered, "notified subscriptions");
        delivered
    }

    /// Evaluate one subscription immediately (the initial delivery).
    pub(crate) fn notify_one(&self, token: u64, view: &dyn ReadContext) {
        let Some(entry) = self.subscribers.get(&token) else {
            return;
        };
        let query = entry.query.clone();
        let observer = entry.observer.clone();
        drop(entry);

        match query(view) {
            Ok(value) => (observer.on_data)(value),
            Err(err) => {
                tracing::debug!(token, error = %err, "subscription re-evaluation failed");
                (observer.on_error)(err);
            }
        }
    }

    /// Number of active subscriptions.
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
