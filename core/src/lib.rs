//! # Prism Core
//!
//! A typed contract layer for local-first sync stores.
//!
//! Prism sits in front of a transactional, offline-first key-value store.
//! A producer registers named **mutations** (schema-validated,
//! state-changing operations) and **queries** (schema-validated, read-only
//! projections); callers then use them as plain strongly-typed functions,
//! with the transaction and validation plumbing hidden behind a name-keyed
//! dispatch table.
//!
//! ## Design Principles
//!
//! - **Schema-agnostic**: any validator conforming to the [`Schema`] trait
//!   plugs in, synchronous or asynchronous
//! - **Immutable registry**: every builder call returns a new registry
//!   value; earlier stages stay valid and unaffected
//! - **Store-agnostic**: the dispatch layer needs only the [`SyncStore`]
//!   boundary; conflict resolution, transport, and persistence stay on the
//!   store's side of the line
//! - **Fail-soft live queries**: a live subscription never throws at its
//!   consumer; failed re-evaluations are logged and the last good snapshot
//!   is retained
//!
//! ## Core Concepts
//!
//! ### Mutations
//!
//! A mutation is a named operation executed inside a write transaction.
//! Input is validated before the handler runs; invalid input never touches
//! state. Registered handlers are installed into the store by name, so the
//! store's own dispatch and the local [`LocalDispatcher`] share one
//! validate-then-invoke pipeline.
//!
//! ### Queries
//!
//! A query is a named read-only projection, callable three ways: inside a
//! caller-supplied transaction ([`QueryHandle::run`]), against a one-shot
//! read transaction ([`QueryHandle::once`]), or as a live subscription
//! ([`QueryHandle::watch`]) that re-delivers whenever underlying state
//! changes.
//!
//! ### Live queries
//!
//! [`LiveQuery`] bridges a query to a `tokio::sync::watch` channel of
//! [`LiveState`] (`loading` + latest data). Changing the input value tears
//! the store subscription down and opens a fresh one.
//!
//! ## Quick Start
//!
//! ```rust
//! use prism_core::{ReadContext, Registry, TypedSchema, WriteContext};
//! use serde::Deserialize;
//! use serde_json::{json, Value};
//! use std::collections::BTreeMap;
//!
//! // A scratch write context; real stores provide their own.
//! #[derive(Default)]
//! struct Scratch {
//!     map: BTreeMap<String, Value>,
//! }
//!
//! impl ReadContext for Scratch {
//!     fn get(&self, key: &str) -> Option<Value> {
//!         self.map.get(key).cloned()
//!     }
//!
//!     fn scan_prefix(&self, prefix: &str) -> Vec<(String, Value)> {
//!         self.map
//!             .range(prefix.to_owned()..)
//!             .take_while(|(k, _)| k.starts_with(prefix))
//!             .map(|(k, v)| (k.clone(), v.clone()))
//!             .collect()
//!     }
//! }
//!
//! impl WriteContext for Scratch {
//!     fn put(&mut self, key: &str, value: Value) {
//!         self.map.insert(key.to_owned(), value);
//!     }
//!
//!     fn delete(&mut self, key: &str) -> bool {
//!         self.map.remove(key).is_some()
//!     }
//! }
//!
//! #[derive(Deserialize)]
//! struct CreateUser {
//!     id: u64,
//!     name: String,
//! }
//!
//! // 1. Register operations
//! let registry = Registry::new().mutation(
//!     "createUser",
//!     TypedSchema::<CreateUser>::new(),
//!     |ctx: &mut dyn WriteContext, user: CreateUser| {
//!         ctx.put(&format!("/user/{}", user.id), json!({"name": user.name}));
//!         Ok(())
//!     },
//! );
//!
//! // 2. Dispatch by name
//! let dispatcher = registry.dispatcher();
//! let mut scratch = Scratch::default();
//! futures::executor::block_on(async {
//!     dispatcher
//!         .mutate(&mut scratch, "createUser", json!({"id": 1, "name": "Jean"}))
//!         .await
//!         .unwrap();
//! });
//!
//! assert_eq!(scratch.get("/user/1"), Some(json!({"name": "Jean"})));
//! ```
//!
//! ## Binding a store
//!
//! Consumers with a live store build a [`DispatchSurface`] instead:
//! construct the store from [`Registry::mutators`], then call
//! [`Registry::build`]. The `prism-memstore` crate ships a reference
//! in-memory store implementing the [`SyncStore`] boundary.

pub mod dispatch;
pub mod error;
pub mod live;
pub mod query;
pub mod registry;
pub mod schema;
pub mod store;
pub mod typed;

// Re-export main types at crate root
pub use dispatch::{DispatchSurface, LocalDispatcher};
pub use error::{BoxError, Error, Issue, Result, ValidationError};
pub use live::{LiveQuery, LiveState};
pub use query::QueryHandle;
pub use registry::{MutationOp, QueryBinder, Registry};
pub use schema::{
    validate, FieldDef, FieldType, ObjectSchema, ParseOutcome, Schema, TypedSchema, Validation,
};
pub use store::{
    MutationStep, MutatorMap, NamedMutator, Observer, ReadContext, ReadFn, SubscriptionGuard,
    SyncStore, WriteContext,
};
pub use typed::{MutationRef, QueryRef, TypedQuery};

/// Type aliases for clarity
pub type OperationName = String;
