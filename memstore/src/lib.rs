//! # Prism MemStore
//!
//! Reference in-memory store for the Prism contract layer.
//!
//! [`MemoryStore`] implements the `prism-core` [`SyncStore`] boundary over
//! an ordered key-value map:
//!
//! - **Named mutations**: installed at construction from a registry's
//!   mutator set; each runs inside a copy-on-write write transaction that
//!   commits only on success
//! - **Point-in-time reads**: evaluated against a snapshot; nothing is held
//!   open after the call
//! - **Live subscriptions**: every commit re-evaluates all registered
//!   queries against fresh state and pushes results to observers
//!
//! This store keeps everything in process memory and does no remote sync;
//! it exists for tests, examples, and single-process consumers of the
//! contract layer.
//!
//! ## Quick Start
//!
//! ```rust
//! use prism_core::{ReadContext, Registry, TypedSchema, WriteContext};
//! use prism_memstore::MemoryStore;
//! use serde_json::{json, Value};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let registry = Registry::new()
//!     .mutation(
//!         "setGreeting",
//!         TypedSchema::<String>::new(),
//!         |ctx: &mut dyn WriteContext, greeting: String| {
//!             ctx.put("/greeting", json!(greeting));
//!             Ok(())
//!         },
//!     )
//!     .query(
//!         "greeting",
//!         TypedSchema::<Value>::new(),
//!         |ctx: &dyn ReadContext, _input: Value| Ok(ctx.get("/greeting")),
//!     );
//!
//! let store = MemoryStore::shared(registry.mutators());
//! let surface = registry.build(store);
//!
//! surface.mutate("setGreeting", json!("hello")).await.unwrap();
//!
//! let greeting = surface.query("greeting").unwrap().once(json!(null)).await.unwrap();
//! assert_eq!(greeting, json!("hello"));
//! # });
//! ```

mod store;
mod subscribers;

pub use store::MemoryStore;
