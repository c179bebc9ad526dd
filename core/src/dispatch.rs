//! Mutation dispatchers.
//!
//! Two flavors of the same resolve-validate-invoke sequence:
//!
//! - [`LocalDispatcher`] - producer-side direct invocation, where the caller
//!   already holds a write transaction (a sync server applying pushed
//!   mutations inside its own transaction, for instance).
//! - [`DispatchSurface`] - consumer-side, bound to a live store; mutations
//!   route by name through the store's own transaction machinery, queries
//!   come back as [`QueryHandle`] facades.
//!
//! Both resolve the name first: nothing is validated and no transaction is
//! opened for a name nothing registered.

use crate::error::{Error, Result};
use crate::query::QueryHandle;
use crate::registry::{MutationDef, QueryDef};
use crate::store::{SyncStore, WriteContext};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Producer-side dispatcher: resolves a name, validates input, and invokes
/// the handler against a caller-supplied write context.
pub struct LocalDispatcher {
    mutations: HashMap<String, Arc<MutationDef>>,
}

impl LocalDispatcher {
    pub(crate) fn new(mutations: HashMap<String, Arc<MutationDef>>) -> Self {
        Self { mutations }
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.mutations.contains_key(name)
    }

    /// Dispatch `name` with `input` against `ctx`.
    ///
    /// Fails with [`Error::UnknownMutation`] for an unregistered name and
    /// [`Error::Validation`] for input the schema rejects; in both cases the
    /// handler never runs. Handler errors propagate unmodified.
    pub async fn mutate(
        &self,
        ctx: &mut dyn WriteContext,
        name: &str,
        input: Value,
    ) -> Result<Value> {
        let def = self
            .mutations
            .get(name)
            .ok_or_else(|| Error::UnknownMutation(name.to_owned()))?;
        let step = (def.prepare)(input).await?;
        step(ctx)
    }
}

impl std::fmt::Debug for LocalDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDispatcher")
            .field("mutations", &self.mutations.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The built, immutable dispatch surface bound to a live store.
///
/// Created once by [`Registry::build`](crate::Registry::build), shared by
/// value for the life of the owning session. Holds no mutable state; the
/// store handle it forwards to is shared, not owned.
#[derive(Clone)]
pub struct DispatchSurface {
    mutations: HashMap<String, Arc<MutationDef>>,
    queries: HashMap<String, Arc<QueryDef>>,
    store: Arc<dyn SyncStore>,
}

impl DispatchSurface {
    pub(crate) fn new(
        mutations: HashMap<String, Arc<MutationDef>>,
        queries: HashMap<String, Arc<QueryDef>>,
        store: Arc<dyn SyncStore>,
    ) -> Self {
        Self {
            mutations,
            queries,
            store,
        }
    }

    /// Dispatch the named mutation through the underlying store.
    ///
    /// The name is resolved here first, so an unregistered name never
    /// reaches the store and no write transaction is opened for it.
    pub async fn mutate(&self, name: &str, input: Value) -> Result<Value> {
        if !self.mutations.contains_key(name) {
            return Err(Error::UnknownMutation(name.to_owned()));
        }
        self.store.mutate(name, input).await
    }

    /// Look up the named query facade.
    pub fn query(&self, name: &str) -> Result<QueryHandle> {
        let def = self
            .queries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownQuery(name.to_owned()))?;
        Ok(QueryHandle::new(def, Arc::clone(&self.store)))
    }

    /// The shared store handle this surface forwards to.
    pub fn store(&self) -> Arc<dyn SyncStore> {
        Arc::clone(&self.store)
    }

    /// Names of all registered mutations.
    pub fn mutation_names(&self) -> Vec<&str> {
        self.mutations.keys().map(String::as_str).collect()
    }

    /// Names of all registered queries.
    pub fn query_names(&self) -> Vec<&str> {
        self.queries.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for DispatchSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchSurface")
            .field("mutations", &self.mutation_names())
            .field("queries", &self.query_names())
            .finish()
    }
}
