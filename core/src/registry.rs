//! Registry - the immutable builder for named operations.
//!
//! A registry accumulates mutation and query definitions through a fluent
//! chain. Every builder call returns a fresh registry value sharing the
//! parent's definitions; the parent itself is never mutated, so a reference
//! to an earlier builder stage stays valid and unaffected by later chaining.
//!
//! Registering a name twice replaces the earlier definition (last write
//! wins); the replacement is logged at debug level. Query handlers are
//! read-only by contract: given identical state and input they must produce
//! identical output. That contract is not enforced at runtime; it is what
//! lets live subscriptions re-evaluate them freely.

use crate::dispatch::{DispatchSurface, LocalDispatcher};
use crate::error::{Error, Result};
use crate::schema::{validate, Schema};
use crate::store::{
    MutationStep, MutatorMap, NamedMutator, ReadContext, ReadFn, SyncStore, WriteContext,
};
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Validates and binds raw query input, yielding the re-runnable read closure.
pub type QueryBinder = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<ReadFn>> + Send + Sync>;

/// A registered mutation: name plus the prepared-step pipeline.
pub(crate) struct MutationDef {
    pub(crate) name: String,
    pub(crate) prepare: NamedMutator,
}

/// A registered query: name plus the input-binding pipeline.
pub(crate) struct QueryDef {
    pub(crate) name: String,
    pub(crate) bind: QueryBinder,
}

/// A handler with its schema attached, the alternate registration shape.
///
/// Implement this to bundle a mutation's schema and body in one value and
/// register it with [`Registry::mutation_with`].
pub trait MutationOp: Send + Sync + 'static {
    /// Validator for this operation's input.
    type Schema: Schema + 'static;
    /// Serializable handler output.
    type Output: Serialize;

    /// The schema attached to this operation.
    fn schema(&self) -> Self::Schema;

    /// Execute against a write transaction with validated input.
    fn apply(
        &self,
        ctx: &mut dyn WriteContext,
        input: <Self::Schema as Schema>::Output,
    ) -> Result<Self::Output>;
}

/// Immutable, append-only mapping from operation name to definition.
#[derive(Clone, Default)]
pub struct Registry {
    mutations: HashMap<String, Arc<MutationDef>>,
    queries: HashMap<String, Arc<QueryDef>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mutation under `name`.
    ///
    /// Input is checked against `schema` before `handler` runs; on failure
    /// the handler is never invoked and no state is touched. The handler's
    /// output crosses the dispatch boundary as JSON.
    pub fn mutation<S, H, O>(&self, name: impl Into<String>, schema: S, handler: H) -> Self
    where
        S: Schema + 'static,
        S::Output: Send + 'static,
        H: Fn(&mut dyn WriteContext, S::Output) -> Result<O> + Send + Sync + 'static,
        O: Serialize,
    {
        let name = name.into();
        let schema = Arc::new(schema);
        let handler = Arc::new(handler);

        let prepare: NamedMutator = Arc::new(move |input: Value| {
            let schema = Arc::clone(&schema);
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let parsed = validate(schema.as_ref(), input).await?;
                let step: MutationStep = Box::new(move |ctx: &mut dyn WriteContext| {
                    let output = handler(ctx, parsed)?;
                    serde_json::to_value(output).map_err(Error::handler)
                });
                Ok(step)
            })
        });

        self.insert_mutation(MutationDef { name, prepare })
    }

    /// Register a mutation whose schema rides on the handler value.
    pub fn mutation_with<M>(&self, name: impl Into<String>, op: M) -> Self
    where
        M: MutationOp,
        <M::Schema as Schema>::Output: Send + 'static,
    {
        let schema = op.schema();
        let op = Arc::new(op);
        self.mutation(
            name,
            schema,
            move |ctx: &mut dyn WriteContext, input: <M::Schema as Schema>::Output| {
                op.apply(ctx, input)
            },
        )
    }

    /// Register a query under `name`.
    ///
    /// The parsed input must be `Clone`: live subscriptions re-run the
    /// handler with it on every relevant state change.
    pub fn query<S, H, O>(&self, name: impl Into<String>, schema: S, handler: H) -> Self
    where
        S: Schema + 'static,
        S::Output: Clone + Send + Sync + 'static,
        H: Fn(&dyn ReadContext, S::Output) -> Result<O> + Send + Sync + 'static,
        O: Serialize,
    {
        let name = name.into();
        let schema = Arc::new(schema);
        let handler = Arc::new(handler);

        let bind: QueryBinder = Arc::new(move |input: Value| {
            let schema = Arc::clone(&schema);
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let parsed = validate(schema.as_ref(), input).await?;
                let read: ReadFn = Arc::new(move |ctx: &dyn ReadContext| {
                    let output = handler(ctx, parsed.clone())?;
                    serde_json::to_value(output).map_err(Error::handler)
                });
                Ok(read)
            })
        });

        self.insert_query(QueryDef { name, bind })
    }

    /// Names of all registered mutations.
    pub fn mutation_names(&self) -> Vec<&str> {
        self.mutations.keys().map(String::as_str).collect()
    }

    /// Names of all registered queries.
    pub fn query_names(&self) -> Vec<&str> {
        self.queries.keys().map(String::as_str).collect()
    }

    /// The named mutation set a store is constructed with.
    pub fn mutators(&self) -> MutatorMap {
        self.mutations
            .iter()
            .map(|(name, def)| (name.clone(), Arc::clone(&def.prepare)))
            .collect()
    }

    /// Producer-side direct dispatch: no live store, the caller supplies
    /// the transaction context.
    pub fn dispatcher(&self) -> LocalDispatcher {
        LocalDispatcher::new(self.mutations.clone())
    }

    /// Materialize the dispatch surface bound to a live store.
    ///
    /// The store must have been constructed with this registry's
    /// [`mutators`](Self::mutators) so the name keying lines up.
    pub fn build(&self, store: Arc<dyn SyncStore>) -> DispatchSurface {
        DispatchSurface::new(self.mutations.clone(), self.queries.clone(), store)
    }

    pub(crate) fn query_def(&self, name: &str) -> Option<&Arc<QueryDef>> {
        self.queries.get(name)
    }

    fn insert_mutation(&self, def: MutationDef) -> Self {
        let mut next = self.clone();
        let name = def.name.clone();
        if next.mutations.insert(name.clone(), Arc::new(def)).is_some() {
            tracing::debug!(name = %name, "mutation definition replaced");
        }
        next
    }

    fn insert_query(&self, def: QueryDef) -> Self {
        let mut next = self.clone();
        let name = def.name.clone();
        if next.queries.insert(name.clone(), Arc::new(def)).is_some() {
            tracing::debug!(name = %name, "query definition replaced");
        }
        next
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("mutations", &self.mutation_names())
            .field("queries", &self.query_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldType, ObjectSchema, TypedSchema};
    use serde_json::json;

    fn noop_mutation(registry: &Registry, name: &str) -> Registry {
        registry.mutation(
            name,
            TypedSchema::<Value>::new(),
            |_ctx: &mut dyn WriteContext, _input: Value| Ok(()),
        )
    }

    #[test]
    fn chaining_leaves_parent_untouched() {
        let base = noop_mutation(&Registry::new(), "a");
        let derived = noop_mutation(&base, "b").query(
            "q",
            TypedSchema::<Value>::new(),
            |_ctx: &dyn ReadContext, _input: Value| Ok(()),
        );

        assert_eq!(base.mutation_names(), vec!["a"]);
        assert!(base.query_names().is_empty());

        let mut derived_names = derived.mutation_names();
        derived_names.sort_unstable();
        assert_eq!(derived_names, vec!["a", "b"]);
        assert_eq!(derived.query_names(), vec!["q"]);
    }

    #[test]
    fn duplicate_name_replaces() {
        let registry = noop_mutation(&noop_mutation(&Registry::new(), "a"), "a");
        assert_eq!(registry.mutation_names(), vec!["a"]);
    }

    #[test]
    fn mutators_keyed_by_name() {
        let registry = noop_mutation(&noop_mutation(&Registry::new(), "a"), "b");
        let mutators = registry.mutators();

        assert_eq!(mutators.len(), 2);
        assert!(mutators.contains_key("a"));
        assert!(mutators.contains_key("b"));
    }

    struct StoreEvent;

    impl MutationOp for StoreEvent {
        type Schema = ObjectSchema;
        type Output = ();

        fn schema(&self) -> ObjectSchema {
            ObjectSchema::new(vec![FieldDef::required("kind", FieldType::String)])
        }

        fn apply(&self, ctx: &mut dyn WriteContext, input: Value) -> Result<()> {
            let kind = input["kind"].as_str().unwrap_or_default().to_owned();
            ctx.put(&format!("/event/{kind}"), input);
            Ok(())
        }
    }

    #[test]
    fn attached_schema_shape_registers() {
        let registry = Registry::new().mutation_with("recordEvent", StoreEvent);
        assert_eq!(registry.mutation_names(), vec!["recordEvent"]);
        assert!(registry.mutators().contains_key("recordEvent"));
    }

    #[tokio::test]
    async fn prepared_step_rejects_before_binding() {
        let registry = Registry::new().mutation(
            "strict",
            ObjectSchema::new(vec![FieldDef::required("id", FieldType::Int)]),
            |_ctx: &mut dyn WriteContext, _input: Value| Ok(()),
        );

        let mutators = registry.mutators();
        let prepare = mutators.get("strict").unwrap();

        let err = prepare(json!({"id": "nope"})).await.err().unwrap();
        assert!(matches!(err, Error::Validation(_)));
    }
}
