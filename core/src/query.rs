//! Query facade.
//!
//! Each registered query is exposed in two calling conventions: a
//! transaction-scoped form ([`QueryHandle::run`]) for callers that already
//! hold a read context, and a point-in-time form ([`QueryHandle::once`])
//! that opens a single fresh read transaction against current state.
//! [`QueryHandle::watch`] enters the live subscription bridge.

use crate::error::Result;
use crate::live::LiveQuery;
use crate::registry::QueryDef;
use crate::store::{ReadContext, SyncStore};
use serde_json::Value;
use std::sync::Arc;

/// A registered query, bound to the store it reads from.
#[derive(Clone)]
pub struct QueryHandle {
    def: Arc<QueryDef>,
    store: Arc<dyn SyncStore>,
}

impl QueryHandle {
    pub(crate) fn new(def: Arc<QueryDef>, store: Arc<dyn SyncStore>) -> Self {
        Self { def, store }
    }

    /// The name this query was registered under.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Transaction-scoped form: validate `input`, then evaluate inside the
    /// caller-supplied read context.
    pub async fn run(&self, ctx: &dyn ReadContext, input: Value) -> Result<Value> {
        let read = (self.def.bind)(input).await?;
        read(ctx)
    }

    /// Point-in-time form: validate `input`, open one fresh read
    /// transaction against current state, evaluate once, resolve.
    ///
    /// The transaction never outlives the call. Invalid input surfaces a
    /// validation error; handler errors propagate unmodified.
    pub async fn once(&self, input: Value) -> Result<Value> {
        let read = (self.def.bind)(input).await?;
        self.store.read(read).await
    }

    /// Live form: subscribe to re-evaluations of this query under `input`.
    pub async fn watch(&self, input: Value) -> Result<LiveQuery> {
        LiveQuery::start(Arc::clone(&self.def), Arc::clone(&self.store), input).await
    }
}

impl std::fmt::Debug for QueryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryHandle")
            .field("name", &self.name())
            .finish()
    }
}
