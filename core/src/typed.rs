//! Typed operation references.
//!
//! The registry is name-keyed and JSON-valued at runtime; the typed layer is
//! a parallel compile-time manifest. A [`MutationRef`] or [`QueryRef`] pins
//! an operation name to its input and output types once, and the `_as`
//! entry points (de)serialize at the boundary so call sites read as plain
//! strongly-typed functions.
//!
//! Nothing here is checked against the registry until dispatch: a ref whose
//! name was never registered fails at call time, like any other name.

use crate::dispatch::DispatchSurface;
use crate::error::{Error, Result};
use crate::query::QueryHandle;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// Typed name of a registered mutation.
pub struct MutationRef<I, O> {
    name: &'static str,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O> MutationRef<I, O> {
    /// Pin `name` to input type `I` and output type `O`.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The underlying operation name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<I, O> Clone for MutationRef<I, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, O> Copy for MutationRef<I, O> {}

impl<I, O> std::fmt::Debug for MutationRef<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MutationRef").field(&self.name).finish()
    }
}

/// Typed name of a registered query.
pub struct QueryRef<I, O> {
    name: &'static str,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O> QueryRef<I, O> {
    /// Pin `name` to input type `I` and output type `O`.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The underlying operation name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<I, O> Clone for QueryRef<I, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, O> Copy for QueryRef<I, O> {}

impl<I, O> std::fmt::Debug for QueryRef<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("QueryRef").field(&self.name).finish()
    }
}

/// A query handle with its input and output types fixed.
pub struct TypedQuery<I, O> {
    handle: QueryHandle,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O> TypedQuery<I, O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    /// Point-in-time evaluation with typed input and output.
    pub async fn once(&self, input: I) -> Result<O> {
        let raw = serde_json::to_value(input).map_err(Error::handler)?;
        let output = self.handle.once(raw).await?;
        serde_json::from_value(output).map_err(Error::handler)
    }
}

impl<I, O> TypedQuery<I, O> {
    /// The untyped handle, for `run`/`watch` access.
    pub fn handle(&self) -> &QueryHandle {
        &self.handle
    }
}

impl<I, O> std::fmt::Debug for TypedQuery<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TypedQuery").field(&self.handle).finish()
    }
}

impl DispatchSurface {
    /// Dispatch a mutation through a typed reference.
    pub async fn mutate_as<I, O>(&self, op: MutationRef<I, O>, input: I) -> Result<O>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let raw = serde_json::to_value(input).map_err(Error::handler)?;
        let output = self.mutate(op.name(), raw).await?;
        serde_json::from_value(output).map_err(Error::handler)
    }

    /// Look up a query through a typed reference.
    pub fn query_as<I, O>(&self, op: QueryRef<I, O>) -> Result<TypedQuery<I, O>> {
        Ok(TypedQuery {
            handle: self.query(op.name())?,
            _marker: PhantomData,
        })
    }
}
