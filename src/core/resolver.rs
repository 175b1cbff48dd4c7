//! Resolver interfaces and per-request context
//!
//! Resolvers are the engine's only extension points: a root resolver serves a
//! top-level entry point, a field resolver produces one field's value, and a
//! dataloader batch-fetches related records for a whole sibling group at once.
//!
//! All three are `#[async_trait]` traits returning `anyhow::Result`, so
//! implementations keep their own error types; the engine passes resolver
//! errors through unmodified.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Mutex;

use super::path::FieldPath;

/// Immutable per-request context handed to every resolver
///
/// Holds whatever the host attached when dispatching the request
/// (authentication claims, connection handles encoded as values, etc.).
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    values: Map<String, Value>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Mutable data shared between resolvers within one request
///
/// Sibling fields execute sequentially in declaration order, so a resolver
/// always sees the writes of siblings declared before it.
#[derive(Debug, Default)]
pub struct SharedData {
    inner: Mutex<Map<String, Value>>,
}

impl SharedData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.inner
            .lock()
            .expect("shared data lock poisoned")
            .insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner
            .lock()
            .expect("shared data lock poisoned")
            .get(key)
            .cloned()
    }
}

/// A resolver registered at schema top level as an entry point
#[async_trait]
pub trait RootResolver: Send + Sync {
    /// Produce the root value for one request
    ///
    /// # Arguments
    /// * `args` - validated arguments, `None` when the entry point takes none
    /// * `query` - the requested sub-query (with `__args` already removed)
    async fn resolve(
        &self,
        ctx: &RequestContext,
        path: &FieldPath,
        args: Option<&Value>,
        query: &Value,
    ) -> anyhow::Result<Value>;
}

/// Everything a field resolver receives for one invocation
pub struct FieldInput<'a> {
    pub ctx: &'a RequestContext,
    pub path: &'a FieldPath,
    /// Validated arguments, `None` when the field takes none
    pub args: Option<&'a Value>,
    /// The requested sub-query beneath this field (minus `__args`)
    pub query: &'a Value,
    /// The raw value currently held at this field position
    pub field_value: &'a Value,
    /// The value of the enclosing structure
    pub parent_value: &'a Value,
    pub shared: &'a SharedData,
}

/// A resolver owning one field and its subtree
#[async_trait]
pub trait FieldResolver: Send + Sync {
    async fn resolve(&self, input: FieldInput<'_>) -> anyhow::Result<Value>;
}

/// A batch resolver invoked once per sibling group
///
/// Receives every distinct key found at its field across the sibling rows and
/// returns the matching records; each record must expose an `id` usable as
/// the join key.
#[async_trait]
pub trait Dataloader: Send + Sync {
    async fn load(
        &self,
        ctx: &RequestContext,
        keys: &[Value],
        query: &Value,
        typename: &str,
        path: &FieldPath,
    ) -> anyhow::Result<Vec<Value>>;
}
