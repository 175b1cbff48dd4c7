//! The query execution pipeline
//!
//! A request flows through four passes:
//!
//! 1. [`builder`] — validate the raw query against the schema and build the
//!    resolver tree (arguments validated and coerced on the way)
//! 2. [`executor`] — invoke resolvers over the tree, depth-first, sibling
//!    fields in declaration order
//! 3. [`aggregator`] — run batched dataloader fetches and join the results
//!    in place
//! 4. [`finalize`] — enforce null/array declarations, serialize scalars, and
//!    drop everything the query did not ask for
//!
//! [`Engine::run`] drives all four and wraps the outcome in a
//! [`QueryResponse`] envelope; [`Engine::fetch`] is the shallow variant used
//! by resolvers that delegate to another entry point.

pub mod aggregator;
pub mod args;
pub mod builder;
pub mod executor;
pub mod finalize;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub use aggregator::aggregate;
pub use args::validate_args;
pub use builder::{ARGS_KEY, build_node};
pub use executor::{ExecuteParams, execute};
pub use finalize::finalize;

use crate::core::error::{EngineResult, ErrorBody};
use crate::core::path::FieldPath;
use crate::core::resolver::{RequestContext, SharedData};
use crate::core::types::NodeDefinition;
use crate::schema::Schema;

/// Engine-level configuration
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Include a stack rendering in error bodies
    pub debug: bool,
}

/// The response envelope: exactly one of `data` and `error` is present
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl IntoResponse for QueryResponse {
    fn into_response(self) -> Response {
        // Failures travel in the envelope, not the transport status; hosts
        // wanting status-coded errors use [`EngineError::into_response`]
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// The query engine: a schema plus its configuration
///
/// Cheap to clone; the schema is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Engine {
    schema: Arc<Schema>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(schema: Schema) -> Self {
        Self::with_config(schema, EngineConfig::default())
    }

    pub fn with_config(schema: Schema, config: EngineConfig) -> Self {
        Self {
            schema: Arc::new(schema),
            config,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Run one query against an entry point, returning the response envelope
    ///
    /// Never returns `Err`: failures are folded into the envelope's `error`
    /// side so the caller always has something serializable to send.
    pub async fn run(&self, root_name: &str, query: &Value, ctx: &RequestContext) -> QueryResponse {
        match self.run_query(root_name, query, ctx).await {
            Ok(data) => QueryResponse {
                data: Some(data),
                error: None,
            },
            Err(err) => {
                tracing::warn!(
                    entry_point = root_name,
                    code = err.error_code(),
                    path = %err.field_path(),
                    "query failed: {}",
                    err.message()
                );
                QueryResponse {
                    data: None,
                    error: Some(err.to_body(self.config.debug)),
                }
            }
        }
    }

    /// The full pipeline with errors still typed
    pub async fn run_query(
        &self,
        root_name: &str,
        query: &Value,
        ctx: &RequestContext,
    ) -> EngineResult<Value> {
        let root = self.schema.root(root_name)?;
        // Error paths are relative to the entry point's own subtree; the
        // entry-point name travels in the logs, not in the path
        let path = FieldPath::root();
        tracing::debug!(entry_point = root_name, "running query");

        let node = build_node(&self.schema, query, NodeDefinition::Root(root.clone()), &path, true)?;

        let shared = SharedData::new();
        let mut value = execute(
            &self.schema,
            ExecuteParams {
                results_node: Value::Null,
                resolver_node: &node,
                parent_node: &Value::Null,
                ctx,
                shared: &shared,
                path: path.clone(),
                full_tree: true,
            },
        )
        .await?;

        if !value.is_null() {
            let typename = self
                .schema
                .registry()
                .resolve_field_type(&root.field.field_type, &path)?
                .name()
                .to_string();
            match value {
                Value::Array(items) => {
                    let mut rows = items;
                    aggregate(&self.schema, &mut rows, &node, &typename, ctx, path.clone()).await?;
                    value = Value::Array(rows);
                }
                single => {
                    let mut rows = vec![single];
                    aggregate(&self.schema, &mut rows, &node, &typename, ctx, path.clone()).await?;
                    value = rows.pop().unwrap_or(Value::Null);
                }
            }
        }

        finalize(&self.schema, value, &node, &path)
    }

    /// Fetch an entry point's raw value without walking or trimming it
    ///
    /// This is the call a field resolver makes when it delegates its subtree
    /// to another entry point: arguments are still validated, but the result
    /// comes back verbatim and no field resolvers beneath the root run.
    pub async fn fetch(
        &self,
        root_name: &str,
        query: &Value,
        ctx: &RequestContext,
    ) -> EngineResult<Value> {
        let root = self.schema.root(root_name)?;
        let path = FieldPath::root();
        tracing::debug!(entry_point = root_name, "direct fetch");

        let node = build_node(&self.schema, query, NodeDefinition::Root(root), &path, false)?;
        let shared = SharedData::new();
        execute(
            &self.schema,
            ExecuteParams {
                results_node: Value::Null,
                resolver_node: &node,
                parent_node: &Value::Null,
                ctx,
                shared: &shared,
                path,
                full_tree: false,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::RootResolver;
    use crate::core::scalar;
    use crate::core::types::{FieldDefinition, ObjectType, RootResolverDefinition};
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticRoot(Value);

    #[async_trait]
    impl RootResolver for StaticRoot {
        async fn resolve(
            &self,
            _ctx: &RequestContext,
            _path: &FieldPath,
            _args: Option<&Value>,
            _query: &Value,
        ) -> anyhow::Result<Value> {
            Ok(self.0.clone())
        }
    }

    fn engine(value: Value) -> Engine {
        let schema = Schema::builder()
            .object(
                ObjectType::new("User")
                    .field("id", FieldDefinition::scalar(scalar::id()))
                    .field("name", FieldDefinition::scalar(scalar::string())),
            )
            .root(
                "user",
                RootResolverDefinition::new(FieldDefinition::lookup("User"), StaticRoot(value)),
            )
            .unwrap()
            .build()
            .unwrap();
        Engine::new(schema)
    }

    #[tokio::test]
    async fn test_run_success_envelope() {
        let engine = engine(json!({"id": 1, "name": "ada", "extra": "dropped"}));
        let response = engine
            .run("user", &json!({"id": true, "name": true}), &RequestContext::new())
            .await;
        assert!(response.error.is_none());
        assert_eq!(response.data, Some(json!({"id": "1", "name": "ada"})));
    }

    #[tokio::test]
    async fn test_run_error_envelope() {
        let engine = engine(json!({"id": 1, "name": "ada"}));
        let response = engine
            .run("user", &json!({"age": true}), &RequestContext::new())
            .await;
        assert!(response.data.is_none());
        let error = response.error.expect("unknown field is an error");
        assert_eq!(error.field_path, vec!["age"]);
        assert!(error.stack.is_none());
    }

    #[tokio::test]
    async fn test_debug_config_exposes_stack() {
        let schema = Schema::builder()
            .object(ObjectType::new("User").field("id", FieldDefinition::scalar(scalar::id())))
            .root(
                "user",
                RootResolverDefinition::new(
                    FieldDefinition::lookup("User"),
                    StaticRoot(json!({"id": 1})),
                ),
            )
            .unwrap()
            .build()
            .unwrap();
        let engine = Engine::with_config(schema, EngineConfig { debug: true });
        let response = engine
            .run("user", &json!({"nope": true}), &RequestContext::new())
            .await;
        assert!(response.error.expect("error").stack.is_some());
    }

    #[tokio::test]
    async fn test_unknown_entry_point() {
        let engine = engine(json!({"id": 1, "name": "ada"}));
        let response = engine
            .run("ghost", &json!({"id": true}), &RequestContext::new())
            .await;
        let error = response.error.expect("unknown entry point is an error");
        assert!(error.message.contains("ghost"));
    }

    #[tokio::test]
    async fn test_fetch_returns_verbatim() {
        let engine = engine(json!({"id": 1, "name": "ada", "extra": true}));
        let value = engine
            .fetch("user", &json!({"id": true}), &RequestContext::new())
            .await
            .unwrap();
        assert_eq!(value, json!({"id": 1, "name": "ada", "extra": true}));
    }

    #[test]
    fn test_envelope_serialization_omits_absent_side() {
        let response = QueryResponse {
            data: Some(json!({"x": 1})),
            error: None,
        };
        let rendered = serde_json::to_value(&response).expect("serializes");
        assert_eq!(rendered, json!({"data": {"x": 1}}));
    }
}
