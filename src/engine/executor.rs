//! Resolver execution
//!
//! Walks a validated resolver tree and produces a raw result tree. Execution
//! suspends at every resolver call and resumes once it settles; sibling
//! fields run sequentially in declaration order, so resolvers observe the
//! shared per-request data written by earlier siblings.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::core::error::{EngineError, EngineResult};
use crate::core::path::FieldPath;
use crate::core::resolver::{FieldInput, RequestContext, SharedData};
use crate::core::types::{NodeDefinition, ResolverNode};
use crate::schema::Schema;

/// Inputs for one execution step
pub struct ExecuteParams<'a> {
    /// The value currently held at this node's position
    pub results_node: Value,
    pub resolver_node: &'a ResolverNode,
    /// The enclosing structure's value (null at the root)
    pub parent_node: &'a Value,
    pub ctx: &'a RequestContext,
    pub shared: &'a SharedData,
    pub path: FieldPath,
    /// When false, a root resolver's result is returned verbatim
    pub full_tree: bool,
}

/// Execute one resolver node, producing its raw result value
pub fn execute<'a>(
    schema: &'a Schema,
    params: ExecuteParams<'a>,
) -> BoxFuture<'a, EngineResult<Value>> {
    async move {
        let ExecuteParams {
            results_node,
            resolver_node,
            parent_node,
            ctx,
            shared,
            path,
            full_tree,
        } = params;

        match &resolver_node.definition {
            NodeDefinition::Root(root) => {
                tracing::debug!(path = %path, "invoking root resolver");
                let value = root
                    .resolver
                    .resolve(ctx, &path, resolver_node.args.as_ref(), &resolver_node.query)
                    .await
                    .map_err(|err| EngineError::resolver(err, path.clone()))?;
                if !full_tree {
                    // Direct entry-point fetch: the root owns the whole tree
                    return Ok(value);
                }
                execute_children(schema, value, resolver_node, ctx, shared, path, full_tree).await
            }
            NodeDefinition::Field(field) => match &field.resolver {
                Some(resolver) => {
                    if field.defer {
                        // Deferred to the batch aggregation pass, which joins
                        // on the raw value left in place here
                        return Ok(results_node);
                    }
                    tracing::trace!(path = %path, "invoking field resolver");
                    resolver
                        .resolve(FieldInput {
                            ctx,
                            path: &path,
                            args: resolver_node.args.as_ref(),
                            query: &resolver_node.query,
                            field_value: &results_node,
                            parent_value: parent_node,
                            shared,
                        })
                        .await
                        .map_err(|err| EngineError::resolver(err, path.clone()))
                }
                None => {
                    execute_children(
                        schema,
                        results_node,
                        resolver_node,
                        ctx,
                        shared,
                        path,
                        full_tree,
                    )
                    .await
                }
            },
        }
    }
    .boxed()
}

/// Walk a node's declared children over a structured value
///
/// Arrays are walked element-wise against the same node; anything that is
/// neither an array nor an object passes through unchanged.
fn execute_children<'a>(
    schema: &'a Schema,
    value: Value,
    node: &'a ResolverNode,
    ctx: &'a RequestContext,
    shared: &'a SharedData,
    path: FieldPath,
    full_tree: bool,
) -> BoxFuture<'a, EngineResult<Value>> {
    async move {
        let Some(nested) = &node.nested else {
            return Ok(value);
        };
        if nested.is_empty() {
            return Ok(value);
        }

        match value {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(
                        execute_children(
                            schema,
                            item,
                            node,
                            ctx,
                            shared,
                            path.clone(),
                            full_tree,
                        )
                        .await?,
                    );
                }
                Ok(Value::Array(out))
            }
            Value::Object(map) => {
                let mut out = map.clone();
                let parent = Value::Object(map);
                for (name, child) in nested {
                    let child_value = out.get(name).cloned().unwrap_or(Value::Null);
                    let result = execute(
                        schema,
                        ExecuteParams {
                            results_node: child_value,
                            resolver_node: child,
                            parent_node: &parent,
                            ctx,
                            shared,
                            path: path.child(name.as_str()),
                            full_tree,
                        },
                    )
                    .await?;
                    out.insert(name.clone(), result);
                }
                Ok(Value::Object(out))
            }
            other => Ok(other),
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::{FieldResolver, RootResolver};
    use crate::core::scalar;
    use crate::core::types::{FieldDefinition, ObjectType, RootResolverDefinition};
    use crate::engine::builder::build_node;
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

    struct FailingRoot;

    #[async_trait]
    impl RootResolver for FailingRoot {
        async fn resolve(
            &self,
            _ctx: &RequestContext,
            _path: &FieldPath,
            _args: Option<&Value>,
            _query: &Value,
        ) -> anyhow::Result<Value> {
            anyhow::bail!("backend unavailable")
        }
    }

    struct UppercaseName;

    #[async_trait]
    impl FieldResolver for UppercaseName {
        async fn resolve(&self, input: FieldInput<'_>) -> anyhow::Result<Value> {
            let raw = input
                .parent_value
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            Ok(Value::String(raw.to_uppercase()))
        }
    }

    struct SharedCounter;

    #[async_trait]
    impl FieldResolver for SharedCounter {
        async fn resolve(&self, input: FieldInput<'_>) -> anyhow::Result<Value> {
            let seen = input
                .shared
                .get("seen")
                .and_then(|v| v.as_i64())
                .unwrap_or(0);
            input.shared.insert("seen", json!(seen + 1));
            Ok(json!(seen + 1))
        }
    }

    fn schema_returning(value: Value) -> Schema {
        Schema::builder()
            .object(
                ObjectType::new("User")
                    .field("id", FieldDefinition::scalar(scalar::id()))
                    .field("name", FieldDefinition::scalar(scalar::string()))
                    .field(
                        "display_name",
                        FieldDefinition::scalar(scalar::string()).with_resolver(UppercaseName),
                    )
                    .field(
                        "first_counter",
                        FieldDefinition::scalar(scalar::int()).with_resolver(SharedCounter),
                    )
                    .field(
                        "second_counter",
                        FieldDefinition::scalar(scalar::int()).with_resolver(SharedCounter),
                    )
                    .field(
                        "pending",
                        FieldDefinition::scalar(scalar::int())
                            .nullable()
                            .with_resolver(SharedCounter)
                            .deferred(),
                    ),
            )
            .root(
                "user",
                RootResolverDefinition::new(FieldDefinition::lookup("User"), StaticRoot(value)),
            )
            .unwrap()
            .build()
            .unwrap()
    }

    async fn run(schema: &Schema, query: Value, full_tree: bool) -> EngineResult<Value> {
        let root = schema.root("user").unwrap();
        let node = build_node(
            schema,
            &query,
            NodeDefinition::Root(root),
            &FieldPath::root(),
            full_tree,
        )?;
        let ctx = RequestContext::new();
        let shared = SharedData::new();
        execute(
            schema,
            ExecuteParams {
                results_node: Value::Null,
                resolver_node: &node,
                parent_node: &Value::Null,
                ctx: &ctx,
                shared: &shared,
                path: FieldPath::root(),
                full_tree,
            },
        )
        .await
    }

    #[tokio::test]
    async fn test_root_verbatim_without_full_tree() {
        let schema = schema_returning(json!({"id": "1", "name": "ada", "extra": true}));
        let out = run(&schema, json!({"id": true}), false).await.unwrap();
        // Verbatim: nothing walked, nothing trimmed
        assert_eq!(out, json!({"id": "1", "name": "ada", "extra": true}));
    }

    #[tokio::test]
    async fn test_full_tree_walks_children() {
        let schema = schema_returning(json!({"id": "1", "name": "ada"}));
        let out = run(&schema, json!({"id": true, "display_name": true}), true)
            .await
            .unwrap();
        assert_eq!(out["display_name"], json!("ADA"));
        assert_eq!(out["id"], json!("1"));
    }

    #[tokio::test]
    async fn test_array_results_walked_element_wise() {
        let schema = schema_returning(json!([
            {"id": "1", "name": "ada"},
            {"id": "2", "name": "lin"}
        ]));
        let out = run(&schema, json!({"display_name": true}), true)
            .await
            .unwrap();
        assert_eq!(out[0]["display_name"], json!("ADA"));
        assert_eq!(out[1]["display_name"], json!("LIN"));
    }

    #[tokio::test]
    async fn test_sibling_order_and_shared_data() {
        let schema = schema_returning(json!({"id": "1", "name": "ada"}));
        let out = run(
            &schema,
            json!({"first_counter": true, "second_counter": true}),
            true,
        )
        .await
        .unwrap();
        // Declaration order: first_counter runs before second_counter
        assert_eq!(out["first_counter"], json!(1));
        assert_eq!(out["second_counter"], json!(2));
    }

    #[tokio::test]
    async fn test_deferred_field_keeps_raw_value() {
        // The resolver would write 1; an untouched 5 proves it never ran
        let schema = schema_returning(json!({"id": "1", "name": "ada", "pending": 5}));
        let out = run(&schema, json!({"pending": true}), true).await.unwrap();
        assert_eq!(out["pending"], json!(5));

        let schema = schema_returning(json!({"id": "1", "name": "ada"}));
        let out = run(&schema, json!({"pending": true}), true).await.unwrap();
        assert_eq!(out["pending"], Value::Null);
    }

    #[tokio::test]
    async fn test_resolver_error_passes_through() {
        let schema = Schema::builder()
            .object(ObjectType::new("User").field("id", FieldDefinition::scalar(scalar::id())))
            .root(
                "user",
                RootResolverDefinition::new(FieldDefinition::lookup("User"), FailingRoot),
            )
            .unwrap()
            .build()
            .unwrap();
        let err = run(&schema, json!({"id": true}), true).await.unwrap_err();
        assert!(matches!(err, EngineError::Resolver { .. }));
        assert!(err.message().contains("backend unavailable"));
    }

    #[tokio::test]
    async fn test_scalar_root_passes_through() {
        let schema = Schema::builder()
            .object(ObjectType::new("User").field("id", FieldDefinition::scalar(scalar::id())))
            .root(
                "user",
                RootResolverDefinition::new(
                    FieldDefinition::lookup("User"),
                    StaticRoot(json!("not a structure")),
                ),
            )
            .unwrap()
            .build()
            .unwrap();
        let out = run(&schema, json!({"id": true}), true).await.unwrap();
        assert_eq!(out, json!("not a structure"));
    }
}
