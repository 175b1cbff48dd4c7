//! Batched fetch aggregation
//!
//! Collapses N+1 fetch patterns: for a dataloader-enabled field shared by a
//! sibling result array, the distinct keys held at that field are collected
//! across every sibling and the dataloader is invoked exactly once with the
//! full key set. Each sibling's raw key is then rewritten in place to its
//! joined record; a key absent from the batch response joins to null.
//!
//! Batches are scoped to one field, one tree depth, one response — never
//! coalesced across requests.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::core::error::{EngineError, EngineResult};
use crate::core::path::FieldPath;
use crate::core::resolver::RequestContext;
use crate::core::types::ResolverNode;
use crate::schema::Schema;

/// How one sibling's value at a field was folded into the flattened batch
enum Slot {
    /// Null or missing; nothing was taken and nothing is restored
    Skipped,
    Single,
    Many(usize),
}

/// Run the batched-fetch pass over one sibling array, rewriting in place
pub fn aggregate<'a>(
    schema: &'a Schema,
    rows: &'a mut Vec<Value>,
    node: &'a ResolverNode,
    typename: &'a str,
    ctx: &'a RequestContext,
    path: FieldPath,
) -> BoxFuture<'a, EngineResult<()>> {
    async move {
        let Some(nested) = &node.nested else {
            return Ok(());
        };

        for (name, child) in nested {
            let child_field = child.definition.field();
            let child_path = path.child(name.as_str());
            let child_typename = schema
                .registry()
                .resolve_field_type(&child_field.field_type, &child_path)?
                .name()
                .to_string();

            if let Some(loader) = &child_field.dataloader {
                // Distinct keys, first-seen order
                let mut seen = HashSet::new();
                let mut keys = Vec::new();
                for row in rows.iter() {
                    let Some(value) = row.get(name) else { continue };
                    if value.is_null() {
                        continue;
                    }
                    if seen.insert(value.to_string()) {
                        keys.push(value.clone());
                    }
                }
                if keys.is_empty() {
                    continue;
                }

                tracing::debug!(
                    field = %child_path,
                    parent = typename,
                    keys = keys.len(),
                    "batched fetch"
                );
                let records = loader
                    .load(ctx, &keys, &child.query, &child_typename, &child_path)
                    .await
                    .map_err(|err| EngineError::resolver(err, child_path.clone()))?;

                let mut joined: HashMap<String, Value> = HashMap::with_capacity(records.len());
                for record in records {
                    let Some(id) = record.get("id") else {
                        return Err(EngineError::result(
                            "dataloader record is missing its 'id' join key",
                            child_path.clone(),
                        ));
                    };
                    joined.insert(id.to_string(), record);
                }

                for row in rows.iter_mut() {
                    let Some(obj) = row.as_object_mut() else { continue };
                    let Some(value) = obj.get(name) else { continue };
                    if value.is_null() {
                        continue;
                    }
                    let record = joined.get(&value.to_string()).cloned().unwrap_or(Value::Null);
                    obj.insert(name.clone(), record);
                }
            } else if child.nested.as_ref().is_some_and(|n| !n.is_empty()) {
                // No dataloader here, but one may live a level deeper: fold
                // every sibling's current value at this field into one batch
                let mut slots = Vec::with_capacity(rows.len());
                let mut flat = Vec::new();
                for row in rows.iter_mut() {
                    match row.as_object_mut().and_then(|obj| obj.get_mut(name)) {
                        Some(slot) if !slot.is_null() => match slot.take() {
                            Value::Array(items) => {
                                slots.push(Slot::Many(items.len()));
                                flat.extend(items);
                            }
                            other => {
                                slots.push(Slot::Single);
                                flat.push(other);
                            }
                        },
                        _ => slots.push(Slot::Skipped),
                    }
                }
                if flat.is_empty() {
                    continue;
                }

                aggregate(schema, &mut flat, child, &child_typename, ctx, child_path).await?;

                let mut restored = flat.into_iter();
                for (row, slot) in rows.iter_mut().zip(slots) {
                    let Some(obj) = row.as_object_mut() else { continue };
                    match slot {
                        Slot::Skipped => {}
                        Slot::Single => {
                            let value = restored
                                .next()
                                .expect("aggregation preserves element count");
                            obj.insert(name.clone(), value);
                        }
                        Slot::Many(len) => {
                            let items: Vec<Value> = restored.by_ref().take(len).collect();
                            obj.insert(name.clone(), Value::Array(items));
                        }
                    }
                }
            }
        }

        Ok(())
    }
    .boxed()
}
