//! Query tree construction and validation
//!
//! Converts a raw JSON query into a validated [`ResolverNode`] tree: every
//! requested field must exist (and be visible) on its parent object type,
//! leaf and non-leaf query shapes are enforced, and arguments are validated
//! and coerced on the way in.
//!
//! A field that owns its own resolver is responsible for constructing and
//! consuming its own subtree: unless a full-tree build is explicitly
//! requested, recursion stops at such a field (its node is still built and
//! its arguments validated, but `nested` stays empty), which prevents the
//! same subtree from being validated twice.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::args::validate_args;
use crate::core::error::{EngineError, EngineResult};
use crate::core::path::FieldPath;
use crate::core::types::{NodeDefinition, ResolverNode, TypeDefinition};
use crate::schema::Schema;

/// The key under which a query supplies a field's arguments
pub const ARGS_KEY: &str = "__args";

/// Build one resolver node (and, recursively, its subtree) from a raw query
pub fn build_node(
    schema: &Schema,
    field_value: &Value,
    definition: NodeDefinition,
    path: &FieldPath,
    full_tree: bool,
) -> EngineResult<ResolverNode> {
    let field = definition.field();
    let resolved = schema
        .registry()
        .resolve_field_type(&field.field_type, path)?;
    if let TypeDefinition::Input(input) = &resolved {
        return Err(EngineError::schema(
            format!("input type '{}' is not valid in field position", input.name()),
            path.clone(),
        ));
    }
    let is_leaf = !resolved.is_object();

    let is_sentinel = schema.sentinel().matches(field_value);
    let structure = field_value.as_object();
    if !is_sentinel && structure.is_none() {
        return Err(EngineError::query(
            "invalid field value: expected the fetch marker or an object",
            path.clone(),
        ));
    }

    if is_leaf {
        if let Some(obj) = structure {
            // A leaf accepts structure only to carry its arguments
            if obj.len() != 1 || !obj.contains_key(ARGS_KEY) {
                return Err(EngineError::query(
                    format!("a leaf field accepts only the '{}' key", ARGS_KEY),
                    path.clone(),
                ));
            }
        }
    } else if is_sentinel {
        return Err(EngineError::query(
            "an object field requires a sub-query",
            path.clone(),
        ));
    }

    let (raw_args, query) = match structure {
        Some(obj) => {
            let mut remaining = Map::new();
            for (key, value) in obj {
                if key != ARGS_KEY {
                    remaining.insert(key.clone(), value.clone());
                }
            }
            (obj.get(ARGS_KEY), Value::Object(remaining))
        }
        None => (None, field_value.clone()),
    };

    // A sentinel leaf whose arguments are required fails here: with no
    // structure there is no way to supply them
    let args = validate_args(schema.registry(), raw_args, field.args.as_ref(), path)?;

    let owns_subtree = field.resolver.is_some() || definition.is_root();
    let nested = if !is_leaf && (full_tree || !owns_subtree) {
        let TypeDefinition::Object(object) = &resolved else {
            unreachable!("non-leaf nodes resolve to object types");
        };
        let mut children = IndexMap::new();
        let query_fields = query
            .as_object()
            .expect("non-leaf query is always structured");
        for (key, value) in query_fields {
            let child_path = path.child(key.as_str());
            let child = object.get_field(key).filter(|def| !def.hidden).ok_or_else(|| {
                EngineError::query(
                    format!("unknown field '{}' on type '{}'", key, object.name()),
                    child_path.clone(),
                )
            })?;
            tracing::trace!(field = %child_path, "building resolver node");
            let child_node = build_node(
                schema,
                value,
                NodeDefinition::Field(child.clone()),
                &child_path,
                full_tree,
            )?;
            children.insert(key.clone(), child_node);
        }
        Some(children)
    } else {
        None
    };

    Ok(ResolverNode {
        definition,
        query,
        args,
        nested,
    })
}
