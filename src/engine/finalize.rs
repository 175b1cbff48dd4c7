//! Result validation and serialization
//!
//! The last pass over a resolved tree before it leaves the engine: null and
//! array policies are enforced against each field's declaration, scalar
//! serializers run over every leaf, and anything the query did not request is
//! dropped. Violations are server-side defects and surface as
//! [`EngineError::Result`].

use serde_json::{Map, Value};

use crate::core::error::{EngineError, EngineResult};
use crate::core::path::FieldPath;
use crate::core::types::{ResolverNode, TypeDefinition};
use crate::schema::Schema;

/// Validate and serialize one resolved value against its resolver node
pub fn finalize(
    schema: &Schema,
    value: Value,
    node: &ResolverNode,
    path: &FieldPath,
) -> EngineResult<Value> {
    let field = node.definition.field();

    if let Some(options) = &field.array {
        if value.is_null() {
            if field.allow_null {
                return Ok(Value::Null);
            }
            return Err(EngineError::result(
                "field resolved to null but is not nullable",
                path.clone(),
            ));
        }
        let Value::Array(items) = value else {
            return Err(EngineError::result(
                "field is declared as an array but did not resolve to one",
                path.clone(),
            ));
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if item.is_null() {
                if !options.allow_null_element {
                    return Err(EngineError::result(
                        "array element resolved to null but elements are not nullable",
                        path.clone(),
                    ));
                }
                out.push(Value::Null);
                continue;
            }
            out.push(finalize_element(schema, item, node, path)?);
        }
        return Ok(Value::Array(out));
    }

    if value.is_null() {
        // A structured node that resolved to null short-circuits; the null
        // policy is enforced on leaves
        if node.nested.is_some() || field.allow_null {
            return Ok(Value::Null);
        }
        return Err(EngineError::result(
            "field resolved to null but is not nullable",
            path.clone(),
        ));
    }

    finalize_element(schema, value, node, path)
}

fn finalize_element(
    schema: &Schema,
    value: Value,
    node: &ResolverNode,
    path: &FieldPath,
) -> EngineResult<Value> {
    let field = node.definition.field();
    let resolved = schema.registry().resolve_field_type(&field.field_type, path)?;

    match resolved {
        TypeDefinition::Object(_) => {
            let empty_selection = node.nested.as_ref().is_none_or(|n| n.is_empty());
            let Some(obj) = value.as_object() else {
                // With nothing selected there is no structure to demand
                if empty_selection {
                    return Ok(Value::Null);
                }
                return Err(EngineError::result(
                    "field resolved to a non-object value but its type is an object",
                    path.clone(),
                ));
            };

            // Only requested fields survive, in the query's order
            let mut out = Map::new();
            if let Some(nested) = &node.nested {
                for (name, child) in nested {
                    let child_path = path.child(name.as_str());
                    let child_value = obj.get(name).cloned().unwrap_or(Value::Null);
                    out.insert(
                        name.clone(),
                        finalize(schema, child_value, child, &child_path)?,
                    );
                }
            }
            Ok(Value::Object(out))
        }
        TypeDefinition::Scalar(scalar) => {
            if value.is_array() {
                return Err(EngineError::result(
                    "field resolved to an array but is not declared as one",
                    path.clone(),
                ));
            }
            match scalar.serialize_fn() {
                Some(serialize) => serialize(&value).map_err(|err| {
                    EngineError::result(
                        format!("invalid result for scalar '{}': {}", scalar.name(), err),
                        path.clone(),
                    )
                }),
                None => Ok(value),
            }
        }
        TypeDefinition::Input(input) => Err(EngineError::schema(
            format!("input type '{}' is not valid in field position", input.name()),
            path.clone(),
        )),
    }
}
