//! Argument validation and coercion
//!
//! Validation and coercion are fused into one pass: the raw arguments are
//! walked exactly once, and the result is a freshly built value that never
//! aliases the caller's input. Checks run in a fixed order and fail fast with
//! an [`EngineError::Args`] pointing at the offending argument.

use serde_json::{Map, Value};

use crate::core::error::{EngineError, EngineResult};
use crate::core::path::FieldPath;
use crate::core::types::{ArgFieldDefinition, TypeDefinition};
use crate::schema::registry::TypeRegistry;

/// Validate raw arguments against a declaration, returning the coerced value
///
/// `raw` is `None` when the caller supplied nothing (distinct from an
/// explicit JSON null). The result is `None` when no arguments were supplied
/// and none were required.
pub fn validate_args(
    registry: &TypeRegistry,
    raw: Option<&Value>,
    def: Option<&ArgFieldDefinition>,
    path: &FieldPath,
) -> EngineResult<Option<Value>> {
    let Some(def) = def else {
        return match raw {
            Some(_) => Err(EngineError::args(
                "arguments are not accepted here",
                path.clone(),
            )),
            None => Ok(None),
        };
    };

    let Some(raw) = raw else {
        if def.required {
            return Err(EngineError::args("argument is required", path.clone()));
        }
        return Ok(None);
    };

    if raw.is_null() {
        if def.allow_null {
            return Ok(Some(Value::Null));
        }
        return Err(EngineError::args("argument must not be null", path.clone()));
    }

    let resolved = registry.resolve_arg_type(&def.arg_type, path)?;

    if let Some(options) = &def.array {
        let Some(items) = raw.as_array() else {
            return Err(EngineError::args("argument must be an array", path.clone()));
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if item.is_null() {
                if !options.allow_null_element {
                    return Err(EngineError::args(
                        "array elements must not be null",
                        path.clone(),
                    ));
                }
                out.push(Value::Null);
                continue;
            }
            out.push(validate_element(registry, item, def, &resolved, path)?);
        }
        return Ok(Some(Value::Array(out)));
    }

    // Even without a declared array shape, an array argument is validated
    // per element; null elements pass through untouched
    if let Value::Array(items) = raw {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if item.is_null() {
                out.push(Value::Null);
                continue;
            }
            out.push(validate_element(registry, item, def, &resolved, path)?);
        }
        return Ok(Some(Value::Array(out)));
    }

    Ok(Some(validate_element(registry, raw, def, &resolved, path)?))
}

fn validate_element(
    registry: &TypeRegistry,
    value: &Value,
    def: &ArgFieldDefinition,
    resolved: &TypeDefinition,
    path: &FieldPath,
) -> EngineResult<Value> {
    match resolved {
        TypeDefinition::Input(input) => {
            let Some(obj) = value.as_object() else {
                return Err(EngineError::args(
                    format!("argument must be an object of type '{}'", input.name()),
                    path.clone(),
                ));
            };

            let mut out = Map::new();
            for (name, field_def) in input.fields() {
                let child_path = path.child(name.as_str());
                let validated =
                    validate_args(registry, obj.get(name), Some(field_def), &child_path)?;
                // Absent optional fields are dropped, not defaulted
                if let Some(validated) = validated {
                    out.insert(name.clone(), validated);
                }
            }

            let unknown: Vec<&str> = obj
                .keys()
                .filter(|key| !input.fields().contains_key(key.as_str()))
                .map(|key| key.as_str())
                .collect();
            if !unknown.is_empty() {
                return Err(EngineError::args(
                    format!("unknown argument keys: {}", unknown.join(", ")),
                    path.clone(),
                ));
            }

            let coerced = Value::Object(out);
            if let Some(validator) = &def.inputs_validator {
                validator(&coerced, path)?;
            }
            Ok(coerced)
        }
        TypeDefinition::Scalar(scalar) => match scalar.parse_fn() {
            Some(parse) => parse(value).map_err(|err| {
                // The original error never escapes; only its message does
                EngineError::args(
                    format!("invalid scalar value for '{}': {}", scalar.name(), err),
                    path.clone(),
                )
            }),
            None => Ok(value.clone()),
        },
        TypeDefinition::Object(object) => Err(EngineError::schema(
            format!(
                "object type '{}' is not valid in argument position",
                object.name()
            ),
            path.clone(),
        )),
    }
}
