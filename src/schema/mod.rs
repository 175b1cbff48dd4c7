//! Schema assembly and startup validation
//!
//! A [`Schema`] bundles everything the engine needs per process: the type
//! registry, the root resolver entry points, and the leaf-fetch sentinel.
//! It is built once with [`SchemaBuilder`] before traffic is served and is
//! read-only afterward; requests share it behind an `Arc`.

pub mod registry;

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::core::error::{EngineError, EngineResult};
use crate::core::path::FieldPath;
use crate::core::sentinel::Sentinel;
use crate::core::types::{
    ArgFieldDefinition, FieldDefinition, FieldType, InputType, ObjectType, RootResolverDefinition,
};
use registry::TypeRegistry;

/// Errors detected while assembling a schema
///
/// These abort startup: a lookup that cannot be resolved at build time would
/// otherwise surface as a 500 on the first request that touches it.
#[derive(Debug, thiserror::Error)]
pub enum SchemaBuildError {
    #[error("unresolved object lookup '{name}' referenced from {location}")]
    UnresolvedObjectLookup { name: String, location: String },

    #[error("unresolved input lookup '{name}' referenced from {location}")]
    UnresolvedInputLookup { name: String, location: String },

    #[error("input type '{name}' used in field position at {location}")]
    InputInFieldPosition { name: String, location: String },

    #[error("object type '{name}' used in argument position at {location}")]
    ObjectInArgPosition { name: String, location: String },

    #[error("duplicate root resolver '{name}'")]
    DuplicateRoot { name: String },
}

/// An immutable schema: type registry, entry points, and sentinel
#[derive(Debug)]
pub struct Schema {
    registry: TypeRegistry,
    roots: HashMap<String, Arc<RootResolverDefinition>>,
    sentinel: Sentinel,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn sentinel(&self) -> &Sentinel {
        &self.sentinel
    }

    /// Look up a top-level entry point by name
    ///
    /// Unknown names are a client error (the caller asked for an entry point
    /// that does not exist), not a schema defect.
    pub fn root(&self, name: &str) -> EngineResult<Arc<RootResolverDefinition>> {
        self.roots.get(name).cloned().ok_or_else(|| {
            EngineError::query(
                format!("unknown entry point '{}'", name),
                FieldPath::root(),
            )
        })
    }

    pub fn root_names(&self) -> Vec<&str> {
        self.roots.keys().map(|s| s.as_str()).collect()
    }
}

/// Fluent builder collecting types and entry points, validating on `build`
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    registry: TypeRegistry,
    roots: HashMap<String, Arc<RootResolverDefinition>>,
    sentinel: Sentinel,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(mut self, object: ObjectType) -> Self {
        self.registry.register_object(object);
        self
    }

    pub fn input(mut self, input: InputType) -> Self {
        self.registry.register_input(input);
        self
    }

    /// Mount a top-level entry point under the given name
    pub fn root(
        mut self,
        name: impl Into<String>,
        definition: RootResolverDefinition,
    ) -> Result<Self, SchemaBuildError> {
        let name = name.into();
        if self.roots.contains_key(&name) {
            return Err(SchemaBuildError::DuplicateRoot { name });
        }
        self.roots.insert(name, Arc::new(definition));
        Ok(self)
    }

    /// Configure the leaf-fetch marker (defaults to JSON `true`)
    pub fn sentinel(mut self, marker: Value) -> Self {
        self.sentinel = Sentinel::new(marker);
        self
    }

    /// Validate every registered lookup and freeze the schema
    pub fn build(self) -> Result<Schema, SchemaBuildError> {
        let walker = SchemaWalker {
            registry: &self.registry,
        };
        for object in self.registry.objects() {
            for (field_name, field) in object.fields() {
                let location = format!("object '{}', field '{}'", object.name(), field_name);
                walker.check_field(field, &location)?;
            }
        }
        for input in self.registry.inputs() {
            let mut visiting = HashSet::new();
            walker.check_input_fields(input, &format!("input '{}'", input.name()), &mut visiting)?;
        }
        for (name, root) in &self.roots {
            let location = format!("root '{}'", name);
            walker.check_field(&root.field, &location)?;
        }
        Ok(Schema {
            registry: self.registry,
            roots: self.roots,
            sentinel: self.sentinel,
        })
    }
}

struct SchemaWalker<'a> {
    registry: &'a TypeRegistry,
}

impl SchemaWalker<'_> {
    fn check_field(&self, field: &FieldDefinition, location: &str) -> Result<(), SchemaBuildError> {
        match &field.field_type {
            FieldType::Lookup(lookup) => {
                if !self.registry.contains_object(lookup.name()) {
                    return Err(SchemaBuildError::UnresolvedObjectLookup {
                        name: lookup.name().to_string(),
                        location: location.to_string(),
                    });
                }
            }
            FieldType::Input(input) => {
                return Err(SchemaBuildError::InputInFieldPosition {
                    name: input.name().to_string(),
                    location: location.to_string(),
                });
            }
            FieldType::Object(object) => {
                // Inline objects are reachable without registration
                for (field_name, nested) in object.fields() {
                    let location = format!("object '{}', field '{}'", object.name(), field_name);
                    self.check_field(nested, &location)?;
                }
            }
            FieldType::Scalar(_) => {}
        }
        if let Some(args) = &field.args {
            self.check_arg(args, location, &mut HashSet::new())?;
        }
        Ok(())
    }

    fn check_arg(
        &self,
        arg: &ArgFieldDefinition,
        location: &str,
        visiting: &mut HashSet<String>,
    ) -> Result<(), SchemaBuildError> {
        match &arg.arg_type {
            FieldType::Lookup(lookup) => {
                if !self.registry.contains_input(lookup.name()) {
                    return Err(SchemaBuildError::UnresolvedInputLookup {
                        name: lookup.name().to_string(),
                        location: location.to_string(),
                    });
                }
                // Recursive input graphs are legal; stop at already-visited names
                if visiting.insert(lookup.name().to_string()) {
                    let input = self
                        .registry
                        .resolve_input(lookup.name(), &FieldPath::root())
                        .expect("checked above");
                    self.check_input_fields(&input, location, visiting)?;
                }
            }
            FieldType::Input(input) => {
                if visiting.insert(input.name().to_string()) {
                    self.check_input_fields(input, location, visiting)?;
                }
            }
            FieldType::Object(object) => {
                return Err(SchemaBuildError::ObjectInArgPosition {
                    name: object.name().to_string(),
                    location: location.to_string(),
                });
            }
            FieldType::Scalar(_) => {}
        }
        Ok(())
    }

    fn check_input_fields(
        &self,
        input: &InputType,
        location: &str,
        visiting: &mut HashSet<String>,
    ) -> Result<(), SchemaBuildError> {
        for (field_name, arg) in input.fields() {
            let location = format!("{}, field '{}'", location, field_name);
            self.check_arg(arg, &location, visiting)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::{RequestContext, RootResolver};
    use crate::core::scalar;
    use async_trait::async_trait;
    use serde_json::json;

    struct NullRoot;

    #[async_trait]
    impl RootResolver for NullRoot {
        async fn resolve(
            &self,
            _ctx: &RequestContext,
            _path: &FieldPath,
            _args: Option<&Value>,
            _query: &Value,
        ) -> anyhow::Result<Value> {
            Ok(Value::Null)
        }
    }

    fn user_type() -> ObjectType {
        ObjectType::new("User")
            .field("id", FieldDefinition::scalar(scalar::id()))
            .field("friends", FieldDefinition::lookup("User").list(Default::default()))
    }

    #[test]
    fn test_build_with_recursive_object_graph() {
        let schema = Schema::builder()
            .object(user_type())
            .root(
                "user",
                RootResolverDefinition::new(FieldDefinition::lookup("User"), NullRoot),
            )
            .unwrap()
            .build()
            .expect("self-referential lookups should build");
        assert_eq!(schema.root_names(), vec!["user"]);
    }

    #[test]
    fn test_unresolved_field_lookup_fails_at_build() {
        let err = Schema::builder()
            .object(
                ObjectType::new("User").field("posts", FieldDefinition::lookup("Post")),
            )
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaBuildError::UnresolvedObjectLookup { ref name, .. } if name == "Post"
        ));
    }

    #[test]
    fn test_unresolved_arg_lookup_fails_at_build() {
        let err = Schema::builder()
            .object(ObjectType::new("User").field(
                "posts",
                FieldDefinition::lookup("User")
                    .with_args(ArgFieldDefinition::lookup("PostFilter")),
            ))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaBuildError::UnresolvedInputLookup { ref name, .. } if name == "PostFilter"
        ));
    }

    #[test]
    fn test_recursive_input_graph_builds() {
        let filter = InputType::new("Filter")
            .field("limit", ArgFieldDefinition::scalar(scalar::int()))
            .field("and", ArgFieldDefinition::lookup("Filter").nullable());
        let schema = Schema::builder()
            .input(filter)
            .object(ObjectType::new("User").field(
                "posts",
                FieldDefinition::lookup("User").with_args(ArgFieldDefinition::lookup("Filter")),
            ))
            .build();
        assert!(schema.is_ok());
    }

    #[test]
    fn test_duplicate_root_rejected() {
        let builder = Schema::builder()
            .object(user_type())
            .root(
                "user",
                RootResolverDefinition::new(FieldDefinition::lookup("User"), NullRoot),
            )
            .unwrap();
        let err = builder
            .root(
                "user",
                RootResolverDefinition::new(FieldDefinition::lookup("User"), NullRoot),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaBuildError::DuplicateRoot { ref name } if name == "user"));
    }

    #[test]
    fn test_unknown_entry_point_is_query_error() {
        let schema = Schema::builder().build().unwrap();
        let err = schema.root("nope").unwrap_err();
        assert!(matches!(err, EngineError::Query { .. }));
    }

    #[test]
    fn test_custom_sentinel() {
        let schema = Schema::builder().sentinel(json!("@")).build().unwrap();
        assert!(schema.sentinel().matches(&json!("@")));
        assert!(!schema.sentinel().matches(&json!(true)));
    }

    #[test]
    fn test_object_in_arg_position_rejected() {
        let err = Schema::builder()
            .object(ObjectType::new("User").field(
                "posts",
                FieldDefinition::lookup("User")
                    .with_args(ArgFieldDefinition::new(FieldType::object(ObjectType::new("Bad")))),
            ))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaBuildError::ObjectInArgPosition { .. }));
    }
}
