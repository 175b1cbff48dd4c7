//! Type registry: name → definition maps for object and input types
//!
//! Two read-only maps populated before traffic starts. Forward references are
//! expressed as [`TypeLookup`]s and resolved here at the point of use, which
//! is what makes recursive type graphs representable.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::error::{EngineError, EngineResult};
use crate::core::path::FieldPath;
use crate::core::types::{FieldType, InputType, ObjectType, TypeDefinition};

/// Immutable maps from type name to registered definition
#[derive(Debug, Default)]
pub struct TypeRegistry {
    objects: HashMap<String, Arc<ObjectType>>,
    inputs: HashMap<String, Arc<InputType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object type; re-registering a name replaces it
    pub fn register_object(&mut self, object: ObjectType) {
        self.objects.insert(object.name().to_string(), Arc::new(object));
    }

    pub fn register_input(&mut self, input: InputType) {
        self.inputs.insert(input.name().to_string(), Arc::new(input));
    }

    pub fn contains_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    pub fn contains_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    /// Resolve an object type by name
    ///
    /// An unregistered name is a fatal schema defect, never a user-facing
    /// error: requests hitting it abort with a 500-class [`EngineError::Schema`].
    pub fn resolve_object(&self, name: &str, path: &FieldPath) -> EngineResult<Arc<ObjectType>> {
        self.objects.get(name).cloned().ok_or_else(|| {
            EngineError::schema(format!("unregistered object type '{}'", name), path.clone())
        })
    }

    pub fn resolve_input(&self, name: &str, path: &FieldPath) -> EngineResult<Arc<InputType>> {
        self.inputs.get(name).cloned().ok_or_else(|| {
            EngineError::schema(format!("unregistered input type '{}'", name), path.clone())
        })
    }

    /// Resolve a type in field position (lookups target the object map)
    pub fn resolve_field_type(
        &self,
        field_type: &FieldType,
        path: &FieldPath,
    ) -> EngineResult<TypeDefinition> {
        match field_type {
            FieldType::Scalar(s) => Ok(TypeDefinition::Scalar(s.clone())),
            FieldType::Object(o) => Ok(TypeDefinition::Object(o.clone())),
            FieldType::Input(i) => Ok(TypeDefinition::Input(i.clone())),
            FieldType::Lookup(lookup) => Ok(TypeDefinition::Object(
                self.resolve_object(lookup.name(), path)?,
            )),
        }
    }

    /// Resolve a type in argument position (lookups target the input map)
    pub fn resolve_arg_type(
        &self,
        arg_type: &FieldType,
        path: &FieldPath,
    ) -> EngineResult<TypeDefinition> {
        match arg_type {
            FieldType::Scalar(s) => Ok(TypeDefinition::Scalar(s.clone())),
            FieldType::Object(o) => Ok(TypeDefinition::Object(o.clone())),
            FieldType::Input(i) => Ok(TypeDefinition::Input(i.clone())),
            FieldType::Lookup(lookup) => Ok(TypeDefinition::Input(
                self.resolve_input(lookup.name(), path)?,
            )),
        }
    }

    pub fn object_names(&self) -> Vec<&str> {
        self.objects.keys().map(|s| s.as_str()).collect()
    }

    pub fn objects(&self) -> impl Iterator<Item = &Arc<ObjectType>> {
        self.objects.values()
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Arc<InputType>> {
        self.inputs.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scalar;
    use crate::core::types::FieldDefinition;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register_object(
            ObjectType::new("User").field("id", FieldDefinition::scalar(scalar::id())),
        );
        registry.register_input(InputType::new("UserFilter"));
        registry
    }

    #[test]
    fn test_resolve_registered_object() {
        let registry = registry();
        let user = registry
            .resolve_object("User", &FieldPath::root())
            .expect("should resolve");
        assert_eq!(user.name(), "User");
    }

    #[test]
    fn test_resolve_unregistered_object_is_schema_error() {
        let registry = registry();
        let err = registry
            .resolve_object("Ghost", &FieldPath::root().child("ghost"))
            .unwrap_err();
        assert!(matches!(err, EngineError::Schema { .. }));
        assert_eq!(err.field_path().segments(), &["ghost".to_string()]);
    }

    #[test]
    fn test_field_lookup_targets_object_map() {
        let registry = registry();
        // "UserFilter" only exists as an input type
        let err = registry
            .resolve_field_type(&FieldType::lookup("UserFilter"), &FieldPath::root())
            .unwrap_err();
        assert!(matches!(err, EngineError::Schema { .. }));
    }

    #[test]
    fn test_arg_lookup_targets_input_map() {
        let registry = registry();
        let resolved = registry
            .resolve_arg_type(&FieldType::lookup("UserFilter"), &FieldPath::root())
            .expect("should resolve");
        assert_eq!(resolved.name(), "UserFilter");
    }

    #[test]
    fn test_inline_types_resolve_without_registry() {
        let registry = TypeRegistry::new();
        let resolved = registry
            .resolve_field_type(&FieldType::scalar(scalar::int()), &FieldPath::root())
            .expect("inline scalar needs no registration");
        assert_eq!(resolved.name(), "Int");
    }

    #[test]
    fn test_reregister_replaces() {
        let mut registry = registry();
        registry.register_object(ObjectType::new("User"));
        let user = registry.resolve_object("User", &FieldPath::root()).unwrap();
        assert!(user.fields().is_empty());
    }
}
