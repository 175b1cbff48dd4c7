//! Schema type system: type definitions, field definitions, resolver nodes
//!
//! The three type kinds (Scalar/Object/Input) and the two field kinds
//! (plain/root) are tagged enums dispatched by kind. Recursive type graphs
//! (e.g. `User.friends: [User]`) are expressed with [`TypeLookup`], a by-name
//! deferred reference resolved against the registry at the point of use, so
//! one type never eagerly embeds another.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::error::EngineError;
use super::path::FieldPath;
use super::resolver::{Dataloader, FieldResolver, RootResolver};
use super::scalar::ScalarType;

/// A registered type, tagged by kind
#[derive(Debug, Clone)]
pub enum TypeDefinition {
    Scalar(Arc<ScalarType>),
    Object(Arc<ObjectType>),
    Input(Arc<InputType>),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Scalar(s) => s.name(),
            TypeDefinition::Object(o) => o.name(),
            TypeDefinition::Input(i) => i.name(),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, TypeDefinition::Object(_))
    }
}

/// A by-name deferred reference to a registered type
///
/// The namespace it resolves in depends on where it is used: a lookup in
/// field position resolves against the object-type map, a lookup in argument
/// position against the input-type map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeLookup {
    name: String,
}

impl TypeLookup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The type a field or argument is declared with
#[derive(Clone)]
pub enum FieldType {
    Scalar(Arc<ScalarType>),
    Object(Arc<ObjectType>),
    Input(Arc<InputType>),
    Lookup(TypeLookup),
}

impl FieldType {
    /// Shorthand for a by-name reference
    pub fn lookup(name: impl Into<String>) -> Self {
        FieldType::Lookup(TypeLookup::new(name))
    }

    pub fn scalar(scalar: ScalarType) -> Self {
        FieldType::Scalar(Arc::new(scalar))
    }

    pub fn object(object: ObjectType) -> Self {
        FieldType::Object(Arc::new(object))
    }

    pub fn input(input: InputType) -> Self {
        FieldType::Input(Arc::new(input))
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(s) => write!(f, "Scalar({})", s.name()),
            FieldType::Object(o) => write!(f, "Object({})", o.name()),
            FieldType::Input(i) => write!(f, "Input({})", i.name()),
            FieldType::Lookup(l) => write!(f, "Lookup({})", l.name()),
        }
    }
}

/// An object type: a named, declaration-ordered set of output fields
#[derive(Debug, Clone)]
pub struct ObjectType {
    name: String,
    fields: IndexMap<String, Arc<FieldDefinition>>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Declare a field; redeclaring a name replaces the previous definition
    pub fn field(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.fields.insert(name.into(), Arc::new(definition));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &IndexMap<String, Arc<FieldDefinition>> {
        &self.fields
    }

    pub fn get_field(&self, name: &str) -> Option<&Arc<FieldDefinition>> {
        self.fields.get(name)
    }
}

/// An input type: a named, declaration-ordered set of argument fields
#[derive(Debug, Clone)]
pub struct InputType {
    name: String,
    fields: IndexMap<String, Arc<ArgFieldDefinition>>,
}

impl InputType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, definition: ArgFieldDefinition) -> Self {
        self.fields.insert(name.into(), Arc::new(definition));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &IndexMap<String, Arc<ArgFieldDefinition>> {
        &self.fields
    }
}

/// Array shape options for a field or argument
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArrayOptions {
    /// Whether individual elements may be null
    pub allow_null_element: bool,
}

/// A custom validator run over a validated input value
pub type InputsValidator = Arc<dyn Fn(&Value, &FieldPath) -> Result<(), EngineError> + Send + Sync>;

/// Declaration of one output field on an object type
#[derive(Clone)]
pub struct FieldDefinition {
    pub field_type: FieldType,
    /// Whether the resolved value may be null
    pub allow_null: bool,
    /// When set, the resolved value must be an array (or null iff `allow_null`)
    pub array: Option<ArrayOptions>,
    pub args: Option<ArgFieldDefinition>,
    /// Hidden fields are never reachable from any query
    pub hidden: bool,
    /// A field-owned resolver; such a field owns its own subtree
    pub resolver: Option<Arc<dyn FieldResolver>>,
    pub dataloader: Option<Arc<dyn Dataloader>>,
    /// Deferred fields are skipped during execution; the batch aggregation
    /// pass resolves them from the raw value left in place
    pub defer: bool,
}

impl FieldDefinition {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            allow_null: false,
            array: None,
            args: None,
            hidden: false,
            resolver: None,
            dataloader: None,
            defer: false,
        }
    }

    pub fn scalar(scalar: ScalarType) -> Self {
        Self::new(FieldType::scalar(scalar))
    }

    pub fn object(object: ObjectType) -> Self {
        Self::new(FieldType::object(object))
    }

    pub fn lookup(name: impl Into<String>) -> Self {
        Self::new(FieldType::lookup(name))
    }

    pub fn nullable(mut self) -> Self {
        self.allow_null = true;
        self
    }

    pub fn list(mut self, options: ArrayOptions) -> Self {
        self.array = Some(options);
        self
    }

    pub fn with_args(mut self, args: ArgFieldDefinition) -> Self {
        self.args = Some(args);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_resolver(mut self, resolver: impl FieldResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn with_dataloader(mut self, dataloader: impl Dataloader + 'static) -> Self {
        self.dataloader = Some(Arc::new(dataloader));
        self
    }

    pub fn deferred(mut self) -> Self {
        self.defer = true;
        self
    }
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("field_type", &self.field_type)
            .field("allow_null", &self.allow_null)
            .field("array", &self.array)
            .field("hidden", &self.hidden)
            .field("resolver", &self.resolver.is_some())
            .field("dataloader", &self.dataloader.is_some())
            .field("defer", &self.defer)
            .finish()
    }
}

/// Declaration of one argument field
#[derive(Clone)]
pub struct ArgFieldDefinition {
    pub arg_type: FieldType,
    /// Whether the argument must be supplied
    pub required: bool,
    /// Whether an explicit null is accepted
    pub allow_null: bool,
    pub array: Option<ArrayOptions>,
    /// Custom validation run over each validated input value
    pub inputs_validator: Option<InputsValidator>,
}

impl ArgFieldDefinition {
    pub fn new(arg_type: FieldType) -> Self {
        Self {
            arg_type,
            required: false,
            allow_null: false,
            array: None,
            inputs_validator: None,
        }
    }

    pub fn scalar(scalar: ScalarType) -> Self {
        Self::new(FieldType::scalar(scalar))
    }

    pub fn input(input: InputType) -> Self {
        Self::new(FieldType::input(input))
    }

    pub fn lookup(name: impl Into<String>) -> Self {
        Self::new(FieldType::lookup(name))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.allow_null = true;
        self
    }

    pub fn list(mut self, options: ArrayOptions) -> Self {
        self.array = Some(options);
        self
    }

    pub fn with_inputs_validator(
        mut self,
        f: impl Fn(&Value, &FieldPath) -> Result<(), EngineError> + Send + Sync + 'static,
    ) -> Self {
        self.inputs_validator = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ArgFieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgFieldDefinition")
            .field("arg_type", &self.arg_type)
            .field("required", &self.required)
            .field("allow_null", &self.allow_null)
            .field("array", &self.array)
            .field("inputs_validator", &self.inputs_validator.is_some())
            .finish()
    }
}

/// A field definition mounted as a top-level entry point, with its resolver
#[derive(Clone)]
pub struct RootResolverDefinition {
    pub field: FieldDefinition,
    pub resolver: Arc<dyn RootResolver>,
}

impl RootResolverDefinition {
    pub fn new(field: FieldDefinition, resolver: impl RootResolver + 'static) -> Self {
        Self {
            field,
            resolver: Arc::new(resolver),
        }
    }
}

impl fmt::Debug for RootResolverDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootResolverDefinition")
            .field("field", &self.field)
            .finish()
    }
}

/// What a resolver node was built from: a plain field or a root entry point
#[derive(Debug, Clone)]
pub enum NodeDefinition {
    Field(Arc<FieldDefinition>),
    Root(Arc<RootResolverDefinition>),
}

impl NodeDefinition {
    /// The underlying field declaration
    pub fn field(&self) -> &FieldDefinition {
        match self {
            NodeDefinition::Field(field) => field,
            NodeDefinition::Root(root) => &root.field,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, NodeDefinition::Root(_))
    }
}

/// One node of a validated resolver tree
///
/// Built once per request by the query tree builder and discarded after the
/// response is finalized.
#[derive(Debug)]
pub struct ResolverNode {
    pub definition: NodeDefinition,
    /// The sub-query beneath this field, with `__args` removed
    pub query: Value,
    /// Validated and coerced arguments, if any were supplied or defaulted
    pub args: Option<Value>,
    /// Child nodes in declaration order; `None` when subtree ownership is
    /// deferred to this field's own resolver
    pub nested: Option<IndexMap<String, ResolverNode>>,
}
