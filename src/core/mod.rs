//! Core building blocks: errors, field paths, the type system, scalar
//! formats, resolver interfaces, and the leaf-fetch sentinel.

pub mod error;
pub mod path;
pub mod resolver;
pub mod scalar;
pub mod sentinel;
pub mod types;

pub use error::{EngineError, EngineResult, ErrorBody, ErrorResponse};
pub use path::FieldPath;
pub use resolver::{Dataloader, FieldInput, FieldResolver, RequestContext, RootResolver, SharedData};
pub use scalar::{ScalarFn, ScalarType};
pub use sentinel::Sentinel;
pub use types::{
    ArgFieldDefinition, ArrayOptions, FieldDefinition, FieldType, InputType, InputsValidator,
    NodeDefinition, ObjectType, ResolverNode, RootResolverDefinition, TypeDefinition, TypeLookup,
};
