//! # TreeQL
//!
//! A typed, JSON-native query execution engine: clients send a JSON tree
//! describing the fields they want, the engine validates it against a typed
//! schema, runs the registered resolvers, batches related fetches through
//! dataloaders, and returns a response shaped exactly like the query.
//!
//! ## Features
//!
//! - **Typed schema**: object, input, and scalar types with by-name lookups,
//!   so recursive graphs (`User.friends: [User]`) come for free
//! - **JSON-native queries**: the query language is plain JSON — a field is
//!   requested with the fetch marker (`true` by default) or a nested object
//! - **Argument validation**: declared arguments are validated and coerced
//!   before any resolver runs, with errors naming the exact field path
//! - **Batched fetches**: dataloader fields collapse N+1 patterns into one
//!   batch call per sibling group
//! - **Result contracts**: null and array declarations are enforced on the
//!   way out; a resolver that violates them is a server error, never silent
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use treeql::prelude::*;
//!
//! let schema = Schema::builder()
//!     .object(
//!         ObjectType::new("User")
//!             .field("id", FieldDefinition::scalar(scalar::id()))
//!             .field("name", FieldDefinition::scalar(scalar::string())),
//!     )
//!     .root(
//!         "users",
//!         RootResolverDefinition::new(
//!             FieldDefinition::lookup("User").list(Default::default()),
//!             ListUsers,
//!         ),
//!     )?
//!     .build()?;
//!
//! let engine = Engine::new(schema);
//! let response = engine
//!     .run(
//!         "users",
//!         &serde_json::json!({"id": true, "name": true}),
//!         &RequestContext::new(),
//!     )
//!     .await;
//! ```

pub mod core;
pub mod engine;
pub mod schema;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        error::{EngineError, EngineResult, ErrorBody},
        path::FieldPath,
        resolver::{
            Dataloader, FieldInput, FieldResolver, RequestContext, RootResolver, SharedData,
        },
        scalar::{self, ScalarType},
        sentinel::Sentinel,
        types::{
            ArgFieldDefinition, ArrayOptions, FieldDefinition, FieldType, InputType, ObjectType,
            ResolverNode, RootResolverDefinition,
        },
    };

    // === Schema ===
    pub use crate::schema::{Schema, SchemaBuildError, SchemaBuilder};

    // === Engine ===
    pub use crate::engine::{ARGS_KEY, Engine, EngineConfig, QueryResponse};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde_json::{Value, json};
}
