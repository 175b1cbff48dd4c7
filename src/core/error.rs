//! Typed error handling for the query engine
//!
//! The engine distinguishes failure kinds by who broke the contract:
//!
//! - [`EngineError::Schema`]: registry/lookup misconfiguration — a deployment
//!   bug, aborts the request (500)
//! - [`EngineError::Args`]: invalid caller arguments (400)
//! - [`EngineError::Query`]: invalid requested field or query shape (400)
//! - [`EngineError::Result`]: a resolver violated the schema contract — a
//!   server bug (500)
//! - [`EngineError::Resolver`]: an error raised inside a resolver, passed
//!   through unmodified (500)
//!
//! Every variant carries the [`FieldPath`] of the field it concerns.
//! Validation is fail-fast: the most specific kind is raised on the first
//! violation, with no partial-result accumulation.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use super::path::FieldPath;

/// The error type for all engine operations
#[derive(Debug)]
pub enum EngineError {
    /// Registry or lookup misconfiguration (fatal, a deployment bug)
    Schema { message: String, field_path: FieldPath },

    /// Invalid caller-supplied arguments
    Args { message: String, field_path: FieldPath },

    /// Invalid requested field or query shape
    Query { message: String, field_path: FieldPath },

    /// A resolver returned a value that violates the schema contract
    Result { message: String, field_path: FieldPath },

    /// An error raised by a resolver, passed through unmodified
    Resolver {
        message: String,
        field_path: FieldPath,
        source: anyhow::Error,
    },
}

impl EngineError {
    pub fn schema(message: impl Into<String>, field_path: FieldPath) -> Self {
        EngineError::Schema {
            message: message.into(),
            field_path,
        }
    }

    pub fn args(message: impl Into<String>, field_path: FieldPath) -> Self {
        EngineError::Args {
            message: message.into(),
            field_path,
        }
    }

    pub fn query(message: impl Into<String>, field_path: FieldPath) -> Self {
        EngineError::Query {
            message: message.into(),
            field_path,
        }
    }

    pub fn result(message: impl Into<String>, field_path: FieldPath) -> Self {
        EngineError::Result {
            message: message.into(),
            field_path,
        }
    }

    /// Wrap an error raised inside a resolver, preserving its message
    pub fn resolver(source: anyhow::Error, field_path: FieldPath) -> Self {
        EngineError::Resolver {
            message: source.to_string(),
            field_path,
            source,
        }
    }

    /// The path of the field this error concerns
    pub fn field_path(&self) -> &FieldPath {
        match self {
            EngineError::Schema { field_path, .. }
            | EngineError::Args { field_path, .. }
            | EngineError::Query { field_path, .. }
            | EngineError::Result { field_path, .. }
            | EngineError::Resolver { field_path, .. } => field_path,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            EngineError::Schema { message, .. }
            | EngineError::Args { message, .. }
            | EngineError::Query { message, .. }
            | EngineError::Result { message, .. }
            | EngineError::Resolver { message, .. } => message,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Schema { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::Args { .. } => StatusCode::BAD_REQUEST,
            EngineError::Query { .. } => StatusCode::BAD_REQUEST,
            EngineError::Result { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::Resolver { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::Schema { .. } => "SCHEMA_ERROR",
            EngineError::Args { .. } => "ARGS_ERROR",
            EngineError::Query { .. } => "QUERY_ERROR",
            EngineError::Result { .. } => "RESULT_ERROR",
            EngineError::Resolver { .. } => "RESOLVER_ERROR",
        }
    }

    /// Convert to the outward-facing error body
    ///
    /// Internal error objects never cross the engine boundary: only the
    /// message, the field path, and (under a debug configuration) a stack
    /// rendering are exposed.
    pub fn to_body(&self, debug: bool) -> ErrorBody {
        ErrorBody {
            message: self.message().to_string(),
            field_path: self.field_path().segments().to_vec(),
            stack: debug.then(|| format!("{self:?}")),
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.message().to_string(),
            field_path: self.field_path().segments().to_vec(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Schema { message, field_path } => {
                write!(f, "schema error at {}: {}", field_path, message)
            }
            EngineError::Args { message, field_path } => {
                write!(f, "invalid arguments at {}: {}", field_path, message)
            }
            EngineError::Query { message, field_path } => {
                write!(f, "invalid query at {}: {}", field_path, message)
            }
            EngineError::Result { message, field_path } => {
                write!(f, "invalid result at {}: {}", field_path, message)
            }
            EngineError::Resolver {
                message, field_path, ..
            } => {
                write!(f, "resolver error at {}: {}", field_path, message)
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Resolver { source, .. } => {
                let err: &(dyn std::error::Error + 'static) = source.as_ref();
                Some(err)
            }
            _ => None,
        }
    }
}

/// User-visible error body: `{message, fieldPath, stack?}`
///
/// `stack` is only populated under a debug configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "fieldPath")]
    pub field_path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Path of the field the error concerns
    #[serde(rename = "fieldPath")]
    pub field_path: Vec<String>,
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

/// A specialized Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
