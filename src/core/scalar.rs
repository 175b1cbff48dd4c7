//! Scalar types and built-in scalar formats
//!
//! A scalar type optionally carries a `parse_value` transform (applied to
//! incoming argument values) and a `serialize` transform (applied to outgoing
//! result values). Both are fallible; the engine catches their errors and
//! re-wraps them so the original error never escapes.

use anyhow::bail;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// A fallible value transform attached to a scalar type
pub type ScalarFn = Arc<dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync>;

/// A scalar type definition with optional parse/serialize transforms
#[derive(Clone)]
pub struct ScalarType {
    name: String,
    parse_value: Option<ScalarFn>,
    serialize: Option<ScalarFn>,
}

impl ScalarType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parse_value: None,
            serialize: None,
        }
    }

    /// Attach a transform applied to incoming argument values
    pub fn with_parse_value(
        mut self,
        f: impl Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.parse_value = Some(Arc::new(f));
        self
    }

    /// Attach a transform applied to outgoing result values
    pub fn with_serialize(
        mut self,
        f: impl Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.serialize = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parse_fn(&self) -> Option<&ScalarFn> {
        self.parse_value.as_ref()
    }

    pub fn serialize_fn(&self) -> Option<&ScalarFn> {
        self.serialize.as_ref()
    }
}

impl fmt::Debug for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarType")
            .field("name", &self.name)
            .field("parse_value", &self.parse_value.is_some())
            .field("serialize", &self.serialize.is_some())
            .finish()
    }
}

// =============================================================================
// Built-in scalars
// =============================================================================

/// Plain string, no coercion
pub fn string() -> ScalarType {
    ScalarType::new("String").with_parse_value(|value| {
        if value.is_string() {
            Ok(value.clone())
        } else {
            bail!("expected a string")
        }
    })
}

/// 64-bit signed integer
pub fn int() -> ScalarType {
    ScalarType::new("Int").with_parse_value(|value| {
        if value.as_i64().is_some() {
            Ok(value.clone())
        } else {
            bail!("expected an integer")
        }
    })
}

/// Floating-point number (integers accepted)
pub fn float() -> ScalarType {
    ScalarType::new("Float").with_parse_value(|value| {
        if value.as_f64().is_some() {
            Ok(value.clone())
        } else {
            bail!("expected a number")
        }
    })
}

pub fn boolean() -> ScalarType {
    ScalarType::new("Boolean").with_parse_value(|value| {
        if value.is_boolean() {
            Ok(value.clone())
        } else {
            bail!("expected a boolean")
        }
    })
}

/// Opaque identifier: a string or an integer, serialized as a string
pub fn id() -> ScalarType {
    ScalarType::new("Id")
        .with_parse_value(|value| match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::String(n.to_string())),
            _ => bail!("expected a string or integer identifier"),
        })
        .with_serialize(|value| match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            _ => bail!("expected a string or integer identifier"),
        })
}

/// UUID string, normalized to lowercase hyphenated form
pub fn uuid() -> ScalarType {
    ScalarType::new("Uuid").with_parse_value(|value| {
        let Some(s) = value.as_str() else {
            bail!("expected a UUID string");
        };
        let parsed = Uuid::parse_str(s)?;
        Ok(Value::String(parsed.to_string()))
    })
}

/// Email address, format-checked
pub fn email() -> ScalarType {
    ScalarType::new("Email").with_parse_value(|value| {
        let Some(s) = value.as_str() else {
            bail!("expected an email string");
        };
        if is_valid_email(s) {
            Ok(value.clone())
        } else {
            bail!("invalid email address: '{}'", s)
        }
    })
}

/// RFC 3339 datetime, parsed and re-serialized in UTC
pub fn datetime() -> ScalarType {
    ScalarType::new("DateTime")
        .with_parse_value(|value| {
            let Some(s) = value.as_str() else {
                bail!("expected an RFC 3339 datetime string");
            };
            let parsed: DateTime<Utc> = DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc);
            Ok(Value::String(parsed.to_rfc3339()))
        })
        .with_serialize(|value| {
            let Some(s) = value.as_str() else {
                bail!("expected an RFC 3339 datetime string");
            };
            let parsed: DateTime<Utc> = DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc);
            Ok(Value::String(parsed.to_rfc3339()))
        })
}

fn is_valid_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());
    regex.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(scalar: &ScalarType, value: Value) -> anyhow::Result<Value> {
        scalar.parse_fn().expect("parse fn")(&value)
    }

    #[test]
    fn test_int_accepts_integers() {
        assert_eq!(parse(&int(), json!(42)).unwrap(), json!(42));
    }

    #[test]
    fn test_int_rejects_strings() {
        assert!(parse(&int(), json!("42")).is_err());
    }

    #[test]
    fn test_string_rejects_numbers() {
        assert!(parse(&string(), json!(1)).is_err());
    }

    #[test]
    fn test_float_accepts_integers() {
        assert!(parse(&float(), json!(3)).is_ok());
        assert!(parse(&float(), json!(3.14)).is_ok());
    }

    #[test]
    fn test_boolean() {
        assert!(parse(&boolean(), json!(true)).is_ok());
        assert!(parse(&boolean(), json!("true")).is_err());
    }

    #[test]
    fn test_id_coerces_integers_to_strings() {
        assert_eq!(parse(&id(), json!(7)).unwrap(), json!("7"));
        assert_eq!(parse(&id(), json!("abc")).unwrap(), json!("abc"));
        assert!(parse(&id(), json!(3.5)).is_err());
    }

    #[test]
    fn test_uuid_normalizes() {
        let raw = "550E8400-E29B-41D4-A716-446655440000";
        let parsed = parse(&uuid(), json!(raw)).unwrap();
        assert_eq!(parsed, json!(raw.to_lowercase()));
    }

    #[test]
    fn test_uuid_rejects_garbage() {
        assert!(parse(&uuid(), json!("not-a-uuid")).is_err());
        assert!(parse(&uuid(), json!(42)).is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(parse(&email(), json!("test@example.com")).is_ok());
        assert!(parse(&email(), json!("user.name+tag@example.co.uk")).is_ok());
        assert!(parse(&email(), json!("invalid-email")).is_err());
        assert!(parse(&email(), json!("@example.com")).is_err());
    }

    #[test]
    fn test_datetime_round_trip_is_stable() {
        let scalar = datetime();
        let parsed = parse(&scalar, json!("2024-01-15T10:30:00+02:00")).unwrap();
        let serialized = scalar.serialize_fn().unwrap()(&parsed).unwrap();
        let again = scalar.serialize_fn().unwrap()(&serialized).unwrap();
        assert_eq!(serialized, again);
    }

    #[test]
    fn test_datetime_converts_to_utc() {
        let parsed = parse(&datetime(), json!("2024-01-15T10:30:00+02:00")).unwrap();
        assert_eq!(parsed, json!("2024-01-15T08:30:00+00:00"));
    }

    #[test]
    fn test_debug_does_not_leak_closures() {
        let rendered = format!("{:?}", uuid());
        assert!(rendered.contains("Uuid"));
    }
}
