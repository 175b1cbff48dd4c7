//! Leaf-fetch marker
//!
//! A query requests a scalar leaf's value by placing the sentinel where a
//! sub-query would otherwise go. The marker is a dedicated type owned by the
//! schema, never an ambient global, so two schemas in one process can use
//! different markers without colliding.

use serde_json::Value;

/// The reserved marker signaling "resolve this scalar leaf"
///
/// Configured once when the schema is built and read-only afterward. The
/// default marker is JSON `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentinel(Value);

impl Sentinel {
    pub fn new(marker: Value) -> Self {
        Self(marker)
    }

    /// Whether a query value is the leaf-fetch marker
    pub fn matches(&self, value: &Value) -> bool {
        *value == self.0
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl Default for Sentinel {
    fn default() -> Self {
        Self(Value::Bool(true))
    }
}
