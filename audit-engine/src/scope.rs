//! Read-only variable scope for expression evaluation.
//!
//! Built once per intercepted call from the named parameters plus the
//! outcome bindings, then never mutated. Lookups resolve a variable name
//! with an optional dotted field path (`returnObj.errMsg`).

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{AuditError, Result};

/// Conventional binding for the wrapped operation's return value.
pub const RETURN_VAR: &str = "returnObj";
/// Conventional binding for the raised error, absent when the call succeeded.
pub const ERROR_VAR: &str = "error";
/// Conventional binding for the raised error's display text.
pub const ERROR_MSG_VAR: &str = "errorMsg";
/// Boolean binding: did the wrapped operation raise?
pub const THREW_VAR: &str = "threw";

/// Builder collecting named bindings before the scope is frozen.
#[derive(Debug, Default)]
pub struct ScopeBuilder {
    vars: HashMap<String, Value>,
}

impl ScopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a named value, serializing it into the scope.
    ///
    /// A value that cannot be serialized is bound as JSON null with a
    /// warning; parameter binding never fails an intercepted call.
    pub fn bind<T: Serialize>(mut self, name: impl Into<String>, value: &T) -> Self {
        let name = name.into();
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                warn!(target: "audit", variable = %name, error = %e, "Cannot bind audit variable");
                Value::Null
            }
        };
        self.vars.insert(name, value);
        self
    }

    /// Bind an already-converted JSON value.
    pub fn bind_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.vars.insert(name.into(), value);
        self
    }

    pub fn build(self) -> ExpressionScope {
        ExpressionScope { vars: self.vars }
    }
}

/// Frozen name → value mapping consumed by the evaluator.
#[derive(Debug)]
pub struct ExpressionScope {
    vars: HashMap<String, Value>,
}

impl ExpressionScope {
    pub fn builder() -> ScopeBuilder {
        ScopeBuilder::new()
    }

    /// Whether a variable of this exact name is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Resolve a dotted path (`var`, `var.field`, `var.field.sub`).
    ///
    /// # Errors
    ///
    /// [`AuditError::UnknownVariable`] when the leading variable is not
    /// bound; [`AuditError::Evaluation`] for an empty path or a field
    /// access that does not resolve.
    pub fn lookup(&self, path: &str) -> Result<&Value> {
        let mut segments = path.split('.');
        let name = segments.next().unwrap_or_default();
        if name.is_empty() {
            return Err(AuditError::evaluation(path, "empty variable path"));
        }

        let mut current = self
            .vars
            .get(name)
            .ok_or_else(|| AuditError::UnknownVariable(name.to_string()))?;

        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment).ok_or_else(|| {
                    AuditError::evaluation(path, format!("no field '{}'", segment))
                })?,
                _ => {
                    return Err(AuditError::evaluation(
                        path,
                        format!("'{}' is not an object", segment),
                    ))
                }
            };
        }

        Ok(current)
    }
}
