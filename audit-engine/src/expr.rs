//! Expression and template evaluation.
//!
//! The audit message language is deliberately tiny: a variable reference
//! with an optional dotted field path (`#returnObj.errMsg`), and messages
//! wrapped in `#{` .. `}` that either name a single path or interpolate
//! `{path}` placeholders into surrounding literal text. That covers what
//! audit templates need without embedding a scripting engine.

use tracing::warn;

use crate::entry::{AuditLog, Level};
use crate::error::{AuditError, Result};
use crate::scope::ExpressionScope;
use crate::value;

/// Marker prefix identifying a configured arg as an expression.
pub const EXPR_MARKER: char = '#';

/// Is this configured arg value an expression (as opposed to a literal)?
pub fn is_arg_expression(raw: &str) -> bool {
    raw.starts_with(EXPR_MARKER) && !raw.starts_with("#{")
}

/// Is this message text wrapped in the expression delimiter pair?
pub fn is_wrapped(message: &str) -> bool {
    message.len() > 3 && message.starts_with("#{") && message.ends_with('}')
}

/// Evaluate a bare dotted-path expression to literal text.
pub fn evaluate(scope: &ExpressionScope, path: &str) -> Result<String> {
    Ok(value::display_string(scope.lookup(path.trim())?))
}

/// Resolve one configured arg against the scope.
///
/// Expressions (`#path`) evaluate; anything else passes through verbatim.
/// An expression that fails to evaluate falls back to its raw configured
/// text with a warning, so one bad arg never spoils the record.
pub fn resolve_arg(scope: &ExpressionScope, raw: &str) -> String {
    if !is_arg_expression(raw) {
        return raw.to_string();
    }
    match evaluate(scope, &raw[1..]) {
        Ok(text) => text,
        Err(e) => {
            warn!(target: "audit", expr = %raw, error = %e, "Cannot evaluate audit arg");
            raw.to_string()
        }
    }
}

/// Render a message: `#{...}` evaluates against the scope, plain text is
/// used verbatim.
///
/// Inside the delimiters, text containing `{path}` placeholders is
/// interpolated; otherwise the whole content is a single path expression.
pub fn render_message(scope: &ExpressionScope, message: &str) -> Result<String> {
    if !is_wrapped(message) {
        return Ok(message.to_string());
    }
    let inner = &message[2..message.len() - 1];
    if inner.contains('{') {
        interpolate(scope, inner)
    } else {
        evaluate(scope, inner)
    }
}

fn interpolate(scope: &ExpressionScope, text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| AuditError::evaluation(text, "unterminated placeholder"))?;
        let path = after[..end].trim();
        out.push_str(&value::display_string(scope.lookup(path)?));
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Fill in a record's message, template flag and args from one selected
/// message/template pair.
///
/// Mode selection: a non-empty message wins over a template. Template mode
/// marks the record templated, keeps the template text as the message and
/// appends each resolved arg positionally. A top-level message that fails
/// to evaluate downgrades the record to warn level and carries the failure
/// description instead - degrade, never drop.
pub(crate) fn render_into(
    record: &mut AuditLog,
    scope: &ExpressionScope,
    message: &str,
    template: &str,
    args: &[String],
) {
    if !message.trim().is_empty() {
        match render_message(scope, message) {
            Ok(text) => record.message = text,
            Err(e) => {
                warn!(target: "audit", expr = %message, error = %e, "Cannot evaluate audit message");
                record.level = Level::Warn;
                record.message = e.to_string();
            }
        }
    } else if !template.trim().is_empty() {
        record.template = true;
        record.message = template.to_string();
        for raw in args {
            record.push_arg(resolve_arg(scope, raw));
        }
    }
}
