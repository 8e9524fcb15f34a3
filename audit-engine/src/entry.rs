// Audit record types and structures
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::AuditContext;
use crate::error::{AuditError, Result};

/// Severity of an audit record.
///
/// Serialized as lowercase strings for wire compatibility. Unknown input
/// strings fall back to [`Level::Info`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Info,
    Warn,
    Error,
}

impl Level {
    /// Parse a level string, defaulting to `info` for blank or unknown input.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "warn" | "warning" => Level::Warn,
            "error" => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One positional template argument.
///
/// Indices are assigned in declaration order and are never deduplicated;
/// positional substitution depends on the ordering being preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arg {
    pub index: u32,
    pub value: String,
}

impl Arg {
    pub fn new(index: u32, value: impl Into<String>) -> Self {
        Self {
            index,
            value: value.into(),
        }
    }
}

/// A single audit record, ready for dispatch to the backend.
///
/// `id` is assigned by the backend on persistence and is `None` until then.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Event time, epoch milliseconds.
    pub timestamp: i64,
    pub userid: String,
    pub tenant_id: String,
    pub ip: String,
    pub activity: String,
    pub level: Level,
    pub message: String,
    /// True when `message` is a template paired with positional `args`.
    pub template: bool,
    #[serde(default)]
    pub args: Vec<Arg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl AuditLog {
    /// Create a record for `activity` from a call snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::MissingActivity`] when the activity name is
    /// blank. That is a configuration mistake at the audited call site, not
    /// a runtime condition.
    pub fn new(activity: impl Into<String>, context: &AuditContext) -> Result<Self> {
        let activity = activity.into();
        if activity.trim().is_empty() {
            return Err(AuditError::MissingActivity);
        }

        Ok(Self {
            id: None,
            timestamp: context.timestamp,
            userid: context.user_id.clone(),
            tenant_id: context.tenant_id.clone(),
            ip: context.ip.clone(),
            activity,
            level: Level::Info,
            message: String::new(),
            template: false,
            args: Vec::new(),
            old_value: None,
            new_value: None,
            runas: None,
            device: None,
        })
    }

    /// Append a positional arg, assigning the next index.
    pub fn push_arg(&mut self, value: impl Into<String>) {
        let index = self.args.len() as u32;
        self.args.push(Arg::new(index, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse_known() {
        assert_eq!(Level::parse("info"), Level::Info);
        assert_eq!(Level::parse("warn"), Level::Warn);
        assert_eq!(Level::parse("warning"), Level::Warn);
        assert_eq!(Level::parse("error"), Level::Error);
    }

    #[test]
    fn test_level_parse_fallback() {
        assert_eq!(Level::parse(""), Level::Info);
        assert_eq!(Level::parse("fatal"), Level::Info);
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&Level::Error).unwrap();
        assert_eq!(json, "\"error\"");
    }

    #[test]
    fn test_new_record_rejects_blank_activity() {
        let ctx = AuditContext::anonymous();
        assert!(matches!(
            AuditLog::new("", &ctx),
            Err(AuditError::MissingActivity)
        ));
        assert!(matches!(
            AuditLog::new("   ", &ctx),
            Err(AuditError::MissingActivity)
        ));
    }

    #[test]
    fn test_new_record_copies_snapshot() {
        let ctx = AuditContext::capture("u1", "t9", "10.0.0.1");
        let record = AuditLog::new("login", &ctx).unwrap();
        assert_eq!(record.userid, "u1");
        assert_eq!(record.tenant_id, "t9");
        assert_eq!(record.ip, "10.0.0.1");
        assert_eq!(record.timestamp, ctx.timestamp);
        assert_eq!(record.level, Level::Info);
        assert!(record.id.is_none());
    }

    #[test]
    fn test_push_arg_assigns_indices_in_order() {
        let ctx = AuditContext::anonymous();
        let mut record = AuditLog::new("test", &ctx).unwrap();
        record.push_arg("first");
        record.push_arg("second");
        assert_eq!(record.args[0], Arg::new(0, "first"));
        assert_eq!(record.args[1], Arg::new(1, "second"));
    }

    #[test]
    fn test_optional_fields_skipped_in_json() {
        let ctx = AuditContext::anonymous();
        let record = AuditLog::new("test", &ctx).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("old_value"));
        assert!(!json.contains("new_value"));
        assert!(!json.contains("\"id\""));
    }
}
