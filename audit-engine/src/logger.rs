//! Fluent record builder.
//!
//! Programmatic entry point for call sites that want to emit an audit
//! record without going through interception, e.g. batch jobs or places
//! where the before/after values are only known mid-operation.

use std::sync::Arc;

use serde::Serialize;

use crate::context::AuditContext;
use crate::dispatch::Dispatcher;
use crate::entry::{AuditLog, Level};
use crate::error::Result;
use crate::service::AuditService;
use crate::value;

/// Builds one audit record field by field, then hands it to the
/// dispatcher.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use audit_engine::{AuditContext, AuditService, Level, Logger};
///
/// async fn update_profile(service: Arc<dyn AuditService>) -> audit_engine::Result<()> {
///     let ctx = AuditContext::capture("42", "0", "10.1.2.3");
///     Logger::new(service, "update-profile", &ctx)?
///         .level(Level::Info)
///         .message("profile updated")
///         .replace(&"old name", &"new name")
///         .log(false)
///         .await;
///     Ok(())
/// }
/// ```
pub struct Logger {
    dispatcher: Dispatcher,
    record: AuditLog,
}

impl Logger {
    /// Start a record for `activity` from a call snapshot.
    ///
    /// # Errors
    ///
    /// Fails when the activity name is blank.
    pub fn new(
        service: Arc<dyn AuditService>,
        activity: impl Into<String>,
        context: &AuditContext,
    ) -> Result<Self> {
        Ok(Self {
            dispatcher: Dispatcher::new(service),
            record: AuditLog::new(activity, context)?,
        })
    }

    pub fn level(mut self, level: Level) -> Self {
        self.record.level = level;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.record.message = message.into();
        self
    }

    pub fn template(mut self, template: bool) -> Self {
        self.record.template = template;
        self
    }

    /// Append a positional arg; indices follow call order.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.record.push_arg(value);
        self
    }

    /// Record the value before the change. Unserializable values are
    /// skipped with a warning.
    pub fn old_value<T: Serialize>(mut self, value: &T) -> Self {
        self.record.old_value = value::serialize_field(value);
        self
    }

    /// Record the value after the change.
    pub fn new_value<T: Serialize>(mut self, value: &T) -> Self {
        self.record.new_value = value::serialize_field(value);
        self
    }

    /// Record both sides of a replacement.
    pub fn replace<T: Serialize, U: Serialize>(self, old: &T, new: &U) -> Self {
        self.old_value(old).new_value(new)
    }

    pub fn runas(mut self, runas: impl Into<String>) -> Self {
        self.record.runas = Some(runas.into());
        self
    }

    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.record.device = Some(device.into());
        self
    }

    /// The record as built so far.
    pub fn record(&self) -> &AuditLog {
        &self.record
    }

    /// Dispatch the record, synchronously or fire-and-forget.
    pub async fn log(self, asynchronous: bool) {
        self.dispatcher.dispatch(self.record, asynchronous).await;
    }
}
