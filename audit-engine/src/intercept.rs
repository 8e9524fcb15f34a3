//! Interception point.
//!
//! The original system attached audit configuration to methods through
//! annotations and wove the interceptor in at runtime. Here the wrap is
//! explicit: call sites hand [`Auditor::audit`] the configuration, the
//! captured context, their named parameters and the operation itself; the
//! operation runs exactly once and its own outcome is returned unchanged.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::context::AuditContext;
use crate::dispatch::Dispatcher;
use crate::entry::{AuditLog, Level};
use crate::error::Result;
use crate::expr;
use crate::scope::{self, ScopeBuilder};
use crate::service::AuditService;

/// Per-operation audit configuration.
///
/// `activity` is required and must be non-empty; everything else is
/// optional. A non-empty `message` takes priority over `template`.
#[derive(Debug, Clone, Default)]
pub struct AuditConfig {
    pub activity: String,
    pub level: Level,
    /// Direct message; `#{...}` evaluates against the call scope.
    pub message: String,
    /// Template text paired with positional `args`.
    pub template: String,
    /// Arg values; `#path` entries are expressions, the rest literals.
    pub args: Vec<String>,
    /// Message override when the operation raises.
    pub error_message: String,
    /// Template override when the operation raises.
    pub error_template: String,
    pub async_dispatch: bool,
}

impl AuditConfig {
    pub fn new(activity: impl Into<String>) -> Self {
        Self {
            activity: activity.into(),
            ..Self::default()
        }
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    pub fn error_template(mut self, template: impl Into<String>) -> Self {
        self.error_template = template.into();
        self
    }

    pub fn asynchronous(mut self, asynchronous: bool) -> Self {
        self.async_dispatch = asynchronous;
        self
    }
}

/// Wraps audited operations and feeds the pipeline.
#[derive(Clone)]
pub struct Auditor {
    dispatcher: Dispatcher,
}

impl Auditor {
    pub fn new(service: Arc<dyn AuditService>) -> Self {
        Self {
            dispatcher: Dispatcher::new(service),
        }
    }

    /// Run `operation` once under audit.
    ///
    /// `params` carries the operation's named parameters; the outcome is
    /// bound as `returnObj` on success or `error`/`errorMsg` on failure,
    /// with `threw` set either way. Dispatch failures never reach the
    /// caller - the inner result is always the operation's own.
    ///
    /// # Errors
    ///
    /// The outer `Err` is only [`crate::AuditError::MissingActivity`],
    /// raised before the operation runs.
    pub async fn audit<F, Fut, T, E>(
        &self,
        config: &AuditConfig,
        context: AuditContext,
        params: ScopeBuilder,
        operation: F,
    ) -> Result<std::result::Result<T, E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        T: Serialize,
        E: Display,
    {
        // Configuration is validated before the operation runs.
        let mut record = AuditLog::new(config.activity.clone(), &context)?;
        record.level = config.level;

        let outcome = operation().await;
        let threw = outcome.is_err();

        let params = params.bind_value(scope::THREW_VAR, Value::Bool(threw));
        let (scope, error_text) = match &outcome {
            Ok(value) => (params.bind(scope::RETURN_VAR, value).build(), None),
            Err(e) => {
                let text = e.to_string();
                let scope = params
                    .bind_value(scope::ERROR_VAR, Value::String(text.clone()))
                    .bind_value(scope::ERROR_MSG_VAR, Value::String(text.clone()))
                    .build();
                (scope, Some(text))
            }
        };

        match error_text {
            None => {
                expr::render_into(
                    &mut record,
                    &scope,
                    &config.message,
                    &config.template,
                    &config.args,
                );
            }
            Some(error_text) => {
                record.level = Level::Error;
                if !config.error_message.trim().is_empty() {
                    expr::render_into(&mut record, &scope, &config.error_message, "", &[]);
                } else if !config.error_template.trim().is_empty() {
                    expr::render_into(
                        &mut record,
                        &scope,
                        "",
                        &config.error_template,
                        &config.args,
                    );
                } else {
                    record.message = error_text;
                }
            }
        }

        self.dispatcher
            .dispatch(record, config.async_dispatch)
            .await;

        Ok(outcome)
    }
}
