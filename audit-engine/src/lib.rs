//! Application-level audit logging pipeline
//!
//! This crate intercepts annotated operations, renders a human-readable
//! audit message from the call context and hands the resulting record to a
//! storage backend, best effort:
//! - Interception that never alters the wrapped call's outcome
//! - A sandboxed expression/template evaluator over call-scoped variables
//! - Canonical record assembly with before/after value capture
//! - Synchronous or fire-and-forget asynchronous dispatch
//! - Degrade-not-drop failure policy: every pipeline failure becomes a
//!   warning on the `audit` diagnostics target, never an error for the
//!   audited caller
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use audit_engine::{AuditConfig, AuditContext, Auditor, ExpressionScope};
//!
//! # async fn demo(service: Arc<dyn audit_engine::AuditService>) -> audit_engine::Result<()> {
//! let auditor = Auditor::new(service);
//!
//! let config = AuditConfig::new("test")
//!     .message("#{you are get then id is: {id}, then result is:{returnObj}}")
//!     .asynchronous(true);
//!
//! let id = "123".to_string();
//! let outcome = auditor
//!     .audit(
//!         &config,
//!         AuditContext::capture("42", "0", "10.0.0.1"),
//!         ExpressionScope::builder().bind("id", &id),
//!         || async { Ok::<_, String>(format!("hello ya:{}", id)) },
//!     )
//!     .await?;
//!
//! // the operation's own outcome, unchanged
//! let greeting = outcome.unwrap();
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod expr;
pub mod intercept;
pub mod logger;
pub mod scope;
pub mod service;
pub mod value;

pub use context::AuditContext;
pub use dispatch::Dispatcher;
pub use entry::{Arg, AuditLog, Level};
pub use error::{AuditError, Result};
pub use intercept::{AuditConfig, Auditor};
pub use logger::Logger;
pub use scope::{ExpressionScope, ScopeBuilder};
pub use service::{AuditQuery, AuditService, CommonRes, Pager, QueryRes};
