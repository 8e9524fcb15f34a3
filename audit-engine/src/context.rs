//! Per-call ambient snapshot.
//!
//! Ambient data (current user, tenant, remote address) is typically scoped
//! to the originating call and is not guaranteed to be accessible once
//! control returns to the caller. It is therefore captured into this plain
//! value at interception time and carried explicitly into the dispatch
//! task, never looked up implicitly later.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Immutable snapshot of the caller's ambient context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditContext {
    /// Acting user id; "0" when unauthenticated.
    pub user_id: String,
    /// Tenant id; "0" for the default tenant.
    pub tenant_id: String,
    /// Remote address of the originating request, empty when unknown.
    pub ip: String,
    /// Capture time, epoch milliseconds.
    pub timestamp: i64,
}

impl AuditContext {
    /// Capture a snapshot now for the given caller identity.
    pub fn capture(
        user_id: impl Into<String>,
        tenant_id: impl Into<String>,
        ip: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            ip: ip.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Snapshot for a call with no resolved identity.
    ///
    /// Uses the same "0" defaults the backend applies to blank fields.
    pub fn anonymous() -> Self {
        Self::capture("0", "0", "")
    }
}

impl Default for AuditContext {
    fn default() -> Self {
        Self::anonymous()
    }
}
