//! In-memory reference implementation of the audit storage backend.
//!
//! Persists records append-only behind an RwLock, assigns server-side ids,
//! and answers filtered, paginated queries. Rows carry a soft-delete flag;
//! soft-deleted rows are always excluded from query results. Useful as the
//! backend for tests and single-process deployments - a networked store
//! implements the same [`AuditService`] trait.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use audit_engine::{Arg, AuditLog, AuditQuery, AuditService, CommonRes, Level, QueryRes, Result};

/// Persisted form of one audit record.
///
/// Differs from the wire record: the id is mandatory, a blank tenant has
/// been defaulted to "0", args are stored as one serialized JSON list and
/// a soft-delete flag is carried. Rows are never mutated once written
/// (apart from the soft-delete flag).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAuditLog {
    pub id: i64,
    pub tenant_id: String,
    pub user_id: String,
    /// Event time, epoch milliseconds.
    pub log_time: i64,
    pub activity: String,
    pub ip: String,
    pub message: String,
    pub template: bool,
    pub level: Level,
    /// JSON-serialized `Vec<Arg>`, `None` when the record had no args.
    pub args: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub runas: Option<String>,
    pub device: Option<String>,
    pub deleted: bool,
}

impl StoredAuditLog {
    /// Convert back to the wire record shape.
    fn to_record(&self) -> AuditLog {
        let args = match &self.args {
            None => Vec::new(),
            Some(json) => match serde_json::from_str::<Vec<Arg>>(json) {
                Ok(args) => args,
                Err(e) => {
                    warn!(target: "audit", id = self.id, error = %e, "Cannot deserialize args");
                    Vec::new()
                }
            },
        };

        AuditLog {
            id: Some(self.id),
            timestamp: self.log_time,
            userid: self.user_id.clone(),
            tenant_id: self.tenant_id.clone(),
            ip: self.ip.clone(),
            activity: self.activity.clone(),
            level: self.level,
            message: self.message.clone(),
            template: self.template,
            args,
            old_value: self.old_value.clone(),
            new_value: self.new_value.clone(),
            runas: self.runas.clone(),
            device: self.device.clone(),
        }
    }

    fn matches(&self, query: &AuditQuery) -> bool {
        if self.deleted {
            return false;
        }
        if let Some(user_id) = &query.user_id {
            if &self.user_id != user_id {
                return false;
            }
        }
        if let Some(activity) = &query.activity {
            if &self.activity != activity {
                return false;
            }
        }
        if let Some(tenant_id) = &query.tenant_id {
            if &self.tenant_id != tenant_id {
                return false;
            }
        }
        if let Some(start) = query.start_time {
            if self.log_time < start {
                return false;
            }
        }
        if let Some(end) = query.end_time {
            if self.log_time >= end {
                return false;
            }
        }
        true
    }
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: Vec<StoredAuditLog>,
}

/// Append-only in-memory audit store.
#[derive(Default)]
pub struct MemoryAuditStore {
    inner: RwLock<Inner>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows, soft-deleted included.
    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().rows.is_empty()
    }

    /// Mark a row soft-deleted; returns false when the id is unknown.
    pub fn soft_delete(&self, id: i64) -> bool {
        let mut inner = self.inner.write();
        match inner.rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.deleted = true;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl AuditService for MemoryAuditStore {
    async fn log(&self, record: AuditLog) -> Result<CommonRes> {
        let args = if record.args.is_empty() {
            None
        } else {
            match serde_json::to_string(&record.args) {
                Ok(json) => Some(json),
                Err(e) => {
                    warn!(target: "audit", error = %e, "Cannot serialize args");
                    None
                }
            }
        };

        let tenant_id = if record.tenant_id.trim().is_empty() {
            "0".to_string()
        } else {
            record.tenant_id
        };

        let mut inner = self.inner.write();
        inner.next_id += 1;
        let row = StoredAuditLog {
            id: inner.next_id,
            tenant_id,
            user_id: record.userid,
            log_time: record.timestamp,
            activity: record.activity,
            ip: record.ip,
            message: record.message,
            template: record.template,
            level: record.level,
            args,
            old_value: record.old_value,
            new_value: record.new_value,
            runas: record.runas,
            device: record.device,
            deleted: false,
        };
        inner.rows.push(row);

        Ok(CommonRes::ok())
    }

    async fn logs(&self, query: AuditQuery) -> Result<QueryRes> {
        let inner = self.inner.read();
        let matched: Vec<&StoredAuditLog> =
            inner.rows.iter().filter(|row| row.matches(&query)).collect();

        let total = matched.len() as i64;
        let logs = matched
            .iter()
            .skip(query.pager.offset())
            .take(query.pager.page_size() as usize)
            .map(|row| row.to_record())
            .collect();

        Ok(QueryRes {
            err_code: 0,
            logs,
            pager: query.pager.with_totals(total),
        })
    }
}
