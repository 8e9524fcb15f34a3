//! Storage collaborator interface.
//!
//! The backend that persists audit records is an external service behind
//! this trait; the pipeline only needs `log` for dispatch. `logs` is the
//! query side used by audit viewers (access control for it lives with the
//! caller, not here).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entry::AuditLog;
use crate::error::Result;

/// Outcome of an append. A normal persistence failure is reported through
/// `err_code`/`err_msg`, not as an `Err`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommonRes {
    pub err_code: i32,
    #[serde(default)]
    pub err_msg: String,
}

impl CommonRes {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failure(err_code: i32, err_msg: impl Into<String>) -> Self {
        Self {
            err_code,
            err_msg: err_msg.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.err_code == 0 && self.err_msg.is_empty()
    }
}

/// Pagination request and response carrier.
///
/// Requests fill `page`/`page_size`; responses echo them back with
/// `total_count`/`total_pages` filled in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pager {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub total_count: Option<i64>,
    pub total_pages: Option<u32>,
}

impl Pager {
    /// Get the page number (defaults to 1, minimum 1)
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the page size (defaults to 20, clamped between 1 and 100)
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(20).clamp(1, 100)
    }

    /// Offset of the first record on this page.
    pub fn offset(&self) -> usize {
        ((self.page() - 1) * self.page_size()) as usize
    }

    /// Calculate total pages given a total count
    pub fn total_pages(&self, total_count: i64) -> u32 {
        if total_count == 0 {
            return 1;
        }
        ((total_count as f64) / (self.page_size() as f64)).ceil() as u32
    }

    /// Response pager for this request with totals filled in.
    pub fn with_totals(&self, total_count: i64) -> Self {
        Self {
            page: Some(self.page()),
            page_size: Some(self.page_size()),
            total_count: Some(total_count),
            total_pages: Some(self.total_pages(total_count)),
        }
    }
}

/// Query predicates, all optional, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub user_id: Option<String>,
    pub activity: Option<String>,
    pub tenant_id: Option<String>,
    /// Inclusive lower bound on record timestamp, epoch milliseconds.
    pub start_time: Option<i64>,
    /// Exclusive upper bound on record timestamp, epoch milliseconds.
    pub end_time: Option<i64>,
    pub pager: Pager,
}

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct QueryRes {
    pub err_code: i32,
    pub logs: Vec<AuditLog>,
    pub pager: Pager,
}

/// Audit storage backend.
#[async_trait]
pub trait AuditService: Send + Sync {
    /// Append one record; the backend assigns its id.
    ///
    /// # Errors
    ///
    /// `Err` is reserved for transport-level failures; a backend that
    /// merely declines the record answers `Ok` with a non-zero code.
    async fn log(&self, record: AuditLog) -> Result<CommonRes>;

    /// Query persisted records, soft-deleted rows always excluded.
    async fn logs(&self, query: AuditQuery) -> Result<QueryRes>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pager_defaults() {
        let pager = Pager::default();
        assert_eq!(pager.page(), 1);
        assert_eq!(pager.page_size(), 20);
        assert_eq!(pager.offset(), 0);
    }

    #[test]
    fn test_pager_offset() {
        let pager = Pager {
            page: Some(3),
            page_size: Some(10),
            ..Pager::default()
        };
        assert_eq!(pager.offset(), 20);
    }

    #[test]
    fn test_pager_clamps() {
        let pager = Pager {
            page: Some(0),
            page_size: Some(200),
            ..Pager::default()
        };
        assert_eq!(pager.page(), 1);
        assert_eq!(pager.page_size(), 100);

        let pager = Pager {
            page_size: Some(0),
            ..Pager::default()
        };
        assert_eq!(pager.page_size(), 1);
    }

    #[test]
    fn test_pager_total_pages() {
        let pager = Pager::default();
        assert_eq!(pager.total_pages(0), 1);
        assert_eq!(pager.total_pages(20), 1);
        assert_eq!(pager.total_pages(21), 2);
        assert_eq!(pager.total_pages(100), 5);
    }

    #[test]
    fn test_pager_with_totals() {
        let pager = Pager {
            page: Some(2),
            page_size: Some(10),
            ..Pager::default()
        };
        let res = pager.with_totals(25);
        assert_eq!(res.page, Some(2));
        assert_eq!(res.page_size, Some(10));
        assert_eq!(res.total_count, Some(25));
        assert_eq!(res.total_pages, Some(3));
    }

    #[test]
    fn test_common_res() {
        assert!(CommonRes::ok().is_ok());
        let failed = CommonRes::failure(503, "Cannot save audit log");
        assert!(!failed.is_ok());
        assert_eq!(failed.err_code, 503);
    }
}
