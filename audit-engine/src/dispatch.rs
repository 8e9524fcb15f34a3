//! Best-effort record delivery.
//!
//! Delivery is fire-and-forget: any failure - backend rejection, transport
//! error, serialization error - is degraded to a warning on the `audit`
//! diagnostics target and never surfaced to the audited call. Asynchronous
//! dispatch gives no ordering guarantee between concurrent calls.

use std::sync::Arc;

use tracing::{info, warn};

use crate::entry::AuditLog;
use crate::service::AuditService;

/// Delivers built records to the backend, synchronously or on a spawned
/// task.
#[derive(Clone)]
pub struct Dispatcher {
    service: Arc<dyn AuditService>,
}

impl Dispatcher {
    pub fn new(service: Arc<dyn AuditService>) -> Self {
        Self { service }
    }

    /// Deliver one record.
    ///
    /// Synchronous mode awaits the delivery attempt; asynchronous mode
    /// schedules it on a separate task and returns immediately, so the
    /// caller never observes the outcome.
    pub async fn dispatch(&self, record: AuditLog, asynchronous: bool) {
        if asynchronous {
            let service = Arc::clone(&self.service);
            tokio::spawn(async move {
                deliver(service, record).await;
            });
        } else {
            deliver(Arc::clone(&self.service), record).await;
        }
    }
}

async fn deliver(service: Arc<dyn AuditService>, record: AuditLog) {
    let payload = match serde_json::to_string(&record) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(
                target: "audit",
                activity = %record.activity,
                error = %e,
                "Cannot serialize audit log"
            );
            return;
        }
    };

    match service.log(record).await {
        Ok(res) if res.is_ok() => {
            info!(target: "audit", record = %payload, "Audit event");
        }
        Ok(res) => {
            warn!(
                target: "audit",
                code = res.err_code,
                error = %res.err_msg,
                record = %payload,
                "Cannot save audit log"
            );
        }
        Err(e) => {
            warn!(target: "audit", error = %e, record = %payload, "Cannot send audit log");
        }
    }
}
