//! End-to-end pipeline tests against a recording backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use audit_engine::{
    AuditConfig, AuditContext, AuditLog, AuditQuery, AuditService, Auditor, CommonRes,
    ExpressionScope, Level, QueryRes, Result,
};

fn init_diagnostics() {
    // capture the audit diagnostics target in test output; ignore the
    // error when another test already installed a subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter("audit=debug")
        .with_test_writer()
        .try_init();
}

/// Backend fake capturing delivered records; can simulate rejection or a
/// dead transport.
struct RecordingService {
    records: Mutex<Vec<AuditLog>>,
    answer: CommonRes,
    transport_error: bool,
}

impl RecordingService {
    fn accepting() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            answer: CommonRes::ok(),
            transport_error: false,
        })
    }

    fn rejecting(msg: &str) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            answer: CommonRes::failure(503, msg),
            transport_error: false,
        })
    }

    fn unreachable_backend() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            answer: CommonRes::ok(),
            transport_error: true,
        })
    }

    fn delivered(&self) -> Vec<AuditLog> {
        self.records.lock().unwrap().clone()
    }

    async fn wait_for_delivery(&self) -> AuditLog {
        for _ in 0..100 {
            if let Some(record) = self.delivered().into_iter().next() {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no record delivered within bounded wait");
    }
}

#[async_trait]
impl AuditService for RecordingService {
    async fn log(&self, record: AuditLog) -> Result<CommonRes> {
        if self.transport_error {
            return Err(anyhow::anyhow!("backend unreachable").into());
        }
        self.records.lock().unwrap().push(record);
        Ok(self.answer.clone())
    }

    async fn logs(&self, _query: AuditQuery) -> Result<QueryRes> {
        Ok(QueryRes::default())
    }
}

#[derive(Debug, Serialize)]
struct DemoRes {
    err_code: i32,
    err_msg: String,
}

#[tokio::test]
async fn message_renders_from_params_and_return_value() {
    init_diagnostics();
    let service = RecordingService::accepting();
    let auditor = Auditor::new(service.clone());

    let config = AuditConfig::new("test")
        .message("#{you are get then id is: {id}, then result is:{returnObj}}")
        .asynchronous(true);

    let id = "123".to_string();
    let outcome = auditor
        .audit(
            &config,
            AuditContext::anonymous(),
            ExpressionScope::builder().bind("id", &id),
            || async { Ok::<_, String>(format!("hello ya:{}", id)) },
        )
        .await
        .unwrap();

    assert_eq!(outcome.unwrap(), "hello ya:123");

    let record = service.wait_for_delivery().await;
    assert_eq!(
        record.message,
        "you are get then id is: 123, then result is:hello ya:123"
    );
    assert!(!record.template);
}

#[tokio::test]
async fn template_args_follow_declaration_order() {
    init_diagnostics();
    let service = RecordingService::accepting();
    let auditor = Auditor::new(service.clone());

    let config = AuditConfig::new("test")
        .template("error message is {}, arg is {}")
        .arg("#returnObj.err_msg")
        .arg("hi");

    let outcome = auditor
        .audit(
            &config,
            AuditContext::anonymous(),
            ExpressionScope::builder(),
            || async {
                Ok::<_, String>(DemoRes {
                    err_code: 1,
                    err_msg: "error hi".to_string(),
                })
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.unwrap().err_msg, "error hi");

    let record = service.wait_for_delivery().await;
    assert!(record.template);
    assert_eq!(record.message, "error message is {}, arg is {}");
    assert_eq!(record.args.len(), 2);
    assert_eq!(record.args[0].index, 0);
    assert_eq!(record.args[0].value, "error hi");
    assert_eq!(record.args[1].index, 1);
    assert_eq!(record.args[1].value, "hi");
}

#[tokio::test]
async fn thrown_error_message_and_forced_level() {
    init_diagnostics();
    let service = RecordingService::accepting();
    let auditor = Auditor::new(service.clone());

    // no error overrides configured: the error's own text becomes the message
    let config = AuditConfig::new("test").message("#{returnObj}");

    let outcome = auditor
        .audit(
            &config,
            AuditContext::anonymous(),
            ExpressionScope::builder(),
            || async { Err::<String, _>("permission denied".to_string()) },
        )
        .await
        .unwrap();
    assert_eq!(outcome.unwrap_err(), "permission denied");

    let record = service.wait_for_delivery().await;
    assert_eq!(record.level, Level::Error);
    assert_eq!(record.message, "permission denied");
}

#[tokio::test]
async fn failed_arg_falls_back_without_spoiling_others() {
    init_diagnostics();
    let service = RecordingService::accepting();
    let auditor = Auditor::new(service.clone());

    let config = AuditConfig::new("test")
        .template("{} / {}")
        .arg("#nonexistent.path")
        .arg("#id");

    auditor
        .audit(
            &config,
            AuditContext::anonymous(),
            ExpressionScope::builder().bind("id", &"123"),
            || async { Ok::<_, String>(()) },
        )
        .await
        .unwrap()
        .unwrap();

    let record = service.wait_for_delivery().await;
    assert_eq!(record.args[0].value, "#nonexistent.path");
    assert_eq!(record.args[1].value, "123");
}

#[tokio::test]
async fn async_dispatch_returns_before_acknowledgment() {
    init_diagnostics();
    let service = RecordingService::accepting();
    let auditor = Auditor::new(service.clone());

    let config = AuditConfig::new("login")
        .message("#{userName} logged in")
        .asynchronous(true);

    let outcome = auditor
        .audit(
            &config,
            AuditContext::capture("7", "t1", "10.0.0.9"),
            ExpressionScope::builder().bind("userName", &"amy"),
            || async { Ok::<_, String>("ok") },
        )
        .await
        .unwrap();
    // caller already has its result; delivery may still be in flight
    assert_eq!(outcome.unwrap(), "ok");

    let record = service.wait_for_delivery().await;
    assert_eq!(record.userid, "7");
    assert_eq!(record.tenant_id, "t1");
    assert_eq!(record.ip, "10.0.0.9");
    assert_eq!(record.activity, "login");
}

#[tokio::test]
async fn backend_rejection_never_escapes_dispatch() {
    init_diagnostics();
    let service = RecordingService::rejecting("Cannot save audit log");
    let auditor = Auditor::new(service.clone());

    let outcome = auditor
        .audit(
            &AuditConfig::new("test").message("hello"),
            AuditContext::anonymous(),
            ExpressionScope::builder(),
            || async { Ok::<_, String>(42) },
        )
        .await
        .unwrap();

    assert_eq!(outcome.unwrap(), 42);
    // the rejected record still reached the backend attempt
    assert_eq!(service.delivered().len(), 1);
}

#[tokio::test]
async fn transport_error_never_escapes_dispatch() {
    init_diagnostics();
    let service = RecordingService::unreachable_backend();
    let auditor = Auditor::new(service.clone());

    let outcome = auditor
        .audit(
            &AuditConfig::new("test").message("hello"),
            AuditContext::anonymous(),
            ExpressionScope::builder(),
            || async { Ok::<_, String>("fine") },
        )
        .await
        .unwrap();

    assert_eq!(outcome.unwrap(), "fine");
    assert!(service.delivered().is_empty());
}

#[tokio::test]
async fn sync_and_async_paths_build_identical_records() {
    init_diagnostics();
    let sync_service = RecordingService::accepting();
    let async_service = RecordingService::accepting();

    let base = AuditConfig::new("test")
        .template("id was {}")
        .arg("#id");

    for (service, asynchronous) in [(&sync_service, false), (&async_service, true)] {
        let auditor = Auditor::new(service.clone());
        let config = base.clone().asynchronous(asynchronous);
        auditor
            .audit(
                &config,
                AuditContext::capture("u", "t", "ip"),
                ExpressionScope::builder().bind("id", &"9"),
                || async { Ok::<_, String>(()) },
            )
            .await
            .unwrap()
            .unwrap();
    }

    let sync_record = sync_service.wait_for_delivery().await;
    let async_record = async_service.wait_for_delivery().await;
    assert_eq!(sync_record.message, async_record.message);
    assert_eq!(sync_record.args, async_record.args);
    assert_eq!(sync_record.userid, async_record.userid);
    assert_eq!(sync_record.level, async_record.level);
}
