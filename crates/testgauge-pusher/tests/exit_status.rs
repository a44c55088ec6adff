//! Exit status of a whole invocation, with a wrapped shell command.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use testgauge_core::error::{Result, TestGaugeError};
use testgauge_pusher::adapters::EventFormat;
use testgauge_pusher::runner::{self, EventSource, ExitCodes, RunOptions};
use testgauge_pusher::transport::{PushRequest, PushTransport};
use testgauge_pusher::LabelHooks;

#[derive(Default)]
struct RecordingTransport {
    bodies: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn push(&self, req: PushRequest<'_>) -> Result<()> {
        self.bodies.lock().unwrap().push(req.body);
        if self.fail {
            return Err(TestGaugeError::PushRejected {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(())
    }
}

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

fn gateway_env() -> impl Fn(&str) -> Option<String> {
    vars(&[
        ("PROMETHEUS_PUSHGATEWAY_URL", "http://gw:9091"),
        ("PROMETHEUS_PUSHGATEWAY_JOB", "job_test"),
    ])
}

fn shell(script: &str, metrics: bool) -> RunOptions {
    RunOptions {
        metrics,
        config_file: None,
        format: EventFormat::Libtest,
        source: EventSource::Command(vec!["sh".into(), "-c".into(), script.into()]),
    }
}

const ONE_FAILURE: &str =
    r#"echo '{"type":"test","name":"t","event":"failed"}'; exit 7"#;

#[tokio::test]
async fn failed_push_keeps_command_exit_code() {
    let transport = Arc::new(RecordingTransport {
        fail: true,
        ..Default::default()
    });
    let shared = transport.clone();

    let code = runner::run(
        shell(ONE_FAILURE, true),
        gateway_env(),
        move |_| Ok(shared),
        LabelHooks::new(),
    )
    .await;

    assert_eq!(code, 7);
    let bodies = transport.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].contains("job_test_failed{testname=\"job_test_t\"} 1.0"));
}

#[tokio::test]
async fn failed_push_after_clean_run_exits_ok() {
    let transport = Arc::new(RecordingTransport {
        fail: true,
        ..Default::default()
    });
    let shared = transport.clone();

    let code = runner::run(
        shell(r#"echo '{"type":"test","name":"t","event":"ok"}'"#, true),
        gateway_env(),
        move |_| Ok(shared),
        LabelHooks::new(),
    )
    .await;

    assert_eq!(code, ExitCodes::OK);
    assert_eq!(transport.bodies.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn auth_without_credentials_rejects_before_running() {
    let marker = std::env::temp_dir().join(format!("testgauge-marker-{}", std::process::id()));
    std::fs::remove_file(&marker).ok();
    let transport_built = AtomicBool::new(false);

    let code = runner::run(
        shell(&format!("touch '{}'", marker.display()), true),
        vars(&[
            ("PROMETHEUS_PUSHGATEWAY_URL", "http://gw:9091"),
            ("PROMETHEUS_PUSHGATEWAY_JOB", "job_test"),
            ("PROMETHEUS_PUSHGATEWAY_BASIC_AUTH", "true"),
            ("PROMETHEUS_PUSHGATEWAY_USERNAME", "ci"),
        ]),
        |_| {
            transport_built.store(true, Ordering::SeqCst);
            Ok(RecordingTransport::default())
        },
        LabelHooks::new(),
    )
    .await;

    assert_eq!(code, ExitCodes::INTERNAL_ERROR);
    assert!(!marker.exists(), "test command must not run");
    assert!(!transport_built.load(Ordering::SeqCst));
}

#[tokio::test]
async fn metrics_off_ignores_config() {
    let code = runner::run(
        shell(ONE_FAILURE, false),
        vars(&[]),
        |_| -> Result<RecordingTransport> { panic!("no transport without --metrics") },
        LabelHooks::new(),
    )
    .await;
    assert_eq!(code, 7);
}
