#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use testgauge_core::error::ErrorCode;
use testgauge_pusher::config;

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

#[test]
fn minimal_env() {
    let cfg = config::load_with(
        None,
        vars(&[
            ("PROMETHEUS_PUSHGATEWAY_URL", "http://gw:9091"),
            ("PROMETHEUS_PUSHGATEWAY_JOB", "job_test"),
        ]),
    )
    .expect("must load");
    assert_eq!(cfg.gateway_url, "http://gw:9091");
    assert_eq!(cfg.job, "job_test");
    assert!(cfg.metric_prefix.is_none());
    assert!(cfg.extra_labels.is_none());
    assert!(cfg.basic_auth.is_none());
    assert_eq!(cfg.timeout, Duration::from_secs(30));
}

#[test]
fn missing_url_or_job_is_fatal() {
    let err = config::load_with(None, vars(&[("PROMETHEUS_PUSHGATEWAY_JOB", "j")]))
        .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::Config);
    assert!(err.to_string().contains("PROMETHEUS_PUSHGATEWAY_URL"));

    let err = config::load_with(
        None,
        vars(&[
            ("PROMETHEUS_PUSHGATEWAY_URL", "http://gw"),
            ("PROMETHEUS_PUSHGATEWAY_JOB", ""),
        ]),
    )
    .expect_err("empty job must fail");
    assert!(err.to_string().contains("PROMETHEUS_PUSHGATEWAY_JOB"));
}

#[test]
fn auth_without_credentials_is_fatal() {
    for missing in ["PROMETHEUS_PUSHGATEWAY_USERNAME", "PROMETHEUS_PUSHGATEWAY_PASSWORD"] {
        let mut pairs = vec![
            ("PROMETHEUS_PUSHGATEWAY_URL", "http://gw"),
            ("PROMETHEUS_PUSHGATEWAY_JOB", "j"),
            ("PROMETHEUS_PUSHGATEWAY_BASIC_AUTH", "True"),
            ("PROMETHEUS_PUSHGATEWAY_USERNAME", "ci"),
            ("PROMETHEUS_PUSHGATEWAY_PASSWORD", "secret"),
        ];
        pairs.retain(|(k, _)| *k != missing);
        let err = config::load_with(None, vars(&pairs)).expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::Config, "missing={missing}");
    }
}

#[test]
fn auth_toggle_off_ignores_credentials() {
    let cfg = config::load_with(
        None,
        vars(&[
            ("PROMETHEUS_PUSHGATEWAY_URL", "http://gw"),
            ("PROMETHEUS_PUSHGATEWAY_JOB", "j"),
            ("PROMETHEUS_PUSHGATEWAY_BASIC_AUTH", "false"),
        ]),
    )
    .expect("must load");
    assert!(cfg.basic_auth.is_none());

    let cfg = config::load_with(
        None,
        vars(&[
            ("PROMETHEUS_PUSHGATEWAY_URL", "http://gw"),
            ("PROMETHEUS_PUSHGATEWAY_JOB", "j"),
            ("PROMETHEUS_PUSHGATEWAY_BASIC_AUTH", "true"),
            ("PROMETHEUS_PUSHGATEWAY_USERNAME", "ci"),
            ("PROMETHEUS_PUSHGATEWAY_PASSWORD", "secret"),
        ]),
    )
    .expect("must load");
    let auth = cfg.basic_auth.expect("auth enabled");
    assert_eq!(auth.username, "ci");
    assert_eq!(auth.password, "secret");
}

#[test]
fn bad_timeout_is_fatal() {
    let err = config::load_with(
        None,
        vars(&[
            ("PROMETHEUS_PUSHGATEWAY_URL", "http://gw"),
            ("PROMETHEUS_PUSHGATEWAY_JOB", "j"),
            ("PROMETHEUS_PUSHGATEWAY_TIMEOUT_SECS", "soon"),
        ]),
    )
    .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::Config);
}

#[test]
fn unusable_url_is_fatal() {
    let err = config::load_with(
        None,
        vars(&[
            ("PROMETHEUS_PUSHGATEWAY_URL", "http://"),
            ("PROMETHEUS_PUSHGATEWAY_JOB", "j"),
        ]),
    )
    .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::Config);
}

#[test]
fn yaml_deny_unknown_fields() {
    let bad = r#"
url: "http://gw:9091"
jobb: "typo"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn yaml_file_overridden_by_env() {
    let mut file = std::env::temp_dir();
    file.push(format!("testgauge-config-{}.yaml", std::process::id()));
    {
        let mut f = std::fs::File::create(&file).unwrap();
        writeln!(
            f,
            r#"
url: "http://file-gw:9091"
job: "from_file"
extra_labels:
  team: payments
timeout_secs: 5
"#
        )
        .unwrap();
    }

    let cfg = config::load_with(
        Some(file.as_path()),
        vars(&[("PROMETHEUS_PUSHGATEWAY_JOB", "from_env")]),
    )
    .expect("must load");
    std::fs::remove_file(&file).ok();

    assert_eq!(cfg.gateway_url, "http://file-gw:9091");
    assert_eq!(cfg.job, "from_env");
    assert_eq!(cfg.timeout, Duration::from_secs(5));
    assert_eq!(cfg.extra_labels.as_deref(), Some(r#"{"team":"payments"}"#));
}

#[test]
fn yaml_extra_labels_with_scalars_and_nesting_never_abort() {
    let scalars = config::load_from_str(
        "url: http://gw\njob: j\nextra_labels:\n  shard: 3\n  nightly: true\n",
    )
    .expect("scalar values must load")
    .into_config()
    .expect("must validate");
    let encoded = scalars.extra_labels.expect("labels kept");
    let parsed = testgauge_core::labels::parse_extra_labels(&encoded);
    assert_eq!(parsed["shard"], "3");
    assert_eq!(parsed["nightly"], "true");

    let nested = config::load_from_str(
        "url: http://gw\njob: j\nextra_labels:\n  x: null\n  deep:\n    a: b\n",
    )
    .expect("nested values must load")
    .into_config()
    .expect("must validate");
    let encoded = nested.extra_labels.expect("still encoded");
    assert!(testgauge_core::labels::parse_extra_labels(&encoded).is_empty());

    let encoded_form = config::load_from_str("url: http://gw\njob: j\nextra_labels: \"{'a':'b'}\"\n")
        .expect("string form must load")
        .into_config()
        .expect("must validate");
    assert_eq!(encoded_form.extra_labels.as_deref(), Some("{'a':'b'}"));
}
